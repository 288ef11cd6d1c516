//! CashAddr encoding and decoding.
//!
//! Addresses are the only identity input the library accepts; everything
//! downstream works on the decoded hash payload. Supports 20-byte P2PKH
//! payloads (owner and rescuer identities) and 32-byte P2SH payloads
//! (vault covenant addresses).

use crate::{FortressError, Result};

/// Base32 alphabet shared with bech32.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Script kind carried in the address version byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    /// Pay to public key hash (20-byte payload).
    P2pkh,
    /// Pay to script hash (20- or 32-byte payload).
    P2sh,
}

/// A successfully decoded address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedAddress {
    /// Network prefix, e.g. "bitcoincash" or "bchtest".
    pub prefix: String,
    /// Script kind from the version byte.
    pub kind: AddressKind,
    /// Raw hash payload (20 or 32 bytes).
    pub payload: Vec<u8>,
}

impl DecodedAddress {
    /// The payload as a 20-byte public key hash.
    ///
    /// Fails for P2SH addresses and non-standard payload sizes, which can
    /// never identify an owner or rescuer key.
    pub fn pkh(&self) -> Result<[u8; 20]> {
        if self.kind != AddressKind::P2pkh || self.payload.len() != 20 {
            return Err(FortressError::validation(
                "address",
                "expected a key-hash address with a 20-byte payload",
            ));
        }
        let mut pkh = [0u8; 20];
        pkh.copy_from_slice(&self.payload);
        Ok(pkh)
    }
}

/// 40-bit BCH checksum over 5-bit symbols.
fn polymod(values: &[u8]) -> u64 {
    let mut c: u64 = 1;
    for &d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x0007_ffff_ffff) << 5) ^ u64::from(d);
        if c0 & 0x01 != 0 {
            c ^= 0x98_f2bc_8e61;
        }
        if c0 & 0x02 != 0 {
            c ^= 0x79_b76d_99e2;
        }
        if c0 & 0x04 != 0 {
            c ^= 0xf3_3e5f_b3c4;
        }
        if c0 & 0x08 != 0 {
            c ^= 0xae_2eab_e2a8;
        }
        if c0 & 0x10 != 0 {
            c ^= 0x1e_4f43_e470;
        }
    }
    c ^ 1
}

/// Prefix as its low 5 bits per character, followed by a zero separator.
fn expand_prefix(prefix: &str) -> Vec<u8> {
    let mut out: Vec<u8> = prefix.bytes().map(|b| b & 0x1f).collect();
    out.push(0);
    out
}

/// Regroup a bit stream between symbol widths.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    let max = (1u32 << to) - 1;
    for &value in data {
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max) as u8);
        }
    } else if bits >= from || (acc << (to - bits)) & max != 0 {
        return Err(FortressError::validation("address", "invalid padding"));
    }
    Ok(out)
}

fn version_byte(kind: AddressKind, payload_len: usize) -> Result<u8> {
    let size_bits = match payload_len {
        20 => 0u8,
        24 => 1,
        28 => 2,
        32 => 3,
        40 => 4,
        48 => 5,
        56 => 6,
        64 => 7,
        n => {
            return Err(FortressError::validation(
                "address",
                format!("unsupported payload length {}", n),
            ))
        }
    };
    let kind_bits = match kind {
        AddressKind::P2pkh => 0u8,
        AddressKind::P2sh => 1,
    };
    Ok((kind_bits << 3) | size_bits)
}

/// Encode a hash payload as a CashAddr string with the given prefix.
pub fn encode(prefix: &str, kind: AddressKind, payload: &[u8]) -> Result<String> {
    let version = version_byte(kind, payload.len())?;
    let mut bytes = Vec::with_capacity(payload.len() + 1);
    bytes.push(version);
    bytes.extend_from_slice(payload);
    let mut data = convert_bits(&bytes, 8, 5, true)?;

    let mut checksum_input = expand_prefix(prefix);
    checksum_input.extend_from_slice(&data);
    checksum_input.extend_from_slice(&[0u8; 8]);
    let checksum = polymod(&checksum_input);
    for i in 0..8 {
        data.push(((checksum >> (5 * (7 - i))) & 0x1f) as u8);
    }

    let mut out = String::with_capacity(prefix.len() + 1 + data.len());
    out.push_str(prefix);
    out.push(':');
    for d in data {
        out.push(CHARSET[d as usize] as char);
    }
    Ok(out)
}

/// Decode a CashAddr string.
///
/// The network prefix must be present ("bchtest:..."). Mixed-case input,
/// checksum failures and malformed payloads all yield a validation error.
pub fn decode(address: &str) -> Result<DecodedAddress> {
    let address = address.trim();
    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(FortressError::validation("address", "mixed-case address"));
    }
    let address = address.to_ascii_lowercase();

    let (prefix, body) = address
        .split_once(':')
        .ok_or_else(|| FortressError::validation("address", "missing network prefix"))?;
    if prefix.is_empty() || body.len() < 8 {
        return Err(FortressError::validation("address", "truncated address"));
    }

    let mut data = Vec::with_capacity(body.len());
    for ch in body.bytes() {
        let value = CHARSET
            .iter()
            .position(|&c| c == ch)
            .ok_or_else(|| {
                FortressError::validation("address", format!("invalid character '{}'", ch as char))
            })?;
        data.push(value as u8);
    }

    let mut checksum_input = expand_prefix(prefix);
    checksum_input.extend_from_slice(&data);
    if polymod(&checksum_input) != 0 {
        return Err(FortressError::validation("address", "checksum mismatch"));
    }

    let bytes = convert_bits(&data[..data.len() - 8], 5, 8, false)?;
    let (&version, payload) = bytes
        .split_first()
        .ok_or_else(|| FortressError::validation("address", "empty payload"))?;
    let kind = match (version >> 3) & 0x0f {
        0 => AddressKind::P2pkh,
        1 => AddressKind::P2sh,
        t => {
            return Err(FortressError::validation(
                "address",
                format!("unknown address type {}", t),
            ))
        }
    };
    let expected_len = match version & 0x07 {
        0 => 20,
        1 => 24,
        2 => 28,
        3 => 32,
        4 => 40,
        5 => 48,
        6 => 56,
        _ => 64,
    };
    if payload.len() != expected_len {
        return Err(FortressError::validation(
            "address",
            format!(
                "payload length {} does not match version byte ({})",
                payload.len(),
                expected_len
            ),
        ));
    }

    Ok(DecodedAddress {
        prefix: prefix.to_string(),
        kind,
        payload: payload.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hash from the published CashAddr test vectors.
    const VECTOR_PKH: [u8; 20] = [
        0xf5, 0xbf, 0x48, 0xb3, 0x97, 0xda, 0xe7, 0x0b, 0xe8, 0x2b, 0x3c, 0xca, 0x47, 0x93, 0xf8,
        0xeb, 0x2b, 0x6c, 0xda, 0xc9,
    ];

    #[test]
    fn encodes_spec_vector() {
        let addr = encode("bitcoincash", AddressKind::P2pkh, &VECTOR_PKH).unwrap();
        assert_eq!(addr, "bitcoincash:qr6m7j9njldwwzlg9v7v53unlr4jkmx6eylep8ekg2");
        let testnet = encode("bchtest", AddressKind::P2pkh, &VECTOR_PKH).unwrap();
        assert_eq!(testnet, "bchtest:qr6m7j9njldwwzlg9v7v53unlr4jkmx6eymt9qmp0k");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let addr = encode("bchtest", AddressKind::P2pkh, &VECTOR_PKH).unwrap();
        let decoded = decode(&addr).unwrap();
        assert_eq!(decoded.prefix, "bchtest");
        assert_eq!(decoded.kind, AddressKind::P2pkh);
        assert_eq!(decoded.pkh().unwrap(), VECTOR_PKH);

        let script_hash = [7u8; 32];
        let p2sh = encode("bchtest", AddressKind::P2sh, &script_hash).unwrap();
        let decoded = decode(&p2sh).unwrap();
        assert_eq!(decoded.kind, AddressKind::P2sh);
        assert_eq!(decoded.payload, script_hash);
        assert!(decoded.pkh().is_err());
    }

    #[test]
    fn uppercase_is_accepted_mixed_case_is_not() {
        let addr = encode("bchtest", AddressKind::P2pkh, &VECTOR_PKH).unwrap();
        assert!(decode(&addr.to_ascii_uppercase()).is_ok());
        let mut mixed = addr.clone();
        mixed.truncate(addr.len() - 1);
        mixed.push(addr.chars().last().unwrap().to_ascii_uppercase());
        assert!(decode(&mixed).is_err());
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let addr = encode("bchtest", AddressKind::P2pkh, &VECTOR_PKH).unwrap();
        let mut corrupted: Vec<char> = addr.chars().collect();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == 'q' { 'p' } else { 'q' };
        let corrupted: String = corrupted.into_iter().collect();
        assert!(decode(&corrupted).is_err());
    }

    #[test]
    fn prefix_is_required_and_checksummed() {
        assert!(decode("qr6m7j9njldwwzlg9v7v53unlr4jkmx6eylep8ekg2").is_err());
        // Valid body under the wrong prefix must fail the checksum.
        let addr = encode("bitcoincash", AddressKind::P2pkh, &VECTOR_PKH).unwrap();
        let body = addr.split_once(':').unwrap().1;
        assert!(decode(&format!("bchtest:{}", body)).is_err());
    }
}
