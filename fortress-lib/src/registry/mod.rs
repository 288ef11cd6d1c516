//! On-chain vault configuration registry.
//!
//! A vault's rules (withdrawal limit and rescuer identity) are published
//! inside a provably-unspendable data output so any client can rediscover
//! them from address history alone. This module defines the record wire
//! format; [`scanner`] resolves the canonical record among historical
//! candidates.

pub mod scanner;

pub use scanner::{scan_registry, CanonicalRecord, ScanOutcome};

use crate::tx::script::op::OP_RETURN;

/// Three-byte ASCII tag opening every registry record.
pub const REGISTRY_MAGIC: [u8; 3] = *b"FV1";

/// Literal substring of raw transaction hex used as the cheap scan
/// pre-filter: return-data opcode plus the 3-byte magic push.
pub const PREFILTER_HEX: &str = "6a03465631";

/// A decoded vault configuration record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Withdrawal limit in satoshis.
    pub limit: u64,
    /// Hash identifying the rescuer key.
    pub rescuer_pkh: [u8; 20],
}

/// Why a candidate record failed to decode.
///
/// Non-fatal: the scanner skips the candidate and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record truncated")]
    Truncated,
    #[error("magic tag mismatch")]
    BadMagic,
    #[error("rescuer hash length {0}, expected 20")]
    BadHashLength(usize),
    #[error("limit wider than 8 bytes")]
    LimitOverflow,
}

/// Encode a record as a complete data-carrier output script.
///
/// Layout: `OP_RETURN` + push(magic) + push(minimal little-endian limit)
/// + push(20-byte rescuer hash). The limit has no high zero bytes but is
/// at least one byte long even when zero.
pub fn encode_script(limit: u64, rescuer_pkh: &[u8; 20]) -> Vec<u8> {
    let mut limit_le: Vec<u8> = limit.to_le_bytes().to_vec();
    while limit_le.len() > 1 && limit_le.last() == Some(&0) {
        limit_le.pop();
    }

    let mut script = Vec::with_capacity(7 + limit_le.len() + 22);
    script.push(OP_RETURN);
    script.push(REGISTRY_MAGIC.len() as u8);
    script.extend_from_slice(&REGISTRY_MAGIC);
    script.push(limit_le.len() as u8);
    script.extend_from_slice(&limit_le);
    script.push(rescuer_pkh.len() as u8);
    script.extend_from_slice(rescuer_pkh);
    script
}

/// Decode a data-carrier output script into a record.
///
/// The leading opcode and magic must match exactly; the hash length byte
/// must equal 20. Trailing bytes beyond the record are ignored.
pub fn decode_script(script: &[u8]) -> Result<RegistryRecord, RecordError> {
    if script.len() < 5 {
        return Err(RecordError::Truncated);
    }
    if script[0] != OP_RETURN || script[1] != REGISTRY_MAGIC.len() as u8 {
        return Err(RecordError::BadMagic);
    }
    if script[2..5] != REGISTRY_MAGIC {
        return Err(RecordError::BadMagic);
    }

    let mut cursor = 5usize;
    let limit_len = *script.get(cursor).ok_or(RecordError::Truncated)? as usize;
    cursor += 1;
    if limit_len > 8 {
        return Err(RecordError::LimitOverflow);
    }
    let limit_bytes = script
        .get(cursor..cursor + limit_len)
        .ok_or(RecordError::Truncated)?;
    cursor += limit_len;
    let mut limit: u64 = 0;
    for (i, &b) in limit_bytes.iter().enumerate() {
        limit |= u64::from(b) << (8 * i);
    }

    let hash_len = *script.get(cursor).ok_or(RecordError::Truncated)? as usize;
    cursor += 1;
    if hash_len != 20 {
        return Err(RecordError::BadHashLength(hash_len));
    }
    let hash_bytes = script
        .get(cursor..cursor + 20)
        .ok_or(RecordError::Truncated)?;
    let mut rescuer_pkh = [0u8; 20];
    rescuer_pkh.copy_from_slice(hash_bytes);

    Ok(RegistryRecord { limit, rescuer_pkh })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkh(seed: u8) -> [u8; 20] {
        let mut h = [0u8; 20];
        for (i, b) in h.iter_mut().enumerate() {
            *b = seed.wrapping_add(i as u8);
        }
        h
    }

    #[test]
    fn encodes_the_documented_wire_layout() {
        let script = encode_script(10_000, &pkh(0x40));
        let hex = hex::encode(&script);
        // 0x2710 little-endian with a 2-byte length prefix
        assert!(hex.starts_with("6a034656310210271440"));
        assert_eq!(script.len(), 5 + 1 + 2 + 1 + 20);
    }

    #[test]
    fn zero_limit_still_occupies_one_byte() {
        let script = encode_script(0, &pkh(1));
        assert_eq!(script[5], 1);
        assert_eq!(script[6], 0);
        assert_eq!(decode_script(&script).unwrap().limit, 0);
    }

    #[test]
    fn limit_encoding_is_minimal() {
        // 256 = 0x0100 -> two bytes, low first, no third zero byte
        let script = encode_script(256, &pkh(2));
        assert_eq!(script[5], 2);
        assert_eq!(&script[6..8], &[0x00, 0x01]);
    }

    #[test]
    fn round_trips_across_the_limit_range() {
        for limit in [0u64, 1, 255, 256, 546, 10_000, u32::MAX as u64, u64::MAX] {
            let hash = pkh((limit % 251) as u8);
            let decoded = decode_script(&encode_script(limit, &hash)).unwrap();
            assert_eq!(decoded, RegistryRecord { limit, rescuer_pkh: hash });
        }
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut script = encode_script(5_000, &pkh(3));
        script[4] = b'2';
        assert_eq!(decode_script(&script), Err(RecordError::BadMagic));
        assert_eq!(decode_script(&[0x6a, 0x03]), Err(RecordError::Truncated));
    }

    #[test]
    fn non_standard_hash_length_is_rejected() {
        let mut script = encode_script(5_000, &pkh(4));
        let hash_len_index = 5 + 1 + 2;
        script[hash_len_index] = 19;
        assert_eq!(decode_script(&script), Err(RecordError::BadHashLength(19)));
    }

    #[test]
    fn truncated_hash_is_rejected() {
        let script = encode_script(5_000, &pkh(5));
        assert_eq!(
            decode_script(&script[..script.len() - 1]),
            Err(RecordError::Truncated)
        );
    }
}
