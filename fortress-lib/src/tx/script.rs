//! Script construction primitives.
//!
//! Only the handful of script shapes the vault protocol emits: minimal
//! data pushes, minimal script numbers, P2PKH/P2SH locking scripts and
//! the fixed-size placeholder unlocking data that makes unsigned
//! serialization byte-exact.

use sha2::{Digest, Sha256};

use crate::address::{AddressKind, DecodedAddress};
use crate::{FortressError, Result};

/// Script opcodes used by the vault protocol.
pub mod op {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_1: u8 = 0x51;
    pub const OP_16: u8 = 0x60;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_HASH256: u8 = 0xaa;
    pub const OP_CHECKSIG: u8 = 0xac;
}

/// Schnorr signature plus hashtype byte.
pub const PLACEHOLDER_SIG_LEN: usize = 65;

/// Compressed public key.
pub const PLACEHOLDER_PUBKEY_LEN: usize = 33;

/// Fixed-length stand-in for a signature, so unsigned size equals signed size.
pub fn placeholder_signature() -> Vec<u8> {
    vec![0u8; PLACEHOLDER_SIG_LEN]
}

/// Fixed-length stand-in for a public key.
pub fn placeholder_pubkey() -> Vec<u8> {
    vec![0u8; PLACEHOLDER_PUBKEY_LEN]
}

/// Append a minimal data push.
pub fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0 => script.push(op::OP_0),
        1..=75 => {
            script.push(data.len() as u8);
            script.extend_from_slice(data);
        }
        76..=255 => {
            script.push(op::OP_PUSHDATA1);
            script.push(data.len() as u8);
            script.extend_from_slice(data);
        }
        _ => {
            script.push(op::OP_PUSHDATA2);
            script.extend_from_slice(&(data.len() as u16).to_le_bytes());
            script.extend_from_slice(data);
        }
    }
}

/// Minimal script-number bytes for a non-negative value (no opcode).
///
/// Little-endian with a sign bit in the top bit of the last byte; a zero
/// byte is appended when the top bit would read as negative.
pub fn script_num(value: u64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let mut bytes = Vec::new();
    let mut v = value;
    while v > 0 {
        bytes.push((v & 0xff) as u8);
        v >>= 8;
    }
    if bytes.last().map_or(false, |b| b & 0x80 != 0) {
        bytes.push(0);
    }
    bytes
}

/// Append a minimally-encoded numeric push (`OP_0`/`OP_1..OP_16` or a
/// script-number data push).
pub fn push_number(script: &mut Vec<u8>, value: u64) {
    match value {
        0 => script.push(op::OP_0),
        1..=16 => script.push(op::OP_1 + (value as u8 - 1)),
        _ => push_data(script, &script_num(value)),
    }
}

/// `OP_DUP OP_HASH160 <pkh> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_locking_script(pkh: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(op::OP_DUP);
    script.push(op::OP_HASH160);
    push_data(&mut script, pkh);
    script.push(op::OP_EQUALVERIFY);
    script.push(op::OP_CHECKSIG);
    script
}

/// `OP_HASH160 <20-byte hash> OP_EQUAL`
pub fn p2sh20_locking_script(script_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.push(op::OP_HASH160);
    push_data(&mut script, script_hash);
    script.push(op::OP_EQUAL);
    script
}

/// `OP_HASH256 <32-byte hash> OP_EQUAL`
pub fn p2sh32_locking_script(script_hash: &[u8; 32]) -> Vec<u8> {
    let mut script = Vec::with_capacity(35);
    script.push(op::OP_HASH256);
    push_data(&mut script, script_hash);
    script.push(op::OP_EQUAL);
    script
}

/// Locking script for a decoded address of any supported kind.
pub fn locking_script_for(address: &DecodedAddress) -> Result<Vec<u8>> {
    match (address.kind, address.payload.len()) {
        (AddressKind::P2pkh, 20) => {
            let mut pkh = [0u8; 20];
            pkh.copy_from_slice(&address.payload);
            Ok(p2pkh_locking_script(&pkh))
        }
        (AddressKind::P2sh, 20) => {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&address.payload);
            Ok(p2sh20_locking_script(&hash))
        }
        (AddressKind::P2sh, 32) => {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&address.payload);
            Ok(p2sh32_locking_script(&hash))
        }
        (kind, len) => Err(FortressError::validation(
            "address",
            format!("unsupported script form {:?}/{} bytes", kind, len),
        )),
    }
}

/// Placeholder P2PKH unlocking script: push(sig) + push(pubkey).
pub fn p2pkh_placeholder_unlocking_script() -> Vec<u8> {
    let mut script = Vec::with_capacity(PLACEHOLDER_SIG_LEN + PLACEHOLDER_PUBKEY_LEN + 2);
    push_data(&mut script, &placeholder_signature());
    push_data(&mut script, &placeholder_pubkey());
    script
}

/// SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Double SHA-256.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Electrum-style script hash: SHA-256 of the locking script, reversed, hex.
pub fn electrum_scripthash(locking_script: &[u8]) -> String {
    let mut hash = sha256(locking_script);
    hash.reverse();
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_are_minimal() {
        let mut s = Vec::new();
        push_data(&mut s, &[]);
        assert_eq!(s, [op::OP_0]);

        let mut s = Vec::new();
        push_data(&mut s, &[0xab; 75]);
        assert_eq!(s[0], 75);

        let mut s = Vec::new();
        push_data(&mut s, &[0xab; 76]);
        assert_eq!(&s[..2], &[op::OP_PUSHDATA1, 76]);
    }

    #[test]
    fn script_numbers_are_minimal_and_sign_safe() {
        assert!(script_num(0).is_empty());
        assert_eq!(script_num(1), [0x01]);
        assert_eq!(script_num(127), [0x7f]);
        // 128 would read negative without the trailing zero
        assert_eq!(script_num(128), [0x80, 0x00]);
        assert_eq!(script_num(10_000), [0x10, 0x27]);
        assert_eq!(script_num(0x0100), [0x00, 0x01]);
    }

    #[test]
    fn small_numbers_use_op_n() {
        let mut s = Vec::new();
        push_number(&mut s, 0);
        push_number(&mut s, 1);
        push_number(&mut s, 16);
        push_number(&mut s, 17);
        assert_eq!(&s[..3], &[op::OP_0, op::OP_1, op::OP_16]);
        assert_eq!(&s[3..], &[0x01, 17]);
    }

    #[test]
    fn standard_locking_script_shapes() {
        let pkh = [0x11u8; 20];
        let p2pkh = p2pkh_locking_script(&pkh);
        assert_eq!(p2pkh.len(), 25);
        assert_eq!(p2pkh[0], op::OP_DUP);
        assert_eq!(p2pkh[24], op::OP_CHECKSIG);

        let p2sh32 = p2sh32_locking_script(&[0x22u8; 32]);
        assert_eq!(p2sh32.len(), 35);
        assert_eq!(p2sh32[0], op::OP_HASH256);
        assert_eq!(p2sh32[34], op::OP_EQUAL);
    }

    #[test]
    fn placeholder_unlocker_is_one_hundred_bytes() {
        // 1 + 65 + 1 + 33: the size a real signed P2PKH input script has.
        assert_eq!(p2pkh_placeholder_unlocking_script().len(), 100);
    }

    #[test]
    fn scripthash_is_reversed_sha256() {
        let script = p2pkh_locking_script(&[0u8; 20]);
        let hash = electrum_scripthash(&script);
        assert_eq!(hash.len(), 64);
        let mut expected = sha256(&script);
        expected.reverse();
        assert_eq!(hash, hex::encode(expected));
    }
}
