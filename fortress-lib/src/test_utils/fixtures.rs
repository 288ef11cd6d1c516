//! Test fixtures and data generators.

use crate::address::{self, AddressKind};

/// Key hash used for the owner identity in fixtures.
pub fn owner_pkh() -> [u8; 20] {
    [0x11; 20]
}

/// Key hash used for the rescuer identity in fixtures.
pub fn rescuer_pkh() -> [u8; 20] {
    [0x22; 20]
}

/// A third key hash, for "wrong wallet" cases.
pub fn stranger_pkh() -> [u8; 20] {
    [0x33; 20]
}

/// Chipnet address for the fixture owner.
pub fn owner_address() -> String {
    address::encode("bchtest", AddressKind::P2pkh, &owner_pkh()).unwrap()
}

/// Chipnet address for the fixture rescuer.
pub fn rescuer_address() -> String {
    address::encode("bchtest", AddressKind::P2pkh, &rescuer_pkh()).unwrap()
}

/// Chipnet address for a wallet that is neither owner nor rescuer.
pub fn stranger_address() -> String {
    address::encode("bchtest", AddressKind::P2pkh, &stranger_pkh()).unwrap()
}

/// Deterministic 64-hex transaction id from a single byte.
pub fn txid(n: u8) -> String {
    format!("{:02x}", n).repeat(32)
}

/// Sample withdrawal limits covering the interesting boundaries.
pub const SAMPLE_LIMITS: &[u64] = &[
    1_000,      // minimum viable
    10_000,     // typical
    100_000,    // large
    21_000_000, // very large
];
