//! Test utilities for vault testing.
//!
//! This module is only available with the `test-utils` feature or in
//! test builds. The demo CLI drives the full vault lifecycle against
//! [`MockChain`] without touching a real network.

mod fixtures;
mod mock_chain;

pub use fixtures::{
    owner_address, owner_pkh, rescuer_address, rescuer_pkh, stranger_address, stranger_pkh,
    txid, SAMPLE_LIMITS,
};
pub use mock_chain::{MockChain, MockSigner};
