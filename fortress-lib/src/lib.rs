//! Fortress vault protocol library.
//!
//! A Bitcoin Cash vault publishes its rules (withdrawal limit and rescuer
//! identity) in an on-chain registry record, so any client can rediscover
//! the vault from the owner's address history alone. This crate
//! intentionally stays stateless and delegates chain access and signing
//! to callers through trait-based dependency injection.
//!
//! # Features
//!
//! - **Registry codec and scanner**: encode rules into a data-carrier
//!   output and deterministically resolve the canonical record among all
//!   historical candidates
//! - **Fee-converging builder**: publish, withdraw and rescue
//!   transactions with byte-exact size-based fees
//! - **Vault policy engine**: a lifecycle state machine enforcing limit
//!   and rescuer-authorization invariants
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fortress_lib::vault::VaultSession;
//! use fortress_lib::registry::ScanOutcome;
//!
//! let session = VaultSession::new(chain, signer, "bchtest:qq...")?;
//! match session.initialize().await? {
//!     ScanOutcome::Found(record) => println!("vault loaded: {}", record.txid),
//!     _ => {
//!         session.create("bchtest:qz...", 10_000).await?;
//!     }
//! }
//! let txid = session.withdraw(5_000).await?;
//! ```

pub mod address;
pub mod amount;
pub mod chain;
pub mod contract;
pub mod errors;
pub mod executors;
pub mod prelude;
pub mod registry;
pub mod tx;
pub mod vault;

/// Test utilities for vault testing.
///
/// This module is only available with the `test-utils` feature or in
/// test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use amount::{from_sats, to_sats, AmountUnit, SATS_PER_BCH};
pub use chain::{ChainClient, HistoryEntry, SignedTransaction, TransactionSigner, Utxo};
pub use contract::{BoundContract, ContractTemplate, VaultConfig};
pub use errors::{FortressError, FortressErrorCode};
pub use registry::{RegistryRecord, ScanOutcome};
pub use tx::{BuiltTransaction, UnsignedTransaction, DUST_THRESHOLD, FEE_RATE_PER_BYTE};
pub use vault::{RescuerSession, VaultSession, VaultState, MIN_VIABLE_LIMIT};

/// Common result alias for vault operations.
pub type Result<T> = std::result::Result<T, FortressError>;
