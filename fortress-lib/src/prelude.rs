//! Prelude module for convenient imports.
//!
//! Import everything with:
//!
//! ```rust,ignore
//! use fortress_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - Error types: `FortressError`, `FortressErrorCode`, `Result`
//! - Collaborator traits: `ChainClient`, `TransactionSigner`
//! - Core data: `Utxo`, `RegistryRecord`, `VaultConfig`, `UnsignedTransaction`
//! - The policy engine: `VaultSession`, `RescuerSession`, `VaultState`

// Error handling
pub use crate::errors::{FortressError, FortressErrorCode};
pub use crate::Result;

// Collaborator traits
pub use crate::chain::{ChainClient, SignedTransaction, TransactionSigner};

// Core data
pub use crate::amount::{from_sats, to_sats, AmountUnit};
pub use crate::chain::{HistoryEntry, Utxo};
pub use crate::contract::{BoundContract, ContractTemplate, VaultConfig};
pub use crate::registry::{scan_registry, CanonicalRecord, RegistryRecord, ScanOutcome};
pub use crate::tx::{
    build_publish, build_rescue, build_withdraw, BuiltTransaction, UnsignedTransaction,
    DUST_THRESHOLD, FEE_RATE_PER_BYTE,
};

// Policy engine
pub use crate::vault::{RescuerSession, VaultSession, VaultState, MIN_VIABLE_LIMIT};

// Executors
pub use crate::executors::{ElectrumBridgeConfig, ElectrumHttpExecutor, Network};
