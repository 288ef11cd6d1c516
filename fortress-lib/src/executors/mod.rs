//! Chain-data executor implementations.

pub mod config;
pub mod electrum;

pub use config::{ElectrumBridgeConfig, Network};
pub use electrum::ElectrumHttpExecutor;
