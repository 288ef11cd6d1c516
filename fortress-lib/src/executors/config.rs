//! Configuration types for chain-data executors.

use serde::{Deserialize, Serialize};

/// Bitcoin Cash network selection.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet.
    #[default]
    Mainnet,
    /// Chipnet test network.
    Chipnet,
    /// Regtest (local development).
    Regtest,
}

impl Network {
    /// Network name as used by most APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Chipnet => "chipnet",
            Self::Regtest => "regtest",
        }
    }

    /// CashAddr prefix for addresses on this network.
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "bitcoincash",
            Self::Chipnet => "bchtest",
            Self::Regtest => "bchreg",
        }
    }
}

/// Configuration for the Electrum JSON-RPC bridge executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectrumBridgeConfig {
    /// Bridge endpoint URL accepting Electrum-protocol JSON-RPC over
    /// HTTP POST (e.g. "https://chipnet.example.org/rpc").
    pub url: String,

    /// Network the bridge serves.
    #[serde(default)]
    pub network: Network,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl ElectrumBridgeConfig {
    /// Create a new bridge configuration.
    pub fn new(url: impl Into<String>, network: Network) -> Self {
        Self {
            url: url.into(),
            network,
            timeout_secs: default_timeout(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Preset for a public chipnet bridge.
    pub fn chipnet() -> Self {
        Self::new("https://chipnet.imaginary.cash/rpc", Network::Chipnet)
    }

    /// Preset for a public mainnet bridge.
    pub fn mainnet() -> Self {
        Self::new("https://fulcrum.imaginary.cash/rpc", Network::Mainnet)
    }
}
