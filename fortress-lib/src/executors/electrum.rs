//! Electrum-bridge executor implementation.
//!
//! Implements [`ChainClient`] against any HTTP bridge that forwards
//! Electrum-protocol JSON-RPC (Fulcrum, ElectrumX and compatible
//! servers behind an HTTP gateway).
//!
//! # Feature Flags
//!
//! This module requires the `http-executor` feature flag for actual HTTP
//! requests. Without it, all requests return an `Unimplemented` error.
//!
//! ```toml
//! [dependencies]
//! fortress-lib = { version = "1.0", features = ["http-executor"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fortress_lib::executors::{ElectrumBridgeConfig, ElectrumHttpExecutor};
//!
//! let executor = ElectrumHttpExecutor::chipnet()?;
//! let utxos = executor.get_utxos("bchtest:qq...").await?;
//! println!("{} unspent outputs", utxos.len());
//! ```
//!
//! Electrum servers index by script hash, not address; the executor
//! derives the script hash from the address before every query.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
#[cfg(feature = "http-executor")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "http-executor")]
use std::time::Duration;

use super::config::ElectrumBridgeConfig;
use crate::address;
use crate::chain::{ChainClient, HistoryEntry, TransactionInfo, Utxo};
use crate::tx::script::{electrum_scripthash, locking_script_for};
use crate::{FortressError, Result};

/// Chain-data executor speaking Electrum JSON-RPC over an HTTP bridge.
///
/// Read-only plus broadcast: it can list UTXOs, fetch history and raw
/// transactions and broadcast signed bytes, but never holds keys or
/// creates transactions itself.
pub struct ElectrumHttpExecutor {
    config: ElectrumBridgeConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
    #[cfg(feature = "http-executor")]
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct UnspentEntry {
    tx_hash: String,
    tx_pos: u32,
    value: u64,
}

#[derive(Deserialize)]
struct RawHistoryEntry {
    tx_hash: String,
    #[serde(default)]
    height: i64,
}

impl ElectrumHttpExecutor {
    /// Create a new executor with the given configuration.
    #[cfg(feature = "http-executor")]
    pub fn new(config: ElectrumBridgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FortressError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a new executor with the given configuration (stub when
    /// feature disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: ElectrumBridgeConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Executor for the public chipnet bridge.
    pub fn chipnet() -> Result<Self> {
        Self::new(ElectrumBridgeConfig::chipnet())
    }

    /// Executor for the public mainnet bridge.
    pub fn mainnet() -> Result<Self> {
        Self::new(ElectrumBridgeConfig::mainnet())
    }

    /// The configuration.
    pub fn config(&self) -> &ElectrumBridgeConfig {
        &self.config
    }

    /// Script hash parameter for an address, as Electrum expects it.
    fn scripthash(&self, addr: &str) -> Result<String> {
        let decoded = address::decode(addr)?;
        let locking = locking_script_for(&decoded)?;
        Ok(electrum_scripthash(&locking))
    }

    /// Issue one JSON-RPC call and decode its `result`.
    #[cfg(feature = "http-executor")]
    async fn rpc<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        #[derive(Deserialize)]
        struct RpcError {
            message: String,
        }
        #[derive(Deserialize)]
        struct RpcResponse<T> {
            result: Option<T>,
            error: Option<RpcError>,
        }

        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FortressError::Network(format!(
                "bridge request failed ({}): {}",
                status, error_text
            )));
        }

        let parsed: RpcResponse<T> = response.json().await.map_err(|e| {
            FortressError::Serialization(format!("failed to parse bridge response: {}", e))
        })?;
        if let Some(err) = parsed.error {
            return Err(FortressError::Network(format!(
                "{} failed: {}",
                method, err.message
            )));
        }
        parsed
            .result
            .ok_or_else(|| FortressError::Network(format!("{} returned no result", method)))
    }

    /// Issue one JSON-RPC call (stub when feature disabled).
    #[cfg(not(feature = "http-executor"))]
    async fn rpc<T: for<'de> Deserialize<'de>>(
        &self,
        _method: &str,
        _params: serde_json::Value,
    ) -> Result<T> {
        Err(FortressError::Unimplemented(
            "Electrum HTTP client not compiled - enable the 'http-executor' feature",
        ))
    }

    /// Map reqwest errors onto the crate error type.
    #[cfg(feature = "http-executor")]
    fn map_reqwest_error(&self, e: reqwest::Error) -> FortressError {
        if e.is_timeout() {
            FortressError::Network(format!(
                "bridge request timed out after {}s",
                self.config.timeout_secs
            ))
        } else if e.is_connect() {
            FortressError::Network(format!("connection to {} failed: {}", self.config.url, e))
        } else {
            FortressError::Network(format!("bridge request failed: {}", e))
        }
    }
}

#[async_trait]
impl ChainClient for ElectrumHttpExecutor {
    async fn get_utxos(&self, addr: &str) -> Result<Vec<Utxo>> {
        let scripthash = self.scripthash(addr)?;
        let entries: Vec<UnspentEntry> = self
            .rpc("blockchain.scripthash.listunspent", json!([scripthash]))
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| Utxo {
                txid: e.tx_hash,
                vout: e.tx_pos,
                satoshis: e.value,
            })
            .collect())
    }

    async fn get_history(&self, addr: &str) -> Result<Vec<HistoryEntry>> {
        let scripthash = self.scripthash(addr)?;
        let entries: Vec<RawHistoryEntry> = self
            .rpc("blockchain.scripthash.get_history", json!([scripthash]))
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| HistoryEntry {
                tx_hash: e.tx_hash,
                height: e.height,
            })
            .collect())
    }

    async fn get_raw_transaction(&self, txid: &str) -> Result<String> {
        self.rpc("blockchain.transaction.get", json!([txid, false]))
            .await
    }

    async fn get_transaction_info(&self, txid: &str) -> Result<TransactionInfo> {
        self.rpc("blockchain.transaction.get", json!([txid, true]))
            .await
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String> {
        self.rpc("blockchain.transaction.broadcast", json!([raw_hex]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripthash_derivation_matches_the_locking_script() {
        let executor = ElectrumHttpExecutor::chipnet().unwrap();
        let pkh = [0x11u8; 20];
        let addr = address::encode("bchtest", address::AddressKind::P2pkh, &pkh).unwrap();
        let hash = executor.scripthash(&addr).unwrap();
        let expected =
            electrum_scripthash(&crate::tx::script::p2pkh_locking_script(&pkh));
        assert_eq!(hash, expected);
    }

    #[test]
    fn invalid_address_fails_before_any_request() {
        let executor = ElectrumHttpExecutor::chipnet().unwrap();
        assert!(executor.scripthash("not-an-address").is_err());
    }
}
