//! Mock chain and signer for offline testing and demos.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::chain::{
    ChainClient, HistoryEntry, ScriptPubKey, SignedTransaction, TransactionInfo,
    TransactionSigner, TxOutInfo, Utxo,
};
use crate::registry;
use crate::tx::script::hash256;
use crate::tx::UnsignedTransaction;
use crate::{FortressError, Result};

#[derive(Clone)]
struct MockTransaction {
    raw_hex: String,
    info: TransactionInfo,
}

#[derive(Default)]
struct ChainData {
    utxos: HashMap<String, Vec<Utxo>>,
    history: HashMap<String, Vec<HistoryEntry>>,
    transactions: HashMap<String, MockTransaction>,
    failing: HashSet<String>,
    broadcasts: Vec<String>,
}

/// In-memory blockchain double.
///
/// Seed it with registry transactions, plain transactions and UTXOs,
/// optionally mark individual transactions as unfetchable, then hand it
/// to the session as its [`ChainClient`]. Per-method call counters let
/// tests assert which network traffic an operation produced.
pub struct MockChain {
    data: RwLock<ChainData>,
    history_calls: AtomicUsize,
    utxo_calls: AtomicUsize,
    raw_calls: AtomicUsize,
    verbose_calls: AtomicUsize,
    broadcast_calls: AtomicUsize,
}

impl MockChain {
    /// Create an empty mock chain.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(ChainData::default()),
            history_calls: AtomicUsize::new(0),
            utxo_calls: AtomicUsize::new(0),
            raw_calls: AtomicUsize::new(0),
            verbose_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
        })
    }

    /// Add an unspent output for an address.
    pub fn fund(&self, address: &str, txid: &str, vout: u32, satoshis: u64) {
        self.data.write().unwrap().utxos.entry(address.to_string()).or_default().push(Utxo {
            txid: txid.to_string(),
            vout,
            satoshis,
        });
    }

    /// Replace all unspent outputs for an address.
    pub fn set_utxos(&self, address: &str, utxos: Vec<Utxo>) {
        self.data.write().unwrap().utxos.insert(address.to_string(), utxos);
    }

    /// Record a registry publication in an address's history.
    pub fn record_registry_tx(
        &self,
        address: &str,
        txid: &str,
        height: i64,
        timestamp: i64,
        limit: u64,
        rescuer_pkh: &[u8; 20],
    ) {
        let script = registry::encode_script(limit, rescuer_pkh);
        self.record_data_tx(address, txid, height, Some(timestamp), script);
    }

    /// Record a data-carrier transaction with an arbitrary output script.
    pub fn record_data_tx(
        &self,
        address: &str,
        txid: &str,
        height: i64,
        timestamp: Option<i64>,
        script: Vec<u8>,
    ) {
        let script_hex = hex::encode(&script);
        let raw_hex = format!("02000000000100{}00000000", script_hex);
        let info = TransactionInfo {
            txid: txid.to_string(),
            vout: vec![TxOutInfo {
                value: 0.0,
                n: 0,
                script_pub_key: ScriptPubKey {
                    hex: script_hex,
                    asm: "OP_RETURN".to_string(),
                },
            }],
            blocktime: timestamp,
            time: None,
        };
        let mut data = self.data.write().unwrap();
        data.transactions
            .insert(txid.to_string(), MockTransaction { raw_hex, info });
        data.history
            .entry(address.to_string())
            .or_default()
            .push(HistoryEntry {
                tx_hash: txid.to_string(),
                height,
            });
    }

    /// Record an ordinary payment in an address's history.
    pub fn record_plain_tx(&self, address: &str, txid: &str, height: i64) {
        let info = TransactionInfo {
            txid: txid.to_string(),
            vout: vec![TxOutInfo {
                value: 0.0001,
                n: 0,
                script_pub_key: ScriptPubKey {
                    hex: "76a914".to_string() + &"00".repeat(20) + "88ac",
                    asm: "OP_DUP OP_HASH160".to_string(),
                },
            }],
            blocktime: Some(1_600_000_000),
            time: None,
        };
        let raw_hex = format!("0200000001{}00000000", "00".repeat(60));
        let mut data = self.data.write().unwrap();
        data.transactions
            .insert(txid.to_string(), MockTransaction { raw_hex, info });
        data.history
            .entry(address.to_string())
            .or_default()
            .push(HistoryEntry {
                tx_hash: txid.to_string(),
                height,
            });
    }

    /// Make every fetch of `txid` fail until cleared.
    pub fn fail_transaction(&self, txid: &str) {
        self.data.write().unwrap().failing.insert(txid.to_string());
    }

    /// Clear a previously injected fetch failure.
    pub fn heal_transaction(&self, txid: &str) {
        self.data.write().unwrap().failing.remove(txid);
    }

    /// Raw transactions broadcast through this chain, oldest first.
    pub fn broadcasts(&self) -> Vec<String> {
        self.data.read().unwrap().broadcasts.clone()
    }

    /// Total network calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.history_calls.load(Ordering::Relaxed)
            + self.utxo_calls.load(Ordering::Relaxed)
            + self.raw_calls.load(Ordering::Relaxed)
            + self.verbose_calls.load(Ordering::Relaxed)
            + self.broadcast_calls.load(Ordering::Relaxed)
    }

    /// History fetches issued.
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::Relaxed)
    }

    /// Verbose transaction fetches issued.
    pub fn verbose_calls(&self) -> usize {
        self.verbose_calls.load(Ordering::Relaxed)
    }

    fn check_failing(&self, txid: &str) -> Result<()> {
        if self.data.read().unwrap().failing.contains(txid) {
            return Err(FortressError::Network(format!(
                "injected failure fetching {}",
                txid
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        self.utxo_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .data
            .read()
            .unwrap()
            .utxos
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_history(&self, address: &str) -> Result<Vec<HistoryEntry>> {
        self.history_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .data
            .read()
            .unwrap()
            .history
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_raw_transaction(&self, txid: &str) -> Result<String> {
        self.raw_calls.fetch_add(1, Ordering::Relaxed);
        self.check_failing(txid)?;
        self.data
            .read()
            .unwrap()
            .transactions
            .get(txid)
            .map(|tx| tx.raw_hex.clone())
            .ok_or_else(|| FortressError::Network(format!("unknown transaction {}", txid)))
    }

    async fn get_transaction_info(&self, txid: &str) -> Result<TransactionInfo> {
        self.verbose_calls.fetch_add(1, Ordering::Relaxed);
        self.check_failing(txid)?;
        self.data
            .read()
            .unwrap()
            .transactions
            .get(txid)
            .map(|tx| tx.info.clone())
            .ok_or_else(|| FortressError::Network(format!("unknown transaction {}", txid)))
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String> {
        self.broadcast_calls.fetch_add(1, Ordering::Relaxed);
        let txid = txid_of_raw(raw_hex)?;
        self.data
            .write()
            .unwrap()
            .broadcasts
            .push(raw_hex.to_string());
        Ok(txid)
    }
}

fn txid_of_raw(raw_hex: &str) -> Result<String> {
    let bytes = hex::decode(raw_hex)
        .map_err(|e| FortressError::Serialization(format!("bad raw transaction hex: {}", e)))?;
    let mut digest = hash256(&bytes);
    digest.reverse();
    Ok(hex::encode(digest))
}

/// Deterministic signer double.
///
/// Since placeholder serialization is size-exact, "signing" just reuses
/// the unsigned bytes and derives a txid from their double hash. Can be
/// configured to reject, and records every prompt it was shown.
pub struct MockSigner {
    rejection: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockSigner {
    /// A signer that approves everything.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rejection: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// A signer that rejects every request with `reason`.
    pub fn rejecting(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            rejection: Some(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Prompts shown so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    async fn sign(
        &self,
        tx: &UnsignedTransaction,
        prompt: &str,
        _broadcast: bool,
    ) -> Result<SignedTransaction> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(reason) = &self.rejection {
            return Err(FortressError::SigningRejected(reason.clone()));
        }
        let raw_hex = tx.to_hex()?;
        let txid = txid_of_raw(&raw_hex)?;
        Ok(SignedTransaction { txid, raw_hex })
    }
}
