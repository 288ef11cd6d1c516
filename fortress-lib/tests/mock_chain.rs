//! Shared mock collaborators for the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use fortress_lib::chain::{
    ChainClient, HistoryEntry, ScriptPubKey, SignedTransaction, TransactionInfo,
    TransactionSigner, TxOutInfo, Utxo,
};
use fortress_lib::registry;
use fortress_lib::tx::script::hash256;
use fortress_lib::tx::UnsignedTransaction;
use fortress_lib::{FortressError, Result};

/// Scriptable in-memory chain with call accounting.
#[derive(Default)]
pub struct TestChain {
    utxos: RwLock<HashMap<String, Vec<Utxo>>>,
    history: RwLock<HashMap<String, Vec<HistoryEntry>>>,
    raw: RwLock<HashMap<String, String>>,
    verbose: RwLock<HashMap<String, TransactionInfo>>,
    failing: RwLock<HashSet<String>>,
    broadcasts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    verbose_calls: AtomicUsize,
}

impl TestChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&self, address: &str, txid: &str, satoshis: u64) {
        self.utxos
            .write()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .push(Utxo {
                txid: txid.to_string(),
                vout: 0,
                satoshis,
            });
    }

    pub fn set_utxos(&self, address: &str, utxos: Vec<Utxo>) {
        self.utxos
            .write()
            .unwrap()
            .insert(address.to_string(), utxos);
    }

    /// Seed a registry publication: history entry, raw hex and verbose form.
    pub fn add_registry_tx(
        &self,
        address: &str,
        txid: &str,
        height: i64,
        timestamp: i64,
        limit: u64,
        rescuer_pkh: &[u8; 20],
    ) {
        self.add_script_tx(
            address,
            txid,
            height,
            timestamp,
            registry::encode_script(limit, rescuer_pkh),
        );
    }

    /// Seed a transaction whose first output carries an arbitrary script.
    pub fn add_script_tx(
        &self,
        address: &str,
        txid: &str,
        height: i64,
        timestamp: i64,
        script: Vec<u8>,
    ) {
        let script_hex = hex::encode(&script);
        self.raw
            .write()
            .unwrap()
            .insert(txid.to_string(), format!("0200000000{}00000000", script_hex));
        self.verbose.write().unwrap().insert(
            txid.to_string(),
            TransactionInfo {
                txid: txid.to_string(),
                vout: vec![TxOutInfo {
                    value: 0.0,
                    n: 0,
                    script_pub_key: ScriptPubKey {
                        hex: script_hex,
                        asm: "OP_RETURN".to_string(),
                    },
                }],
                blocktime: Some(timestamp),
                time: None,
            },
        );
        self.push_history(address, txid, height);
    }

    /// Seed an ordinary payment with no registry data.
    pub fn add_plain_tx(&self, address: &str, txid: &str, height: i64) {
        self.raw.write().unwrap().insert(
            txid.to_string(),
            format!("0200000001{}00000000", "ab".repeat(64)),
        );
        self.verbose.write().unwrap().insert(
            txid.to_string(),
            TransactionInfo {
                txid: txid.to_string(),
                vout: Vec::new(),
                blocktime: Some(1_600_000_000),
                time: None,
            },
        );
        self.push_history(address, txid, height);
    }

    fn push_history(&self, address: &str, txid: &str, height: i64) {
        self.history
            .write()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .push(HistoryEntry {
                tx_hash: txid.to_string(),
                height,
            });
    }

    pub fn fail_transaction(&self, txid: &str) {
        self.failing.write().unwrap().insert(txid.to_string());
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn verbose_calls(&self) -> usize {
        self.verbose_calls.load(Ordering::Relaxed)
    }

    fn guard(&self, txid: &str) -> Result<()> {
        if self.failing.read().unwrap().contains(txid) {
            return Err(FortressError::Network(format!("injected failure for {}", txid)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for TestChain {
    async fn get_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .utxos
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_history(&self, address: &str) -> Result<Vec<HistoryEntry>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .history
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_raw_transaction(&self, txid: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.guard(txid)?;
        self.raw
            .read()
            .unwrap()
            .get(txid)
            .cloned()
            .ok_or_else(|| FortressError::Network(format!("unknown transaction {}", txid)))
    }

    async fn get_transaction_info(&self, txid: &str) -> Result<TransactionInfo> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.verbose_calls.fetch_add(1, Ordering::Relaxed);
        self.guard(txid)?;
        self.verbose
            .read()
            .unwrap()
            .get(txid)
            .cloned()
            .ok_or_else(|| FortressError::Network(format!("unknown transaction {}", txid)))
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.broadcasts
            .lock()
            .unwrap()
            .push(raw_hex.to_string());
        Ok(fake_txid(raw_hex))
    }
}

/// Signer double: returns the placeholder bytes as the "signed" form,
/// which is size-exact, and derives a deterministic txid from them.
#[derive(Debug)]
pub struct TestWallet {
    rejection: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl TestWallet {
    pub fn new() -> Self {
        Self {
            rejection: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            rejection: Some(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSigner for TestWallet {
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
        let txid = fake_txid(&raw_hex);
        Ok(SignedTransaction { txid, raw_hex })
    }
}

fn fake_txid(raw_hex: &str) -> String {
    let bytes = hex::decode(raw_hex).unwrap_or_default();
    let mut digest = hash256(&bytes);
    digest.reverse();
    hex::encode(digest)
}

/// Owner key hash used across the integration tests.
pub fn owner_pkh() -> [u8; 20] {
    [0x11; 20]
}

/// Rescuer key hash used across the integration tests.
pub fn rescuer_pkh() -> [u8; 20] {
    [0x22; 20]
}

pub fn owner_address() -> String {
    fortress_lib::address::encode(
        "bchtest",
        fortress_lib::address::AddressKind::P2pkh,
        &owner_pkh(),
    )
    .unwrap()
}

pub fn rescuer_address() -> String {
    fortress_lib::address::encode(
        "bchtest",
        fortress_lib::address::AddressKind::P2pkh,
        &rescuer_pkh(),
    )
    .unwrap()
}

pub fn stranger_address() -> String {
    fortress_lib::address::encode(
        "bchtest",
        fortress_lib::address::AddressKind::P2pkh,
        &[0x33; 20],
    )
    .unwrap()
}

pub fn txid(n: u8) -> String {
    format!("{:02x}", n).repeat(32)
}
