//! Collaborator traits for chain data access and transaction signing.
//!
//! The library stays stateless about where chain data comes from and who
//! holds keys: callers inject these traits. Read-only queries may run
//! concurrently; the vault session serializes each build/sign/broadcast
//! sequence itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tx::UnsignedTransaction;
use crate::Result;

/// An unspent output funding an address.
///
/// Externally owned and read-only to the transaction builder; the builder
/// consumes all provided UTXOs in the order given, without selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Funding transaction id (big-endian display hex).
    pub txid: String,
    /// Output index within the funding transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub satoshis: u64,
}

/// One entry of an address's transaction history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction id.
    pub tx_hash: String,
    /// Confirmation height; 0 or negative for unconfirmed entries.
    pub height: i64,
}

/// Locking script of an output in the verbose transaction form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPubKey {
    /// Raw script hex.
    pub hex: String,
    /// Disassembled form, e.g. "OP_RETURN 465631 ...".
    #[serde(default)]
    pub asm: String,
}

/// One output in the verbose transaction form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutInfo {
    /// Value in whole coins, as reported by the node.
    #[serde(default)]
    pub value: f64,
    /// Output index.
    #[serde(default)]
    pub n: u32,
    /// Locking script.
    pub script_pub_key: ScriptPubKey,
}

/// Structured (verbose) form of a transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Transaction id.
    #[serde(default)]
    pub txid: String,
    /// Outputs.
    #[serde(default)]
    pub vout: Vec<TxOutInfo>,
    /// Timestamp of the containing block, seconds since epoch.
    #[serde(default)]
    pub blocktime: Option<i64>,
    /// Node-reported receive time, used when `blocktime` is absent.
    #[serde(default)]
    pub time: Option<i64>,
}

impl TransactionInfo {
    /// Best-available timestamp in seconds: block time, then receive time.
    pub fn timestamp(&self) -> Option<i64> {
        self.blocktime.or(self.time)
    }
}

/// Read and broadcast access to the blockchain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// All unspent outputs for an address, in provider order.
    async fn get_utxos(&self, address: &str) -> Result<Vec<Utxo>>;

    /// Full transaction history for an address, in arbitrary order.
    async fn get_history(&self, address: &str) -> Result<Vec<HistoryEntry>>;

    /// Raw transaction bytes as hex.
    async fn get_raw_transaction(&self, txid: &str) -> Result<String>;

    /// Structured transaction with per-output scripts and timestamps.
    async fn get_transaction_info(&self, txid: &str) -> Result<TransactionInfo>;

    /// Broadcast a signed raw transaction, returning its txid.
    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String>;
}

/// Result of a signing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction id of the signed transaction.
    pub txid: String,
    /// Fully signed raw transaction hex.
    pub raw_hex: String,
}

/// A wallet that can sign the builder's unsigned transactions.
///
/// Owner and rescuer are two independently owned signer handles; the
/// session never shares one between the two identities.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign `tx`, showing `prompt` to the user, optionally broadcasting
    /// from the wallet side when `broadcast` is set.
    ///
    /// A declined request surfaces as [`FortressError::SigningRejected`]
    /// and is never retried.
    ///
    /// [`FortressError::SigningRejected`]: crate::FortressError::SigningRejected
    async fn sign(
        &self,
        tx: &UnsignedTransaction,
        prompt: &str,
        broadcast: bool,
    ) -> Result<SignedTransaction>;
}
