//! History scan resolving the canonical registry record.
//!
//! Many records may exist in an address's history (every rule change
//! publishes a new one). The scanner visits each history entry, decodes
//! candidate records and keeps exactly one running best under a total
//! ordering, so the result is independent of discovery order.

use chrono::Utc;

use super::{decode_script, RegistryRecord, PREFILTER_HEX};
use crate::chain::ChainClient;
use crate::tx::script::op::OP_RETURN;
use crate::Result;

/// The authoritative record for an address, with its provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// The decoded configuration.
    pub record: RegistryRecord,
    /// Transaction that published it.
    pub txid: String,
    /// Confirmation height of that transaction (negative if unknown).
    pub height: i64,
    /// Publication timestamp, seconds since epoch.
    pub timestamp: i64,
}

impl CanonicalRecord {
    /// Total order: timestamp, then height, then txid, all descending.
    ///
    /// Strictly-greater wins, so equal candidates never thrash the slot.
    fn supersedes(&self, other: &CanonicalRecord) -> bool {
        (self.timestamp, self.height, self.txid.as_str())
            > (other.timestamp, other.height, other.txid.as_str())
    }
}

/// Result of a registry scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The canonical record.
    Found(CanonicalRecord),
    /// Every history entry was inspected and none carried a record.
    Empty,
    /// No record surfaced, but `skipped` entries could not be fetched, so
    /// absence is unconfirmed. Callers should warn before treating the
    /// vault as new.
    Inconclusive {
        /// Number of entries skipped on fetch failure.
        skipped: usize,
    },
}

/// Scan an address's history for the canonical registry record.
///
/// Entries are visited newest-height first as a best-effort optimization;
/// correctness comes from the total ordering, not the visit order.
/// Per-entry fetch failures and malformed candidates are skipped without
/// aborting, so a valid older record stays discoverable despite noise
/// elsewhere in history. Only a failed history fetch itself is an error.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(chain)))]
pub async fn scan_registry<C>(chain: &C, address: &str) -> Result<ScanOutcome>
where
    C: ChainClient + ?Sized,
{
    let mut history = chain.get_history(address).await?;
    history.sort_by(|a, b| b.height.cmp(&a.height));

    let mut best: Option<CanonicalRecord> = None;
    let mut skipped = 0usize;

    for entry in &history {
        let raw = match chain.get_raw_transaction(&entry.tx_hash).await {
            Ok(raw) => raw.to_ascii_lowercase(),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(txid = %entry.tx_hash, error = %_err, "skipping history entry");
                skipped += 1;
                continue;
            }
        };

        // Cheap literal pre-filter before paying for the structured fetch.
        if !raw.contains(PREFILTER_HEX) {
            continue;
        }

        let info = match chain.get_transaction_info(&entry.tx_hash).await {
            Ok(info) => info,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(txid = %entry.tx_hash, error = %_err, "skipping history entry");
                skipped += 1;
                continue;
            }
        };
        let timestamp = info
            .timestamp()
            .unwrap_or_else(|| Utc::now().timestamp());

        for output in &info.vout {
            let Ok(script) = hex::decode(output.script_pub_key.hex.trim()) else {
                continue;
            };
            if script.first() != Some(&OP_RETURN) {
                continue;
            }
            match decode_script(&script) {
                Ok(record) => {
                    let candidate = CanonicalRecord {
                        record,
                        txid: entry.tx_hash.clone(),
                        height: entry.height,
                        timestamp,
                    };
                    if best.as_ref().map_or(true, |b| candidate.supersedes(b)) {
                        best = Some(candidate);
                    }
                }
                // Malformed candidate: skip it, keep scanning.
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(txid = %entry.tx_hash, error = %_err, "malformed record");
                }
            }
        }
    }

    Ok(match best {
        Some(record) => ScanOutcome::Found(record),
        None if skipped > 0 => ScanOutcome::Inconclusive { skipped },
        None => ScanOutcome::Empty,
    })
}
