//! Canonical record resolution over a deliberately noisy history.

use anyhow::Result;
use chrono::{TimeZone, Utc};

use fortress_lib::registry::{scan_registry, ScanOutcome};
use fortress_lib::test_utils::{owner_address, rescuer_pkh, txid, MockChain};

use crate::ui;

pub async fn run(records: u32) -> Result<()> {
    let chain = MockChain::new();
    let owner = owner_address();

    ui::banner("Registry scan (mock chain)");
    ui::kv("owner", &owner);

    // Competing records published over time, newest limit last.
    let base_ts = 1_700_000_000i64;
    for i in 0..records {
        let limit = 5_000 + u64::from(i) * 2_500;
        chain.record_registry_tx(
            &owner,
            &txid(10 + i as u8),
            100 + i64::from(i),
            base_ts + i64::from(i) * 3_600,
            limit,
            &rescuer_pkh(),
        );
        ui::step(&format!(
            "published record {} with limit {} sats",
            i + 1,
            limit
        ));
    }

    // Noise: ordinary payments and one malformed candidate.
    chain.record_plain_tx(&owner, &txid(90), 95);
    chain.record_plain_tx(&owner, &txid(91), 96);
    let mut malformed = fortress_lib::registry::encode_script(99_999, &rescuer_pkh());
    let hash_len_index = malformed.len() - 21;
    malformed[hash_len_index] = 19;
    chain.record_data_tx(&owner, &txid(92), 200, Some(base_ts + 999_999), malformed);
    ui::step("added two plain payments and one malformed candidate");

    match scan_registry(chain.as_ref(), &owner).await? {
        ScanOutcome::Found(canonical) => {
            let when = Utc
                .timestamp_opt(canonical.timestamp, 0)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| canonical.timestamp.to_string());
            ui::ok("canonical record resolved");
            ui::kv("txid", &canonical.txid);
            ui::kv("height", canonical.height);
            ui::kv("published", when);
            ui::kv("limit", format!("{} sats", canonical.record.limit));
            ui::kv("rescuer hash", hex::encode(canonical.record.rescuer_pkh));
        }
        ScanOutcome::Empty => ui::warn("no record found (confirmed empty history)"),
        ScanOutcome::Inconclusive { skipped } => ui::warn(&format!(
            "no record found, but {} entries were unreadable",
            skipped
        )),
    }

    Ok(())
}
