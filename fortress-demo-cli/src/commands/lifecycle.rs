//! Full vault lifecycle against the mock chain.

use anyhow::{bail, Result};

use fortress_lib::amount::{from_sats, AmountUnit};
use fortress_lib::registry::ScanOutcome;
use fortress_lib::test_utils::{owner_address, rescuer_address, txid, MockChain, MockSigner};
use fortress_lib::vault::VaultSession;

use crate::ui;

pub async fn run(limit: u64, withdraw: u64, deposit: u64) -> Result<()> {
    let chain = MockChain::new();
    let owner_wallet = MockSigner::new();
    let owner = owner_address();

    ui::banner("Fortress vault lifecycle (mock chain)");
    ui::kv("owner", &owner);
    ui::kv("limit", format!("{} sats", limit));

    let session = VaultSession::new(chain.clone(), owner_wallet, &owner)?;

    ui::step("scanning owner history for existing vault rules");
    match session.initialize().await? {
        ScanOutcome::Found(record) => {
            ui::warn(&format!("unexpected existing record in tx {}", record.txid));
        }
        ScanOutcome::Empty => ui::ok("no record found; vault can be created"),
        ScanOutcome::Inconclusive { skipped } => {
            ui::warn(&format!("scan skipped {} entries; proceeding anyway", skipped))
        }
    }

    ui::step("funding the owner wallet and publishing vault rules");
    chain.fund(&owner, &txid(1), 0, deposit.max(100_000));
    let publish_txid = session.create(&rescuer_address(), limit).await?;
    ui::ok(&format!("rules published in {}", publish_txid));

    let vault_address = match session.vault_address().await {
        Some(address) => address,
        None => bail!("vault did not become operative"),
    };
    ui::kv("vault address", &vault_address);

    ui::step(&format!("depositing {} sats into the vault", deposit));
    chain.fund(&vault_address, &txid(2), 0, deposit);
    let balance = session.refresh_balance().await?;
    ui::kv("balance", format!("{} BCH", from_sats(balance, AmountUnit::Bch)));

    ui::step(&format!("withdrawing {} sats (limit {})", withdraw, limit));
    match session.withdraw(withdraw).await {
        Ok(spend_txid) => ui::ok(&format!("withdrawal broadcast as {}", spend_txid)),
        Err(err) => ui::warn(&format!("withdrawal refused: {}", err)),
    }

    ui::step("connecting the rescuer wallet and sweeping everything");
    let rescuer_wallet = MockSigner::new();
    let rescuer = session
        .connect_rescuer(&rescuer_address(), rescuer_wallet)
        .await?;
    ui::ok("rescuer identity verified against the stored hash");

    // Give the vault a fresh balance so the sweep has something to take.
    chain.set_utxos(
        &vault_address,
        vec![fortress_lib::chain::Utxo {
            txid: txid(3),
            vout: 0,
            satoshis: deposit,
        }],
    );
    session.refresh_balance().await?;

    let sweep_txid = session.rescue(&rescuer).await?;
    ui::ok(&format!("rescue broadcast as {}", sweep_txid));
    ui::kv("broadcasts", chain.broadcasts().len());

    Ok(())
}
