//! Fee convergence breakdown for a single withdrawal build.

use anyhow::Result;

use fortress_lib::address::decode;
use fortress_lib::chain::Utxo;
use fortress_lib::contract::{ContractTemplate, VaultConfig};
use fortress_lib::test_utils::{owner_address, owner_pkh, rescuer_pkh, txid};
use fortress_lib::tx::{build_withdraw, DUST_THRESHOLD, FEE_RATE_PER_BYTE};

use crate::ui;

pub fn run(balance: u64, limit: u64, amount: u64) -> Result<()> {
    ui::banner("Withdrawal fee convergence");
    ui::kv("balance", format!("{} sats", balance));
    ui::kv("limit", format!("{} sats", limit));
    ui::kv("amount", format!("{} sats", amount));
    ui::kv("fee rate", format!("{} sats/byte", FEE_RATE_PER_BYTE));
    ui::kv("dust floor", format!("{} sats", DUST_THRESHOLD));

    let contract = ContractTemplate::fortress_vault().bind(
        VaultConfig {
            owner_pkh: owner_pkh(),
            rescuer_pkh: rescuer_pkh(),
            limit,
        },
        "bchtest",
    )?;
    ui::kv("vault address", &contract.address);

    let owner = decode(&owner_address())?;
    let utxos = vec![Utxo {
        txid: txid(1),
        vout: 0,
        satoshis: balance,
    }];

    match build_withdraw(&contract, &utxos, &owner, amount) {
        Ok(built) => {
            let size = built.tx.serialize()?.len();
            ui::ok("transaction converged");
            ui::kv("serialized size", format!("{} bytes", size));
            ui::kv("fee", format!("{} sats", built.fee));
            ui::kv("owner receives", format!("{} sats", built.tx.outputs[0].satoshis));
            ui::kv("vault keeps", format!("{} sats", built.variable_output));
            ui::kv(
                "check",
                format!(
                    "{} = {} + {} + {}",
                    built.tx.input_sum(),
                    built.tx.outputs[0].satoshis,
                    built.variable_output,
                    built.fee
                ),
            );
        }
        Err(err) => ui::warn(&format!("build refused: {}", err)),
    }

    Ok(())
}
