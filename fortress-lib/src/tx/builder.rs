//! Fee-converging transaction construction.
//!
//! Fees are a function of serialized size, and the change output's value
//! is a function of the fee. Every transaction kind here resolves that
//! circular dependency with the same bounded two-pass routine. All three
//! kinds consume every provided UTXO in provider order; vault UTXO counts
//! are assumed small and selection is out of scope.

use crate::address::DecodedAddress;
use crate::chain::Utxo;
use crate::contract::BoundContract;
use crate::tx::script::{locking_script_for, p2pkh_placeholder_unlocking_script};
use crate::tx::serialize::{TxInput, TxOutput, UnsignedTransaction, SEQUENCE_FINAL};
use crate::{FortressError, Result};

/// Flat fee rate in satoshis per serialized byte.
pub const FEE_RATE_PER_BYTE: u64 = 2;

/// Minimum economical output value.
pub const DUST_THRESHOLD: u64 = 546;

/// Fixed anchor output value in a publish transaction.
pub const PUBLISH_ANCHOR_SATS: u64 = 1000;

/// Size padding for the rescue fee estimate, in bytes.
pub const RESCUE_SIZE_MARGIN: u64 = 100;

/// A constructed transaction with its converged amounts.
#[derive(Clone, Debug)]
pub struct BuiltTransaction {
    /// The unsigned transaction, ready for the signing collaborator.
    pub tx: UnsignedTransaction,
    /// Total fee in satoshis.
    pub fee: u64,
    /// Final value of the variable (change/remainder/sweep) output.
    pub variable_output: u64,
}

fn owner_inputs(utxos: &[Utxo]) -> Vec<TxInput> {
    utxos
        .iter()
        .map(|utxo| TxInput {
            txid: utxo.txid.clone(),
            vout: utxo.vout,
            unlocking_script: p2pkh_placeholder_unlocking_script(),
            satoshis: utxo.satoshis,
            sequence: SEQUENCE_FINAL,
        })
        .collect()
}

fn contract_inputs(utxos: &[Utxo], unlocking_script: &[u8]) -> Vec<TxInput> {
    utxos
        .iter()
        .map(|utxo| TxInput {
            txid: utxo.txid.clone(),
            vout: utxo.vout,
            unlocking_script: unlocking_script.to_vec(),
            satoshis: utxo.satoshis,
            sequence: SEQUENCE_FINAL,
        })
        .collect()
}

/// Shared convergence routine: size the transaction, derive the fee, and
/// settle the variable output at `variable_index`.
///
/// Two passes, because changing the variable amount can shift its own
/// encoding at value boundaries; the second result is accepted as the
/// fixed point. Fails without a partial transaction when the variable
/// output would land under the dust threshold.
fn converge_variable(
    tx: &mut UnsignedTransaction,
    variable_index: usize,
) -> Result<(u64, u64)> {
    let input_sum = tx.input_sum();
    let fixed: u64 = tx
        .outputs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != variable_index)
        .map(|(_, o)| o.satoshis)
        .sum();

    tx.outputs[variable_index].satoshis = input_sum.saturating_sub(fixed);

    let mut fee = 0u64;
    let mut variable = 0u64;
    for _ in 0..2 {
        let size = tx.serialize()?.len() as u64;
        fee = size * FEE_RATE_PER_BYTE;
        let required = fixed + fee + DUST_THRESHOLD;
        if input_sum < required {
            return Err(FortressError::insufficient_funds(required, input_sum));
        }
        variable = input_sum - fixed - fee;
        tx.outputs[variable_index].satoshis = variable;
    }
    Ok((fee, variable))
}

/// Build a registry publish transaction.
///
/// Self-funded from the owner's own UTXOs: the data-carrier output holds
/// the record at zero value, a fixed anchor and the converged remainder
/// both return to the owner. No validation beyond the builder invariants.
pub fn build_publish(
    owner: &DecodedAddress,
    utxos: &[Utxo],
    record_script: Vec<u8>,
) -> Result<BuiltTransaction> {
    let owner_locking = locking_script_for(owner)?;

    let mut tx = UnsignedTransaction::new();
    tx.inputs = owner_inputs(utxos);
    tx.outputs.push(TxOutput {
        satoshis: 0,
        locking_script: record_script,
    });
    tx.outputs.push(TxOutput {
        satoshis: PUBLISH_ANCHOR_SATS,
        locking_script: owner_locking.clone(),
    });
    tx.outputs.push(TxOutput {
        satoshis: 0,
        locking_script: owner_locking,
    });

    let (fee, variable) = converge_variable(&mut tx, 2)?;
    Ok(BuiltTransaction {
        tx,
        fee,
        variable_output: variable,
    })
}

/// Build a withdrawal from the vault back to the owner.
///
/// Fails fast on amounts above the configured limit or under the dust
/// threshold; the remainder returns to the vault address and must itself
/// clear dust after the fee.
pub fn build_withdraw(
    contract: &BoundContract,
    utxos: &[Utxo],
    owner: &DecodedAddress,
    amount: u64,
) -> Result<BuiltTransaction> {
    if amount > contract.config.limit {
        return Err(FortressError::validation(
            "amount",
            format!(
                "{} exceeds the vault limit of {} sats",
                amount, contract.config.limit
            ),
        ));
    }
    if amount < DUST_THRESHOLD {
        return Err(FortressError::validation(
            "amount",
            format!("{} is below the {}-sat dust threshold", amount, DUST_THRESHOLD),
        ));
    }

    let owner_locking = locking_script_for(owner)?;
    let unlocking = contract.withdraw_unlocking_script(amount);

    let mut tx = UnsignedTransaction::new();
    tx.inputs = contract_inputs(utxos, &unlocking);
    tx.outputs.push(TxOutput {
        satoshis: amount,
        locking_script: owner_locking,
    });
    tx.outputs.push(TxOutput {
        satoshis: 0,
        locking_script: contract.locking_script(),
    });

    let (fee, variable) = converge_variable(&mut tx, 1)?;
    Ok(BuiltTransaction {
        tx,
        fee,
        variable_output: variable,
    })
}

/// Build a rescue sweep of the entire vault balance.
///
/// Ignores the withdrawal limit. The fee is a one-pass estimate over the
/// placeholder serialization plus a fixed size margin, trading fee
/// precision for certain availability; there is no reconvergence.
pub fn build_rescue(
    contract: &BoundContract,
    utxos: &[Utxo],
    rescuer: &DecodedAddress,
) -> Result<BuiltTransaction> {
    let rescuer_locking = locking_script_for(rescuer)?;
    let unlocking = contract.rescue_unlocking_script();

    let mut tx = UnsignedTransaction::new();
    tx.inputs = contract_inputs(utxos, &unlocking);
    tx.outputs.push(TxOutput {
        satoshis: 0,
        locking_script: rescuer_locking,
    });

    let input_sum = tx.input_sum();
    let estimated_size = tx.serialize()?.len() as u64 + RESCUE_SIZE_MARGIN;
    let fee = estimated_size * FEE_RATE_PER_BYTE;
    let required = fee + DUST_THRESHOLD;
    if input_sum < required {
        return Err(FortressError::insufficient_funds(required, input_sum));
    }
    let amount = input_sum - fee;
    tx.outputs[0].satoshis = amount;

    Ok(BuiltTransaction {
        tx,
        fee,
        variable_output: amount,
    })
}
