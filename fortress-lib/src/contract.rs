//! Vault covenant binding and address derivation.
//!
//! The covenant itself is an opaque compiled artifact with three fixed
//! parameter slots: owner hash, rescuer hash and withdrawal limit.
//! Binding produces the redeem script and the vault address, which is a
//! pure function of the three parameters plus the template, so publishing
//! new rules always yields a new address.

use crate::address::{self, AddressKind};
use crate::tx::script::{
    hash256, p2sh32_locking_script, placeholder_pubkey, placeholder_signature, push_data,
    push_number,
};
use crate::Result;

/// Compiled covenant artifact for the fortress vault, parameter slots
/// excluded. Treated as opaque bytes; only its two unlock branches and
/// three constructor parameters are contracted.
const FORTRESS_VAULT_BYTECODE: &[u8] = &[
    0x53, 0x79, 0x00, 0x9c, 0x63, 0x54, 0x79, 0xa9, 0x7b, 0x88, 0xad, 0x76, 0x7b, 0xa1, 0x69,
    0xc0, 0x00, 0x9d, 0x00, 0xcd, 0x81, 0x7b, 0xa9, 0x87, 0x69, 0xcc, 0x78, 0x88, 0x54, 0x7a,
    0x94, 0xa2, 0x63, 0x00, 0xcc, 0x02, 0xe8, 0x03, 0x94, 0xa2, 0x69, 0x68, 0x67, 0x54, 0x7a,
    0xa9, 0x7b, 0x88, 0xad, 0x75, 0x51, 0x67, 0x51, 0x68,
];

/// Branch selector values within the covenant.
const BRANCH_WITHDRAW: u64 = 0;
const BRANCH_RESCUE: u64 = 1;

/// The three immutable parameters of a vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    /// Hash identifying the owner key.
    pub owner_pkh: [u8; 20],
    /// Hash identifying the rescuer key.
    pub rescuer_pkh: [u8; 20],
    /// Withdrawal limit in satoshis.
    pub limit: u64,
}

/// An opaque compiled covenant with fixed parameter slots.
#[derive(Clone, Debug)]
pub struct ContractTemplate {
    bytecode: Vec<u8>,
}

impl ContractTemplate {
    /// The bundled fortress vault covenant.
    pub fn fortress_vault() -> Self {
        Self {
            bytecode: FORTRESS_VAULT_BYTECODE.to_vec(),
        }
    }

    /// Wrap an externally compiled artifact.
    pub fn from_bytecode(bytecode: Vec<u8>) -> Self {
        Self { bytecode }
    }

    /// Bind constructor parameters, deriving the redeem script and the
    /// vault address under the given network prefix.
    ///
    /// Parameters are pushed in reverse declaration order ahead of the
    /// template bytecode; the address commits to the double-SHA-256 of
    /// the resulting redeem script.
    pub fn bind(&self, config: VaultConfig, prefix: &str) -> Result<BoundContract> {
        let mut redeem = Vec::with_capacity(self.bytecode.len() + 64);
        push_number(&mut redeem, config.limit);
        push_data(&mut redeem, &config.rescuer_pkh);
        push_data(&mut redeem, &config.owner_pkh);
        redeem.extend_from_slice(&self.bytecode);

        let script_hash = hash256(&redeem);
        let vault_address = address::encode(prefix, AddressKind::P2sh, &script_hash)?;

        Ok(BoundContract {
            config,
            redeem_script: redeem,
            script_hash,
            address: vault_address,
        })
    }
}

/// A covenant with its parameters bound and address derived.
#[derive(Clone, Debug)]
pub struct BoundContract {
    /// The bound parameters.
    pub config: VaultConfig,
    /// Parameter pushes followed by the template bytecode.
    pub redeem_script: Vec<u8>,
    /// Double-SHA-256 of the redeem script.
    pub script_hash: [u8; 32],
    /// CashAddr form of the vault address.
    pub address: String,
}

impl BoundContract {
    /// P2SH32 locking script paying into the vault.
    pub fn locking_script(&self) -> Vec<u8> {
        p2sh32_locking_script(&self.script_hash)
    }

    /// Placeholder unlocking script for the withdraw branch.
    ///
    /// `amount` is the covenant's withdrawal-amount argument; key and
    /// signature slots hold fixed-length placeholders until signing.
    pub fn withdraw_unlocking_script(&self, amount: u64) -> Vec<u8> {
        let mut script = Vec::with_capacity(self.redeem_script.len() + 112);
        push_data(&mut script, &placeholder_pubkey());
        push_data(&mut script, &placeholder_signature());
        push_number(&mut script, amount);
        push_number(&mut script, BRANCH_WITHDRAW);
        push_data(&mut script, &self.redeem_script);
        script
    }

    /// Placeholder unlocking script for the rescue branch.
    pub fn rescue_unlocking_script(&self) -> Vec<u8> {
        let mut script = Vec::with_capacity(self.redeem_script.len() + 108);
        push_data(&mut script, &placeholder_pubkey());
        push_data(&mut script, &placeholder_signature());
        push_number(&mut script, BRANCH_RESCUE);
        push_data(&mut script, &self.redeem_script);
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::decode;

    fn config(limit: u64) -> VaultConfig {
        VaultConfig {
            owner_pkh: [0x01; 20],
            rescuer_pkh: [0x02; 20],
            limit,
        }
    }

    #[test]
    fn address_is_a_pure_function_of_the_parameters() {
        let template = ContractTemplate::fortress_vault();
        let a = template.bind(config(10_000), "bchtest").unwrap();
        let b = template.bind(config(10_000), "bchtest").unwrap();
        assert_eq!(a.address, b.address);
        assert_eq!(a.redeem_script, b.redeem_script);
    }

    #[test]
    fn any_parameter_change_moves_the_address() {
        let template = ContractTemplate::fortress_vault();
        let base = template.bind(config(10_000), "bchtest").unwrap();
        let other_limit = template.bind(config(10_001), "bchtest").unwrap();
        assert_ne!(base.address, other_limit.address);

        let mut swapped = config(10_000);
        swapped.rescuer_pkh = [0x03; 20];
        let other_rescuer = template.bind(swapped, "bchtest").unwrap();
        assert_ne!(base.address, other_rescuer.address);
    }

    #[test]
    fn vault_address_decodes_as_p2sh32() {
        let template = ContractTemplate::fortress_vault();
        let bound = template.bind(config(5_000), "bchtest").unwrap();
        let decoded = decode(&bound.address).unwrap();
        assert_eq!(decoded.kind, AddressKind::P2sh);
        assert_eq!(decoded.payload, bound.script_hash);
    }

    #[test]
    fn unlocking_scripts_end_with_the_redeem_push() {
        let template = ContractTemplate::fortress_vault();
        let bound = template.bind(config(10_000), "bchtest").unwrap();
        let unlock = bound.withdraw_unlocking_script(5_000);
        assert!(unlock.ends_with(&bound.redeem_script));
        // pubkey and signature slots are fixed-length placeholders
        assert_eq!(unlock[0], 33);
        assert_eq!(unlock[34], 65);

        let rescue = bound.rescue_unlocking_script();
        assert!(rescue.ends_with(&bound.redeem_script));
        assert_eq!(rescue.len(), unlock.len() - 3);
    }
}
