//! Vault lifecycle states.
//!
//! Tagged variants with enumerated transitions; the session refuses any
//! operation whose current state is not listed for it.

use crate::contract::BoundContract;

/// Where the canonical record came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordProvenance {
    /// Transaction that published the record.
    pub txid: String,
    /// Publication timestamp, seconds since epoch.
    pub timestamp: i64,
}

/// Live vault data carried by the operative state.
#[derive(Clone, Debug)]
pub struct ActiveVault {
    /// The bound covenant, address included.
    pub contract: BoundContract,
    /// Provenance of the record the vault was loaded from, when known.
    pub provenance: Option<RecordProvenance>,
    /// Last observed balance in satoshis.
    pub balance: u64,
}

/// The vault lifecycle.
///
/// `Uninitialized → Scanning → { Empty, Operative }` and
/// `Empty → Creating → Operative`. Loading an existing record enters
/// `Operative` directly; only user-initiated creation passes through
/// `Creating`. "Editing" rules never mutates an operative vault: it
/// returns to `Empty`, because configuration is immutable per address.
#[derive(Clone, Debug)]
pub enum VaultState {
    /// No owner identity yet.
    Uninitialized,
    /// Registry scan in flight.
    Scanning,
    /// No canonical record. `inconclusive` marks scans that skipped
    /// entries on errors, so absence is not confirmed.
    Empty {
        /// True when the scan could not inspect every history entry.
        inconclusive: bool,
    },
    /// Publish transaction being built and signed.
    Creating,
    /// Vault loaded or created; withdraw/rescue paths are open.
    Operative(ActiveVault),
}

impl VaultState {
    /// Stable lowercase state name for errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Scanning => "scanning",
            Self::Empty { .. } => "empty",
            Self::Creating => "creating",
            Self::Operative(_) => "operative",
        }
    }

    /// True when the vault is loaded and spendable paths are open.
    pub fn is_operative(&self) -> bool {
        matches!(self, Self::Operative(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        assert_eq!(VaultState::Uninitialized.name(), "uninitialized");
        assert_eq!(VaultState::Empty { inconclusive: true }.name(), "empty");
        assert!(!VaultState::Creating.is_operative());
    }
}
