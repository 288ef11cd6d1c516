//! Vault policy engine: lifecycle state machine, owner session and the
//! rescuer's independent handle.

pub mod rescuer;
pub mod session;
pub mod state;

pub use rescuer::RescuerSession;
pub use session::{VaultSession, BALANCE_POLL_SECS, MIN_VIABLE_LIMIT};
pub use state::{ActiveVault, RecordProvenance, VaultState};
