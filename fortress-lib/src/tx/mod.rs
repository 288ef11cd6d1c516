//! Transaction construction: scripts, serialization and the
//! fee-converging builder.

pub mod builder;
pub mod script;
pub mod serialize;

pub use builder::{
    build_publish, build_rescue, build_withdraw, BuiltTransaction, DUST_THRESHOLD,
    FEE_RATE_PER_BYTE, PUBLISH_ANCHOR_SATS, RESCUE_SIZE_MARGIN,
};
pub use serialize::{TxInput, TxOutput, UnsignedTransaction};
