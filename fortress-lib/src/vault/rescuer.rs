//! The rescuer's independently owned session handle.

use std::sync::Arc;

use crate::address::{self, DecodedAddress};
use crate::chain::TransactionSigner;
use crate::{FortressError, Result};

/// A verified rescuer identity with its own signer.
///
/// Owner and rescuer are separate handles passed explicitly to signing
/// calls, never shared state. Construction is the verification step: the
/// connected identity's derived hash is compared byte-for-byte against
/// the hash stored on chain, so a handle existing at all means the
/// rescuer is genuine.
#[derive(Debug)]
pub struct RescuerSession<S> {
    decoded: DecodedAddress,
    cashaddr: String,
    pkh: [u8; 20],
    signer: Arc<S>,
}

impl<S: TransactionSigner> RescuerSession<S> {
    /// Verify `address` against the stored rescuer hash and wrap its
    /// signer.
    ///
    /// Returns [`FortressError::RescuerMismatch`] when the derived hash
    /// differs; no handle is created in that case.
    pub fn connect(address: &str, signer: Arc<S>, stored_pkh: &[u8; 20]) -> Result<Self> {
        let decoded = address::decode(address)?;
        let pkh = decoded.pkh()?;
        if &pkh != stored_pkh {
            return Err(FortressError::RescuerMismatch);
        }
        Ok(Self {
            cashaddr: address.trim().to_ascii_lowercase(),
            decoded,
            pkh,
            signer,
        })
    }

    /// The rescuer's decoded address, used as the sweep destination.
    pub fn address(&self) -> &DecodedAddress {
        &self.decoded
    }

    /// The rescuer's address string.
    pub fn cashaddr(&self) -> &str {
        &self.cashaddr
    }

    /// The verified key hash.
    pub fn pkh(&self) -> &[u8; 20] {
        &self.pkh
    }

    /// The rescuer's signer.
    pub fn signer(&self) -> &Arc<S> {
        &self.signer
    }
}
