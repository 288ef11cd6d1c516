//! The owner's vault session: one logical session per owner address,
//! driving the scanner, the builder and the two collaborator traits
//! through the lifecycle state machine.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::address::{self, DecodedAddress};
use crate::amount::{from_sats, AmountUnit};
use crate::chain::{ChainClient, TransactionSigner};
use crate::contract::{ContractTemplate, VaultConfig};
use crate::registry::{self, scan_registry, ScanOutcome};
use crate::tx::{build_publish, build_rescue, build_withdraw, DUST_THRESHOLD};
use crate::vault::rescuer::RescuerSession;
use crate::vault::state::{ActiveVault, RecordProvenance, VaultState};
use crate::{FortressError, Result};

/// Smallest limit worth publishing: anything lower cannot cover the
/// publish fee plus a withdrawal round trip.
pub const MIN_VIABLE_LIMIT: u64 = 1000;

/// Balance polling interval while operative.
pub const BALANCE_POLL_SECS: u64 = 10;

/// A single owner's vault session.
///
/// Chain reads may run concurrently, but every build/sign/broadcast
/// sequence is serialized end-to-end behind one async gate so a second
/// build can never race the first for the same input set.
pub struct VaultSession<C, S> {
    chain: Arc<C>,
    signer: Arc<S>,
    owner: DecodedAddress,
    owner_address: String,
    owner_pkh: [u8; 20],
    template: ContractTemplate,
    state: Arc<RwLock<VaultState>>,
    op_gate: Mutex<()>,
    poller: StdMutex<Option<JoinHandle<()>>>,
}

impl<C, S> VaultSession<C, S>
where
    C: ChainClient + 'static,
    S: TransactionSigner,
{
    /// Open a session for an owner address with the bundled covenant
    /// template.
    pub fn new(chain: Arc<C>, signer: Arc<S>, owner_address: &str) -> Result<Self> {
        Self::with_template(chain, signer, owner_address, ContractTemplate::fortress_vault())
    }

    /// Open a session with an externally supplied covenant template.
    pub fn with_template(
        chain: Arc<C>,
        signer: Arc<S>,
        owner_address: &str,
        template: ContractTemplate,
    ) -> Result<Self> {
        let owner = address::decode(owner_address)?;
        let owner_pkh = owner.pkh()?;
        Ok(Self {
            chain,
            signer,
            owner_address: owner_address.trim().to_ascii_lowercase(),
            owner,
            owner_pkh,
            template,
            state: Arc::new(RwLock::new(VaultState::Uninitialized)),
            op_gate: Mutex::new(()),
            poller: StdMutex::new(None),
        })
    }

    /// The owner's address string.
    pub fn owner_address(&self) -> &str {
        &self.owner_address
    }

    /// Snapshot of the current lifecycle state.
    pub async fn state(&self) -> VaultState {
        self.state.read().await.clone()
    }

    /// The vault address, when operative.
    pub async fn vault_address(&self) -> Option<String> {
        match &*self.state.read().await {
            VaultState::Operative(v) => Some(v.contract.address.clone()),
            _ => None,
        }
    }

    /// Last observed balance, when operative.
    pub async fn balance(&self) -> Option<u64> {
        match &*self.state.read().await {
            VaultState::Operative(v) => Some(v.balance),
            _ => None,
        }
    }

    /// Scan the owner's history and load the canonical vault, if any.
    ///
    /// `Found` reconstructs the config and enters `Operative` directly.
    /// `Empty` and `Inconclusive` both land in `Empty`, with the
    /// inconclusive flag preserved so callers can warn before allowing
    /// creation. A failed history fetch also lands in inconclusive
    /// `Empty` and surfaces the error.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn initialize(&self) -> Result<ScanOutcome> {
        {
            let mut state = self.state.write().await;
            match &*state {
                VaultState::Uninitialized | VaultState::Empty { .. } => {}
                other => {
                    return Err(FortressError::InvalidState {
                        operation: "initialize",
                        state: other.name(),
                    })
                }
            }
            *state = VaultState::Scanning;
        }

        let outcome = match scan_registry(self.chain.as_ref(), &self.owner_address).await {
            Ok(outcome) => outcome,
            Err(err) => {
                *self.state.write().await = VaultState::Empty { inconclusive: true };
                return Err(err);
            }
        };

        match &outcome {
            ScanOutcome::Found(canonical) => {
                let config = VaultConfig {
                    owner_pkh: self.owner_pkh,
                    rescuer_pkh: canonical.record.rescuer_pkh,
                    limit: canonical.record.limit,
                };
                let contract = match self.template.bind(config, &self.owner.prefix) {
                    Ok(contract) => contract,
                    Err(err) => {
                        *self.state.write().await = VaultState::Empty { inconclusive: true };
                        return Err(err);
                    }
                };
                let balance = self.fetch_balance(&contract.address).await.unwrap_or(0);
                let address = contract.address.clone();
                *self.state.write().await = VaultState::Operative(ActiveVault {
                    contract,
                    provenance: Some(RecordProvenance {
                        txid: canonical.txid.clone(),
                        timestamp: canonical.timestamp,
                    }),
                    balance,
                });
                self.start_polling(address);
            }
            ScanOutcome::Empty => {
                *self.state.write().await = VaultState::Empty {
                    inconclusive: false,
                };
            }
            ScanOutcome::Inconclusive { .. } => {
                *self.state.write().await = VaultState::Empty { inconclusive: true };
            }
        }
        Ok(outcome)
    }

    /// Create a vault: derive the address from the supplied rules and
    /// publish the registry record from the owner's own funds.
    ///
    /// Limit validation happens before any network call. On failure the
    /// session returns to `Empty`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn create(&self, rescuer_address: &str, limit_sats: u64) -> Result<String> {
        let _op = self.op_gate.lock().await;

        if limit_sats == 0 {
            return Err(FortressError::validation(
                "limit",
                "must be greater than zero",
            ));
        }
        if limit_sats < MIN_VIABLE_LIMIT {
            return Err(FortressError::validation(
                "limit",
                format!(
                    "must be at least {} sats to cover registry and withdrawal fees",
                    MIN_VIABLE_LIMIT
                ),
            ));
        }
        let rescuer_pkh = address::decode(rescuer_address)?.pkh()?;

        {
            let mut state = self.state.write().await;
            match &*state {
                VaultState::Empty { .. } => {}
                other => {
                    return Err(FortressError::InvalidState {
                        operation: "create",
                        state: other.name(),
                    })
                }
            }
            *state = VaultState::Creating;
        }

        match self.publish_rules(rescuer_pkh, limit_sats).await {
            Ok(txid) => Ok(txid),
            Err(err) => {
                *self.state.write().await = VaultState::Empty {
                    inconclusive: false,
                };
                Err(err)
            }
        }
    }

    async fn publish_rules(&self, rescuer_pkh: [u8; 20], limit: u64) -> Result<String> {
        let config = VaultConfig {
            owner_pkh: self.owner_pkh,
            rescuer_pkh,
            limit,
        };
        let contract = self.template.bind(config, &self.owner.prefix)?;

        let utxos = self.chain.get_utxos(&self.owner_address).await?;
        if utxos.is_empty() {
            return Err(FortressError::NoSpendableInputs {
                address: self.owner_address.clone(),
            });
        }

        let record = registry::encode_script(limit, &rescuer_pkh);
        let built = build_publish(&self.owner, &utxos, record)?;
        let signed = self
            .signer
            .sign(&built.tx, "Sign vault registry transaction", true)
            .await?;

        let balance = self.fetch_balance(&contract.address).await.unwrap_or(0);
        let address = contract.address.clone();
        *self.state.write().await = VaultState::Operative(ActiveVault {
            contract,
            provenance: Some(RecordProvenance {
                txid: signed.txid.clone(),
                timestamp: Utc::now().timestamp(),
            }),
            balance,
        });
        self.start_polling(address);
        Ok(signed.txid)
    }

    /// Withdraw `amount_sats` from the vault to the owner.
    ///
    /// Success refreshes the balance; failure leaves the session
    /// operative and unchanged.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn withdraw(&self, amount_sats: u64) -> Result<String> {
        let _op = self.op_gate.lock().await;

        let contract = match &*self.state.read().await {
            VaultState::Operative(v) => v.contract.clone(),
            other => {
                return Err(FortressError::InvalidState {
                    operation: "withdraw",
                    state: other.name(),
                })
            }
        };
        if amount_sats == 0 {
            return Err(FortressError::validation("amount", "no valid amount"));
        }

        let utxos = self.chain.get_utxos(&contract.address).await?;
        if utxos.is_empty() {
            return Err(FortressError::NoSpendableInputs {
                address: contract.address.clone(),
            });
        }

        let built = build_withdraw(&contract, &utxos, &self.owner, amount_sats)?;
        let prompt = format!(
            "Withdraw {} BCH from vault",
            from_sats(amount_sats, AmountUnit::Bch)
        );
        let signed = self.signer.sign(&built.tx, &prompt, false).await?;
        let txid = self.chain.send_raw_transaction(&signed.raw_hex).await?;

        self.refresh_after_spend(&contract.address).await;
        Ok(txid)
    }

    /// Sweep the entire balance to the rescuer, ignoring the limit.
    ///
    /// Requires the rescuer's own verified handle; the stored hash is
    /// compared byte-for-byte again at call time, since the operative
    /// vault may have changed since the handle was created.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, rescuer)))]
    pub async fn rescue<R: TransactionSigner>(
        &self,
        rescuer: &RescuerSession<R>,
    ) -> Result<String> {
        let _op = self.op_gate.lock().await;

        let contract = match &*self.state.read().await {
            VaultState::Operative(v) => v.contract.clone(),
            other => {
                return Err(FortressError::InvalidState {
                    operation: "rescue",
                    state: other.name(),
                })
            }
        };
        if rescuer.pkh() != &contract.config.rescuer_pkh {
            return Err(FortressError::RescuerMismatch);
        }

        let utxos = self.chain.get_utxos(&contract.address).await?;
        if utxos.is_empty() {
            return Err(FortressError::NoSpendableInputs {
                address: contract.address.clone(),
            });
        }

        let built = build_rescue(&contract, &utxos, rescuer.address())?;
        let signed = rescuer
            .signer()
            .sign(&built.tx, "Rescue: sweep all vault funds", false)
            .await?;
        let txid = self.chain.send_raw_transaction(&signed.raw_hex).await?;

        self.refresh_after_spend(&contract.address).await;
        Ok(txid)
    }

    /// Verify a rescuer identity against the operative vault and hand
    /// back its session handle.
    pub async fn connect_rescuer<R: TransactionSigner>(
        &self,
        rescuer_address: &str,
        signer: Arc<R>,
    ) -> Result<RescuerSession<R>> {
        match &*self.state.read().await {
            VaultState::Operative(v) => {
                RescuerSession::connect(rescuer_address, signer, &v.contract.config.rescuer_pkh)
            }
            other => Err(FortressError::InvalidState {
                operation: "connect_rescuer",
                state: other.name(),
            }),
        }
    }

    /// Discard the live configuration and return to `Empty`.
    ///
    /// Rules are immutable per on-chain address, so "editing" means
    /// starting over with a new vault.
    pub async fn edit_rules(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match &*state {
                VaultState::Operative(_) => {}
                other => {
                    return Err(FortressError::InvalidState {
                        operation: "edit_rules",
                        state: other.name(),
                    })
                }
            }
            *state = VaultState::Empty {
                inconclusive: false,
            };
        }
        self.stop_polling();
        Ok(())
    }

    /// Re-query the vault balance now.
    pub async fn refresh_balance(&self) -> Result<u64> {
        let address = match &*self.state.read().await {
            VaultState::Operative(v) => v.contract.address.clone(),
            other => {
                return Err(FortressError::InvalidState {
                    operation: "refresh_balance",
                    state: other.name(),
                })
            }
        };
        let total = self.fetch_balance(&address).await?;
        let mut state = self.state.write().await;
        if let VaultState::Operative(v) = &mut *state {
            if v.contract.address == address {
                v.balance = total;
            }
        }
        Ok(total)
    }

    /// Whether a withdrawal could currently clear the dust floor.
    ///
    /// Per-request limits are still enforced at withdraw time.
    pub async fn is_withdraw_ready(&self) -> bool {
        match &*self.state.read().await {
            VaultState::Operative(v) => v.balance > DUST_THRESHOLD,
            _ => false,
        }
    }

    /// Whether this verified rescuer handle could sweep right now.
    pub async fn is_rescue_ready<R: TransactionSigner>(
        &self,
        rescuer: &RescuerSession<R>,
    ) -> bool {
        match &*self.state.read().await {
            VaultState::Operative(v) => {
                v.balance > 0 && rescuer.pkh() == &v.contract.config.rescuer_pkh
            }
            _ => false,
        }
    }

    async fn fetch_balance(&self, address: &str) -> Result<u64> {
        let utxos = self.chain.get_utxos(address).await?;
        Ok(utxos.iter().map(|u| u.satoshis).sum())
    }

    /// Balance refresh after a successful spend. Refresh failures do not
    /// fail the operation that triggered them.
    async fn refresh_after_spend(&self, address: &str) {
        match self.fetch_balance(address).await {
            Ok(total) => {
                let mut state = self.state.write().await;
                if let VaultState::Operative(v) = &mut *state {
                    if v.contract.address == address {
                        v.balance = total;
                    }
                }
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(address, error = %_err, "balance refresh failed");
            }
        }
    }

    /// (Re)start the periodic balance poll for `address`.
    ///
    /// The task stops itself when the session leaves `Operative` or the
    /// vault address changes, and is aborted on teardown.
    fn start_polling(&self, address: String) {
        self.stop_polling();
        let chain = Arc::clone(&self.chain);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(BALANCE_POLL_SECS));
            interval.tick().await;
            loop {
                interval.tick().await;
                let total = match chain.get_utxos(&address).await {
                    Ok(utxos) => utxos.iter().map(|u| u.satoshis).sum::<u64>(),
                    // Skipped tick; the next one retries naturally.
                    Err(_) => continue,
                };
                let mut guard = state.write().await;
                match &mut *guard {
                    VaultState::Operative(v) if v.contract.address == address => {
                        v.balance = total;
                    }
                    _ => break,
                }
            }
        });
        if let Ok(mut slot) = self.poller.lock() {
            *slot = Some(handle);
        }
    }

    fn stop_polling(&self) {
        if let Ok(mut slot) = self.poller.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl<C, S> Drop for VaultSession<C, S> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.poller.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
