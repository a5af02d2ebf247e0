//! Chain context state machine
//!
//! `WalletContext` owns everything one chain needs: the store, the
//! "has held wallets" flag and the pending reset, if any. It never spawns
//! work itself; [`WalletController`](super::WalletController) schedules the
//! reset timer and hands the task back through [`WalletContext::arm_reset`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::account::{Wallet, WalletId, WalletStore};
use crate::crypto::keys::Chain;
use crate::crypto::mnemonic::{ensure_mnemonic, mnemonic_to_seed, MnemonicStrength};
use crate::error::Result;
use crate::storage::KeyValueStore;

/// Lifecycle state of a chain context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No reset pending
    Idle,
    /// The list was emptied after holding wallets; a reset is counting down
    PendingReset,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No wallet carried the id; nothing changed
    NotFound,
    /// The wallet was removed and others remain (or no reset applies)
    Removed,
    /// The last wallet was removed and the context entered `PendingReset`
    ResetScheduled,
}

impl DeleteOutcome {
    pub fn removed(&self) -> bool {
        !matches!(self, DeleteOutcome::NotFound)
    }
}

struct PendingReset {
    token: u64,
    handle: JoinHandle<()>,
}

/// State of one chain: store, history flag and pending reset
pub struct WalletContext {
    store: WalletStore,
    strength: MnemonicStrength,
    state: LifecycleState,
    has_had_wallets: bool,
    pending: Option<PendingReset>,
    next_token: u64,
}

impl WalletContext {
    /// Wrap an already loaded store
    pub fn new(store: WalletStore, strength: MnemonicStrength) -> Self {
        let has_had_wallets = !store.is_empty();
        Self {
            store,
            strength,
            state: LifecycleState::Idle,
            has_had_wallets,
            pending: None,
            next_token: 0,
        }
    }

    /// Load the persisted state of `chain`
    pub fn load(chain: Chain, backend: Arc<dyn KeyValueStore>, strength: MnemonicStrength) -> Result<Self> {
        Ok(Self::new(WalletStore::load(chain, backend)?, strength))
    }

    pub fn chain(&self) -> Chain {
        self.store.chain()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn has_had_wallets(&self) -> bool {
        self.has_had_wallets
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    /// Derive, store and persist the wallet at the current index.
    ///
    /// A pending reset is cancelled only once the new wallet is committed.
    pub fn generate(&mut self) -> Result<Wallet> {
        let chain = self.chain();
        let created = self.store.mnemonic().is_none();
        let phrase = ensure_mnemonic(self.store.mnemonic(), self.strength)?;

        let seed = mnemonic_to_seed(&phrase, None)?;
        let index = self.store.next_index();
        let wallet = Wallet::from_derived(chain.derive(&seed, index)?, index);

        self.store.append(wallet.clone(), created.then_some(phrase))?;

        if created {
            info!("Created new {} mnemonic", chain);
        }
        info!("Generated {} wallet {} at index {}", chain, wallet.id(), index);

        self.has_had_wallets = true;
        if self.state == LifecycleState::PendingReset {
            self.cancel_reset();
            info!("New {} wallet arrived, pending reset cancelled", chain);
        }

        Ok(wallet)
    }

    /// Remove a wallet by id and persist.
    ///
    /// Returns [`DeleteOutcome::ResetScheduled`] when the caller must arm the
    /// reset timer.
    pub fn delete(&mut self, id: WalletId) -> Result<DeleteOutcome> {
        let chain = self.chain();
        if !self.store.remove_by_id(id)? {
            return Ok(DeleteOutcome::NotFound);
        }
        info!("Deleted {} wallet {}", chain, id);

        if self.has_had_wallets && self.store.is_empty() && self.state == LifecycleState::Idle {
            self.state = LifecycleState::PendingReset;
            info!("All {} wallets deleted, reset pending", chain);
            return Ok(DeleteOutcome::ResetScheduled);
        }

        Ok(DeleteOutcome::Removed)
    }

    /// Reserve a token for the reset task about to be spawned
    pub(crate) fn reserve_reset_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Record the spawned reset task so it can be cancelled later
    pub(crate) fn arm_reset(&mut self, token: u64, handle: JoinHandle<()>) {
        if let Some(previous) = self.pending.replace(PendingReset { token, handle }) {
            warn!("Replacing an outstanding {} reset task", self.chain());
            previous.handle.abort();
        }
    }

    /// Commit the reset scheduled under `token`.
    ///
    /// Returns `None` for a stale token (cancelled or superseded reset).
    /// Otherwise returns the erase result: on `Ok` the context starts over and
    /// the navigation signal must be sent, on `Err` it stays `PendingReset`
    /// with nothing armed until the next generate.
    pub(crate) fn reset_fires(&mut self, token: u64) -> Option<Result<()>> {
        let armed = self.state == LifecycleState::PendingReset
            && self.pending.as_ref().map(|p| p.token) == Some(token);
        if !armed {
            return None;
        }

        // The running task is the one holding this handle: detach, don't abort
        self.pending = None;

        let chain = self.chain();
        let result = self.store.clear_all();
        match &result {
            Ok(()) => {
                self.has_had_wallets = false;
                self.state = LifecycleState::Idle;
                info!("Reset {} context", chain);
            }
            Err(e) => error!("Failed to reset {} context: {}", chain, e),
        }
        Some(result)
    }

    /// Abort a pending reset, if any, and return to `Idle`
    pub fn cancel_reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
        self.state = LifecycleState::Idle;
    }
}

impl Drop for WalletContext {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}
