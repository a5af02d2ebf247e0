//! Async front of a chain context with the cancellable reset timer

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::account::{Wallet, WalletId};
use crate::config::WalletConfig;
use crate::crypto::keys::Chain;
use crate::error::Result;
use crate::storage::KeyValueStore;
use super::context::{DeleteOutcome, LifecycleState, WalletContext};
use super::navigation::Navigator;

/// Drives generate/delete for one chain and owns its reset timer.
///
/// Must be used inside a tokio runtime. Cloning shares the same context.
#[derive(Clone)]
pub struct WalletController {
    chain: Chain,
    context: Arc<Mutex<WalletContext>>,
    navigator: Arc<dyn Navigator>,
    reset_delay: Duration,
}

impl WalletController {
    pub fn new(context: WalletContext, navigator: Arc<dyn Navigator>, reset_delay: Duration) -> Self {
        Self {
            chain: context.chain(),
            context: Arc::new(Mutex::new(context)),
            navigator,
            reset_delay,
        }
    }

    /// Load the persisted context of `chain` from `backend`
    pub fn load(
        chain: Chain,
        backend: Arc<dyn KeyValueStore>,
        config: &WalletConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let context = WalletContext::load(chain, backend, config.mnemonic_strength)?;
        Ok(Self::new(context, navigator, config.reset_delay))
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn reset_delay(&self) -> Duration {
        self.reset_delay
    }

    /// Generate the next wallet; cancels a pending reset on success
    pub async fn generate(&self) -> Result<Wallet> {
        self.context.lock().await.generate()
    }

    /// Delete a wallet; arms the reset timer when the last wallet goes
    pub async fn delete(&self, id: WalletId) -> Result<DeleteOutcome> {
        let mut context = self.context.lock().await;
        let outcome = context.delete(id)?;

        if outcome == DeleteOutcome::ResetScheduled {
            let token = context.reserve_reset_token();
            let handle = tokio::spawn(run_reset(
                Arc::downgrade(&self.context),
                self.navigator.clone(),
                self.reset_delay,
                token,
            ));
            context.arm_reset(token, handle);
            debug!("Armed {} reset in {:?}", self.chain, self.reset_delay);
        }

        Ok(outcome)
    }

    /// Teardown: cancel any pending reset so nothing fires afterwards
    pub async fn shutdown(&self) {
        let mut context = self.context.lock().await;
        if context.state() == LifecycleState::PendingReset {
            debug!("Cancelling {} reset on shutdown", self.chain);
        }
        context.cancel_reset();
    }

    pub async fn state(&self) -> LifecycleState {
        self.context.lock().await.state()
    }

    pub async fn has_had_wallets(&self) -> bool {
        self.context.lock().await.has_had_wallets()
    }

    /// Snapshot of the wallet list in derivation order
    pub async fn wallets(&self) -> Vec<Wallet> {
        self.context.lock().await.store().wallets().to_vec()
    }

    pub async fn wallet(&self, id: WalletId) -> Option<Wallet> {
        self.context.lock().await.store().find(id).cloned()
    }

    pub async fn mnemonic(&self) -> Option<String> {
        self.context.lock().await.store().mnemonic().map(str::to_string)
    }

    pub async fn next_index(&self) -> u32 {
        self.context.lock().await.store().next_index()
    }
}

/// Body of the reset timer task
async fn run_reset(
    context: Weak<Mutex<WalletContext>>,
    navigator: Arc<dyn Navigator>,
    delay: Duration,
    token: u64,
) {
    tokio::time::sleep(delay).await;

    let Some(context) = context.upgrade() else {
        return;
    };

    let (chain, fired) = {
        let mut context = context.lock().await;
        (context.chain(), context.reset_fires(token))
    };

    match fired {
        Some(Ok(())) => navigator.navigate_home(chain),
        Some(Err(e)) => navigator.reset_failed(chain, &e),
        None => {}
    }
}
