//! Tests for the wallet lifecycle and reset transition

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use walletgen::crypto::mnemonic::validate_mnemonic;
use walletgen::lifecycle::{ChannelNavigator, NavigationEvent, NoopNavigator};
use walletgen::storage::{FileStore, KeyValueStore, MemoryStore};
use walletgen::{
    Chain, DeleteOutcome, Error, LifecycleState, WalletConfig, WalletController, WalletId,
};

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn controller(
    chain: Chain,
    backend: Arc<MemoryStore>,
) -> (WalletController, UnboundedReceiver<NavigationEvent>) {
    let (navigator, rx) = ChannelNavigator::new();
    let controller =
        WalletController::load(chain, backend, &WalletConfig::default(), Arc::new(navigator)).unwrap();
    (controller, rx)
}

#[tokio::test(start_paused = true)]
async fn test_first_generation_on_empty_state() {
    let backend = Arc::new(MemoryStore::new());
    let (ctl, _rx) = controller(Chain::Ethereum, backend.clone());

    let wallet = ctl.generate().await.unwrap();

    let mnemonic = ctl.mnemonic().await.unwrap();
    let words = mnemonic.split_whitespace().count();
    assert!(words == 12 || words == 24);
    assert!(validate_mnemonic(&mnemonic).is_ok());

    assert_eq!(wallet.index(), 0);
    assert!(wallet.address().starts_with("0x"));
    assert_eq!(wallet.address().len(), 42);
    assert!(wallet.address()[2..].chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(ctl.next_index().await, 1);

    assert_eq!(backend.get("ethereum-mnemonic").unwrap(), Some(mnemonic));
    assert!(backend.get("ethereum-wallets").unwrap().is_some());
    assert_eq!(backend.get("ethereum-currentIndex").unwrap().as_deref(), Some("1"));
}

#[tokio::test(start_paused = true)]
async fn test_index_monotonicity_and_unique_ids() {
    let (ctl, _rx) = controller(Chain::Solana, Arc::new(MemoryStore::new()));

    for _ in 0..5 {
        ctl.generate().await.unwrap();
    }

    let wallets = ctl.wallets().await;
    assert_eq!(ctl.next_index().await, 5);
    for (i, wallet) in wallets.iter().enumerate() {
        assert_eq!(wallet.index(), i as u32);
    }

    let ids: HashSet<WalletId> = wallets.iter().map(|w| w.id()).collect();
    assert_eq!(ids.len(), wallets.len());
}

#[tokio::test(start_paused = true)]
async fn test_existing_mnemonic_is_reused() {
    let backend = Arc::new(MemoryStore::new());
    backend.set("solana-mnemonic", ABANDON).unwrap();
    let (ctl, _rx) = controller(Chain::Solana, backend.clone());

    let wallet = ctl.generate().await.unwrap();

    assert_eq!(ctl.mnemonic().await.as_deref(), Some(ABANDON));
    let seed = walletgen::crypto::mnemonic_to_seed(ABANDON, None).unwrap();
    assert_eq!(wallet.address(), Chain::Solana.derive(&seed, 0).unwrap().address);
}

#[tokio::test(start_paused = true)]
async fn test_delete_missing_id_changes_nothing() {
    let (ctl, mut rx) = controller(Chain::Ethereum, Arc::new(MemoryStore::new()));
    ctl.generate().await.unwrap();
    let before = ctl.wallets().await;

    let outcome = ctl.delete(WalletId::new()).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::NotFound);
    assert_eq!(ctl.wallets().await, before);
    assert_eq!(ctl.next_index().await, 1);
    assert_eq!(ctl.state().await, LifecycleState::Idle);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_reset_fires_after_last_delete() {
    let backend = Arc::new(MemoryStore::new());
    let (ctl, mut rx) = controller(Chain::Ethereum, backend.clone());

    let first = ctl.generate().await.unwrap();
    let second = ctl.generate().await.unwrap();

    assert_eq!(ctl.delete(first.id()).await.unwrap(), DeleteOutcome::Removed);
    assert_eq!(ctl.state().await, LifecycleState::Idle);
    assert_eq!(ctl.delete(second.id()).await.unwrap(), DeleteOutcome::ResetScheduled);
    assert_eq!(ctl.state().await, LifecycleState::PendingReset);

    // Still counting down
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ctl.state().await, LifecycleState::PendingReset);
    assert!(ctl.mnemonic().await.is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ctl.state().await, LifecycleState::Idle);
    assert_eq!(ctl.mnemonic().await, None);
    assert_eq!(ctl.next_index().await, 0);
    assert!(ctl.wallets().await.is_empty());
    assert!(!ctl.has_had_wallets().await);
    assert!(backend.is_empty(), "left over keys: {:?}", backend.keys());

    assert_eq!(rx.try_recv(), Ok(NavigationEvent::Home { chain: Chain::Ethereum }));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_generate_cancels_pending_reset() {
    let backend = Arc::new(MemoryStore::new());
    let (ctl, mut rx) = controller(Chain::Solana, backend.clone());

    let first = ctl.generate().await.unwrap();
    let second = ctl.generate().await.unwrap();
    let mnemonic = ctl.mnemonic().await;
    ctl.delete(first.id()).await.unwrap();
    ctl.delete(second.id()).await.unwrap();
    assert_eq!(ctl.state().await, LifecycleState::PendingReset);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let third = ctl.generate().await.unwrap();

    assert_eq!(third.index(), 2);
    assert_eq!(ctl.state().await, LifecycleState::Idle);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(ctl.mnemonic().await, mnemonic);
    assert_eq!(ctl.wallets().await, vec![third]);
    assert_eq!(backend.get("solana-currentIndex").unwrap().as_deref(), Some("3"));
}

#[tokio::test(start_paused = true)]
async fn test_second_countdown_after_cancel() {
    let (ctl, mut rx) = controller(Chain::Ethereum, Arc::new(MemoryStore::new()));

    let first = ctl.generate().await.unwrap();
    ctl.delete(first.id()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let second = ctl.generate().await.unwrap();
    assert_eq!(ctl.delete(second.id()).await.unwrap(), DeleteOutcome::ResetScheduled);

    // The first timer would have fired here had it not been cancelled
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ctl.state().await, LifecycleState::PendingReset);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ctl.state().await, LifecycleState::Idle);
    assert_eq!(rx.try_recv(), Ok(NavigationEvent::Home { chain: Chain::Ethereum }));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_reset() {
    let backend = Arc::new(MemoryStore::new());
    let (ctl, mut rx) = controller(Chain::Ethereum, backend.clone());

    let wallet = ctl.generate().await.unwrap();
    ctl.delete(wallet.id()).await.unwrap();
    ctl.shutdown().await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(ctl.state().await, LifecycleState::Idle);
    assert!(backend.get("ethereum-mnemonic").unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_controller_cancels_pending_reset() {
    let backend = Arc::new(MemoryStore::new());
    let (ctl, mut rx) = controller(Chain::Ethereum, backend.clone());

    let wallet = ctl.generate().await.unwrap();
    ctl.delete(wallet.id()).await.unwrap();
    drop(ctl);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rx.try_recv().is_err());
    assert!(backend.get("ethereum-mnemonic").unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_loaded_wallets_arm_reset_on_delete() {
    let backend = Arc::new(MemoryStore::new());
    let (ctl, _rx) = controller(Chain::Solana, backend.clone());
    let wallet = ctl.generate().await.unwrap();
    drop(ctl);

    let (reloaded, mut rx) = controller(Chain::Solana, backend.clone());
    assert!(reloaded.has_had_wallets().await);
    assert_eq!(reloaded.wallets().await, vec![wallet.clone()]);
    assert_eq!(reloaded.next_index().await, 1);

    assert_eq!(reloaded.delete(wallet.id()).await.unwrap(), DeleteOutcome::ResetScheduled);
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(rx.try_recv(), Ok(NavigationEvent::Home { chain: Chain::Solana }));
}

#[tokio::test(start_paused = true)]
async fn test_empty_load_does_not_arm_reset() {
    let backend = Arc::new(MemoryStore::new());
    backend.set("ethereum-mnemonic", ABANDON).unwrap();
    backend.set("ethereum-wallets", "[]").unwrap();
    backend.set("ethereum-currentIndex", "4").unwrap();

    let (ctl, _rx) = controller(Chain::Ethereum, backend);
    assert!(!ctl.has_had_wallets().await);

    let wallet = ctl.generate().await.unwrap();
    assert_eq!(wallet.index(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_corrupted_mnemonic_is_surfaced() {
    let backend = Arc::new(MemoryStore::new());
    backend.set("ethereum-mnemonic", "not a real phrase at all").unwrap();
    let (ctl, _rx) = controller(Chain::Ethereum, backend.clone());

    let result = ctl.generate().await;

    assert!(matches!(result, Err(Error::InvalidMnemonic(_))));
    assert_eq!(ctl.mnemonic().await.as_deref(), Some("not a real phrase at all"));
    assert!(ctl.wallets().await.is_empty());
    assert_eq!(ctl.next_index().await, 0);
    assert_eq!(backend.get("ethereum-wallets").unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_chains_are_isolated() {
    let backend = Arc::new(MemoryStore::new());
    let (eth, _eth_rx) = controller(Chain::Ethereum, backend.clone());
    let (sol, mut sol_rx) = controller(Chain::Solana, backend.clone());

    let eth_wallet = eth.generate().await.unwrap();
    sol.generate().await.unwrap();
    sol.generate().await.unwrap();

    assert_ne!(eth.mnemonic().await, sol.mnemonic().await);
    assert_eq!(eth.next_index().await, 1);
    assert_eq!(sol.next_index().await, 2);

    eth.delete(eth_wallet.id()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(sol.wallets().await.len(), 2);
    assert!(backend.get("solana-mnemonic").unwrap().is_some());
    assert_eq!(backend.get("ethereum-mnemonic").unwrap(), None);
    assert_eq!(sol_rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_file_backed_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = WalletConfig::default().with_storage_dir(dir.path());
    let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.storage_dir).unwrap());

    let ctl = WalletController::load(Chain::Ethereum, backend.clone(), &config, Arc::new(NoopNavigator)).unwrap();
    ctl.generate().await.unwrap();
    ctl.generate().await.unwrap();
    let wallets = ctl.wallets().await;
    let mnemonic = ctl.mnemonic().await;
    drop(ctl);

    let reloaded = WalletController::load(Chain::Ethereum, backend, &config, Arc::new(NoopNavigator)).unwrap();
    assert_eq!(reloaded.wallets().await, wallets);
    assert_eq!(reloaded.mnemonic().await, mnemonic);
    assert_eq!(reloaded.next_index().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_custom_reset_delay() {
    let (navigator, mut rx) = ChannelNavigator::new();
    let config = WalletConfig::default().with_reset_delay(Duration::from_millis(500));
    let ctl = WalletController::load(
        Chain::Solana,
        Arc::new(MemoryStore::new()),
        &config,
        Arc::new(navigator),
    )
    .unwrap();

    let wallet = ctl.generate().await.unwrap();
    ctl.delete(wallet.id()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(rx.try_recv(), Ok(NavigationEvent::Home { chain: Chain::Solana }));
}

/// Memory backend whose writes or removals can be switched off
#[derive(Default)]
struct FailingStore {
    inner: MemoryStore,
    fail_set: AtomicBool,
    fail_remove: AtomicBool,
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> walletgen::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> walletgen::Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Error::Persistence(format!("cannot write {}", key)));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> walletgen::Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(Error::Persistence(format!("cannot remove {}", key)));
        }
        self.inner.remove(key)
    }
}

fn failing_controller(
    chain: Chain,
    backend: Arc<FailingStore>,
) -> (WalletController, UnboundedReceiver<NavigationEvent>) {
    let (navigator, rx) = ChannelNavigator::new();
    let controller =
        WalletController::load(chain, backend, &WalletConfig::default(), Arc::new(navigator)).unwrap();
    (controller, rx)
}

#[tokio::test(start_paused = true)]
async fn test_failed_delete_keeps_wallet_and_schedules_nothing() {
    let backend = Arc::new(FailingStore::default());
    let (ctl, mut rx) = failing_controller(Chain::Ethereum, backend.clone());
    let wallet = ctl.generate().await.unwrap();
    let persisted = backend.inner.get("ethereum-wallets").unwrap();

    backend.fail_set.store(true, Ordering::SeqCst);
    let result = ctl.delete(wallet.id()).await;

    assert!(matches!(result, Err(Error::Persistence(_))));
    assert_eq!(ctl.wallets().await, vec![wallet]);
    assert_eq!(ctl.state().await, LifecycleState::Idle);
    assert_eq!(backend.inner.get("ethereum-wallets").unwrap(), persisted);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(ctl.state().await, LifecycleState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_reset_is_reported_and_recoverable() {
    let backend = Arc::new(FailingStore::default());
    let (ctl, mut rx) = failing_controller(Chain::Ethereum, backend.clone());
    let wallet = ctl.generate().await.unwrap();

    backend.fail_remove.store(true, Ordering::SeqCst);
    assert_eq!(ctl.delete(wallet.id()).await.unwrap(), DeleteOutcome::ResetScheduled);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(ctl.state().await, LifecycleState::PendingReset);
    assert!(ctl.mnemonic().await.is_some());
    assert!(backend.inner.get("ethereum-mnemonic").unwrap().is_some());

    match rx.try_recv() {
        Ok(NavigationEvent::ResetFailed { chain, error }) => {
            assert_eq!(chain, Chain::Ethereum);
            assert!(matches!(error, Error::Persistence(_)));
        }
        other => panic!("expected a failed reset, got {:?}", other),
    }
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    // Nothing is re-armed after the failure
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    backend.fail_remove.store(false, Ordering::SeqCst);
    let next = ctl.generate().await.unwrap();
    assert_eq!(next.index(), 1);
    assert_eq!(ctl.state().await, LifecycleState::Idle);
}
