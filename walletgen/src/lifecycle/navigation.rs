//! Navigation signal issued when a chain context has been reset

use tokio::sync::mpsc;
use tracing::warn;

use crate::crypto::keys::Chain;
use crate::error::Error;

/// Outcome of a reset countdown, as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The context was reset; return to the top-level view
    Home { chain: Chain },
    /// Erasing the context failed; it stays pending until the next generate
    ResetFailed { chain: Chain, error: Error },
}

impl NavigationEvent {
    pub fn chain(&self) -> Chain {
        match self {
            NavigationEvent::Home { chain } | NavigationEvent::ResetFailed { chain, .. } => *chain,
        }
    }
}

/// Receiver of the fire-and-forget navigation signal
pub trait Navigator: Send + Sync {
    /// Called exactly once per completed reset
    fn navigate_home(&self, chain: Chain);

    /// Called when a reset fired but could not erase the persisted state
    fn reset_failed(&self, _chain: Chain, _error: &Error) {}
}

/// Navigator for callers that do not care about the signal
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_home(&self, _chain: Chain) {}
}

/// Forwards navigation signals over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: NavigationEvent) {
        let chain = event.chain();
        if self.tx.send(event).is_err() {
            warn!("Navigation signal for {} dropped: receiver closed", chain);
        }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate_home(&self, chain: Chain) {
        self.send(NavigationEvent::Home { chain });
    }

    fn reset_failed(&self, chain: Chain, error: &Error) {
        self.send(NavigationEvent::ResetFailed { chain, error: error.clone() });
    }
}
