//! Wallet lifecycle: generation, deletion and the auto-reset transition
//!
//! A chain context is `Idle` until its wallet list is emptied after having
//! held at least one wallet. It then enters `PendingReset` and a timer is
//! armed. When the timer fires the persisted state is erased, the context
//! starts over and a single navigation signal is sent. If erasing fails the
//! navigator is told so instead and the context stays pending. Generating a
//! wallet or tearing the controller down before the timer fires cancels it.

mod context;
mod controller;
pub mod navigation;

pub use context::{DeleteOutcome, LifecycleState, WalletContext};
pub use controller::WalletController;
pub use navigation::{ChannelNavigator, NavigationEvent, Navigator, NoopNavigator};
