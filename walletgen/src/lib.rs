//! Walletgen Core - deterministic multi-chain wallet derivation
//!
//! This library derives an ordered, reproducible sequence of Ethereum and
//! Solana key pairs from a single BIP-39 mnemonic per chain, persists them
//! through a pluggable key-value backend, and manages the wallet lifecycle
//! including the automatic reset once every wallet has been deleted.

pub mod error;
pub mod config;
pub mod crypto;
pub mod account;
pub mod storage;
pub mod lifecycle;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use config::WalletConfig;
pub use crypto::keys::Chain;
pub use account::{Wallet, WalletId, WalletStore};
pub use lifecycle::{DeleteOutcome, LifecycleState, WalletContext, WalletController};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
