//! Account management functionality
//!
//! This module provides the wallet record derived for each index and the
//! per-chain store that keeps the ordered wallet list, the mnemonic and the
//! next derivation index in sync with persistence.

mod wallet;
pub mod store;

pub use wallet::*;
pub use store::WalletStore;
