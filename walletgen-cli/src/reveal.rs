//! Per-wallet reveal toggles for private key display

use std::collections::HashSet;

use walletgen::{Wallet, WalletId};

/// Placeholder shown instead of a hidden private key
pub const MASKED_KEY: &str = "••••••••••••••••••••••••••••••••••••••••";

/// Set of wallets whose private key is currently shown
#[derive(Debug, Default)]
pub struct RevealSet {
    revealed: HashSet<WalletId>,
}

impl RevealSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the reveal state of `id`, returning the new state
    pub fn toggle(&mut self, id: WalletId) -> bool {
        if self.revealed.remove(&id) {
            false
        } else {
            self.revealed.insert(id);
            true
        }
    }

    pub fn is_revealed(&self, id: WalletId) -> bool {
        self.revealed.contains(&id)
    }

    /// Drop the entry of a deleted wallet
    pub fn forget(&mut self, id: WalletId) {
        self.revealed.remove(&id);
    }

    /// Private key of `wallet` as it should be displayed
    pub fn display_key<'a>(&self, wallet: &'a Wallet) -> &'a str {
        if self.is_revealed(wallet.id()) {
            wallet.private_key()
        } else {
            MASKED_KEY
        }
    }
}
