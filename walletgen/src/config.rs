//! Wallet engine configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::crypto::mnemonic::MnemonicStrength;
use crate::error::{Error, Result};

/// Delay between the last wallet being deleted and the context reset
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(3);

/// Wallet engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    /// Directory used by the file-backed store
    pub storage_dir: PathBuf,
    /// Countdown before an emptied context is reset
    pub reset_delay: Duration,
    /// Strength of newly generated mnemonics
    pub mnemonic_strength: MnemonicStrength,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data/wallets"),
            reset_delay: DEFAULT_RESET_DELAY,
            mnemonic_strength: MnemonicStrength::Words12,
        }
    }
}

impl WalletConfig {
    /// Create configuration from environment variables
    ///
    /// * `WALLETGEN_STORAGE_DIR`
    /// * `WALLETGEN_RESET_DELAY_MS`
    /// * `WALLETGEN_MNEMONIC_WORDS` (12 or 24)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`WalletConfig::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("WALLETGEN_STORAGE_DIR").filter(|d| !d.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("WALLETGEN_RESET_DELAY_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("Invalid WALLETGEN_RESET_DELAY_MS {:?}: {}", raw, e))
            })?;
            config.reset_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("WALLETGEN_MNEMONIC_WORDS") {
            config.mnemonic_strength = raw.parse()?;
        }

        Ok(config)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }
}
