//! Key-value persistence for chain contexts
//!
//! Every chain context owns three keys, namespaced by chain name so that
//! Ethereum and Solana state never overlap. Backends are synchronous and
//! fail fast: any failure surfaces as [`Error::Persistence`].
//!
//! [`Error::Persistence`]: crate::error::Error::Persistence

pub mod memory;
pub mod file;

use crate::crypto::keys::Chain;
use crate::error::Result;

pub use memory::MemoryStore;
pub use file::FileStore;

/// Logical keys of a chain context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Raw mnemonic phrase
    Mnemonic(Chain),
    /// JSON array of wallet records
    Wallets(Chain),
    /// Next derivation index as a decimal string
    CurrentIndex(Chain),
}

impl StorageKey {
    /// All keys belonging to `chain`
    pub fn all(chain: Chain) -> [StorageKey; 3] {
        [
            StorageKey::Mnemonic(chain),
            StorageKey::Wallets(chain),
            StorageKey::CurrentIndex(chain),
        ]
    }

    /// Backend key string, e.g. `ethereum-currentIndex`
    pub fn to_storage_key(&self) -> String {
        match self {
            StorageKey::Mnemonic(chain) => format!("{}-mnemonic", chain.name()),
            StorageKey::Wallets(chain) => format!("{}-wallets", chain.name()),
            StorageKey::CurrentIndex(chain) => format!("{}-currentIndex", chain.name()),
        }
    }
}

/// String key-value backend
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a key, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
