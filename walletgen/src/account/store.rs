//! Per-chain wallet store
//!
//! Holds the mnemonic, the next derivation index and the ordered wallet list
//! of one chain context. Every mutation is written to the backend before it
//! is committed in memory, so a failed write leaves both sides unchanged.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::crypto::keys::Chain;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, StorageKey};
use super::wallet::{decode_wallets, encode_wallets, Wallet, WalletId};

/// Ordered wallets plus mnemonic and index for one chain
pub struct WalletStore {
    chain: Chain,
    backend: Arc<dyn KeyValueStore>,
    mnemonic: Option<String>,
    next_index: u32,
    wallets: Vec<Wallet>,
}

impl WalletStore {
    /// Create an empty store without touching the backend
    pub fn new(chain: Chain, backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            chain,
            backend,
            mnemonic: None,
            next_index: 0,
            wallets: Vec::new(),
        }
    }

    /// Populate a store from whatever the backend holds for `chain`
    pub fn load(chain: Chain, backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut store = Self::new(chain, backend);

        store.mnemonic = store
            .read(StorageKey::Mnemonic(chain))?
            .filter(|phrase| !phrase.trim().is_empty());

        if let Some(json) = store.read(StorageKey::Wallets(chain))? {
            store.wallets = decode_wallets(chain, &json)?;
        }

        let stored_index = match store.read(StorageKey::CurrentIndex(chain))? {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                Error::Persistence(format!("Invalid {} current index {:?}: {}", chain, raw, e))
            })?,
            None => 0,
        };

        // Never hand out an index that a surviving wallet already uses
        let floor = store
            .wallets
            .iter()
            .map(|w| w.index().saturating_add(1))
            .max()
            .unwrap_or(0);
        if stored_index < floor {
            warn!(
                "Persisted {} index {} is behind existing wallets, continuing from {}",
                chain, stored_index, floor
            );
        }
        store.next_index = stored_index.max(floor);

        info!(
            "Loaded {} context: {} wallets, next index {}, mnemonic {}",
            chain,
            store.wallets.len(),
            store.next_index,
            if store.mnemonic.is_some() { "present" } else { "absent" }
        );
        Ok(store)
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_deref()
    }

    /// Index the next generated wallet will use
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn find(&self, id: WalletId) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.id() == id)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Append a wallet generated at the current index and advance the index.
    ///
    /// `new_mnemonic` carries a phrase created for this generation; it is
    /// persisted together with the wallet.
    pub fn append(&mut self, wallet: Wallet, new_mnemonic: Option<String>) -> Result<()> {
        if wallet.chain() != self.chain {
            return Err(Error::InvalidInput(format!(
                "Cannot store a {} wallet in the {} context",
                wallet.chain(),
                self.chain
            )));
        }
        if wallet.index() != self.next_index {
            return Err(Error::InvalidInput(format!(
                "Wallet index {} does not match next index {}",
                wallet.index(),
                self.next_index
            )));
        }
        if self.find(wallet.id()).is_some() {
            return Err(Error::InvalidInput(format!("Duplicate wallet id: {}", wallet.id())));
        }
        if new_mnemonic.is_some() && self.mnemonic.is_some() {
            return Err(Error::InvalidInput(format!(
                "The {} context already has a mnemonic",
                self.chain
            )));
        }

        let next_index = self.next_index.checked_add(1).ok_or_else(|| {
            Error::KeyDerivation(format!("{} derivation index exhausted", self.chain))
        })?;

        let mut wallets = self.wallets.clone();
        wallets.push(wallet);

        let mut writes = Vec::with_capacity(3);
        if let Some(phrase) = &new_mnemonic {
            writes.push((StorageKey::Mnemonic(self.chain), Some(phrase.clone())));
        }
        writes.push((StorageKey::Wallets(self.chain), Some(encode_wallets(self.chain, &wallets)?)));
        writes.push((StorageKey::CurrentIndex(self.chain), Some(next_index.to_string())));
        self.write_batch(&writes)?;

        if new_mnemonic.is_some() {
            self.mnemonic = new_mnemonic;
        }
        self.wallets = wallets;
        self.next_index = next_index;
        Ok(())
    }

    /// Remove the wallet with `id`; returns `false` without writing if absent
    pub fn remove_by_id(&mut self, id: WalletId) -> Result<bool> {
        let Some(position) = self.wallets.iter().position(|w| w.id() == id) else {
            debug!("No {} wallet with id {}", self.chain, id);
            return Ok(false);
        };

        let mut wallets = self.wallets.clone();
        wallets.remove(position);

        let json = encode_wallets(self.chain, &wallets)?;
        self.write_batch(&[(StorageKey::Wallets(self.chain), Some(json))])?;

        self.wallets = wallets;
        Ok(true)
    }

    /// Erase persisted state, then forget mnemonic, index and wallets
    pub fn clear_all(&mut self) -> Result<()> {
        self.erase()?;

        self.mnemonic = None;
        self.next_index = 0;
        self.wallets.clear();
        Ok(())
    }

    /// Write all three keys from in-memory state
    pub fn save(&self) -> Result<()> {
        let writes = [
            (StorageKey::Mnemonic(self.chain), self.mnemonic.clone()),
            (StorageKey::Wallets(self.chain), Some(encode_wallets(self.chain, &self.wallets)?)),
            (StorageKey::CurrentIndex(self.chain), Some(self.next_index.to_string())),
        ];
        self.write_batch(&writes)
    }

    /// Remove all three keys from the backend
    pub fn erase(&self) -> Result<()> {
        let writes = StorageKey::all(self.chain).map(|key| (key, None));
        self.write_batch(&writes)?;
        info!("Erased persisted {} context", self.chain);
        Ok(())
    }

    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        self.backend.get(&key.to_storage_key())
    }

    fn apply(&self, key: StorageKey, value: Option<&str>) -> Result<()> {
        let key = key.to_storage_key();
        match value {
            Some(value) => self.backend.set(&key, value),
            None => self.backend.remove(&key),
        }
    }

    /// Apply writes in order; on failure restore the keys already written
    fn write_batch(&self, writes: &[(StorageKey, Option<String>)]) -> Result<()> {
        let mut applied: Vec<(StorageKey, Option<String>)> = Vec::with_capacity(writes.len());

        for (key, value) in writes {
            let result = self
                .read(*key)
                .and_then(|previous| self.apply(*key, value.as_deref()).map(|_| previous));

            match result {
                Ok(previous) => applied.push((*key, previous)),
                Err(e) => {
                    warn!("Persisting {} failed: {}", key.to_storage_key(), e);
                    for (key, previous) in applied.iter().rev() {
                        if let Err(rollback) = self.apply(*key, previous.as_deref()) {
                            warn!("Rollback of {} failed: {}", key.to_storage_key(), rollback);
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}
