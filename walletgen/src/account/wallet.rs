//! Wallet implementation

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::crypto::keys::{Chain, DerivedKey};

/// Process-unique wallet identifier, independent of the derivation index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    /// Allocate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for WalletId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| Error::InvalidInput(format!("Invalid wallet id {}: {}", s, e)))
    }
}

/// A wallet derived from the chain context's mnemonic
#[derive(Clone, PartialEq, Eq)]
pub struct Wallet {
    id: WalletId,
    chain: Chain,
    address: String,
    private_key: String,
    index: u32,
}

impl Wallet {
    /// Create a wallet record for key material derived at `index`
    pub fn from_derived(key: DerivedKey, index: u32) -> Self {
        Self {
            id: WalletId::new(),
            chain: key.chain,
            address: key.address,
            private_key: key.private_key,
            index,
        }
    }

    /// Get the wallet's ID
    pub fn id(&self) -> WalletId {
        self.id
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Checksummed address (Ethereum) or base58 public key (Solana)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Displayable private key material
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Derivation index this wallet was generated at
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Derivation path this wallet was generated at
    pub fn derivation_path(&self) -> String {
        self.chain.derivation_path(self.index)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EthereumRecord {
    id: WalletId,
    address: String,
    private_key: String,
    index: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolanaRecord {
    id: WalletId,
    public_key: String,
    private_key: String,
    index: u32,
}

/// Serialize a wallet list as the persisted JSON array
pub fn encode_wallets(chain: Chain, wallets: &[Wallet]) -> Result<String> {
    let encoded = match chain {
        Chain::Ethereum => {
            let records: Vec<_> = wallets
                .iter()
                .map(|w| EthereumRecord {
                    id: w.id,
                    address: w.address.clone(),
                    private_key: w.private_key.clone(),
                    index: w.index,
                })
                .collect();
            serde_json::to_string(&records)
        }
        Chain::Solana => {
            let records: Vec<_> = wallets
                .iter()
                .map(|w| SolanaRecord {
                    id: w.id,
                    public_key: w.address.clone(),
                    private_key: w.private_key.clone(),
                    index: w.index,
                })
                .collect();
            serde_json::to_string(&records)
        }
    };

    encoded.map_err(|e| Error::Persistence(format!("Failed to serialize {} wallets: {}", chain, e)))
}

/// Parse the persisted JSON array back into wallets, preserving order
///
/// Every record's `id` must be a UUID string. Records keyed by anything else,
/// such as numeric timestamp ids, are not migrated: the whole list is
/// rejected with [`Error::Persistence`] and the context fails to load.
pub fn decode_wallets(chain: Chain, json: &str) -> Result<Vec<Wallet>> {
    let parse_error = |e: serde_json::Error| {
        Error::Persistence(format!("Failed to parse {} wallets: {}", chain, e))
    };

    let wallets: Vec<Wallet> = match chain {
        Chain::Ethereum => serde_json::from_str::<Vec<EthereumRecord>>(json)
            .map_err(parse_error)?
            .into_iter()
            .map(|r| Wallet { id: r.id, chain, address: r.address, private_key: r.private_key, index: r.index })
            .collect(),
        Chain::Solana => serde_json::from_str::<Vec<SolanaRecord>>(json)
            .map_err(parse_error)?
            .into_iter()
            .map(|r| Wallet { id: r.id, chain, address: r.public_key, private_key: r.private_key, index: r.index })
            .collect(),
    };

    let mut seen = HashSet::with_capacity(wallets.len());
    if let Some(duplicate) = wallets.iter().find(|w| !seen.insert(w.id)) {
        return Err(Error::Persistence(format!(
            "Duplicate wallet id in persisted {} wallets: {}",
            chain, duplicate.id
        )));
    }

    Ok(wallets)
}
