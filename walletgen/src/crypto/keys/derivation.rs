//! Common key derivation functionality

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::crypto::mnemonic::Seed;
use crate::error::{Error, Result};

/// BIP-32 hardened index offset
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP-32 allows seeds between 128 and 512 bits
const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// Supported chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Ethereum and EVM compatible chains
    Ethereum,
    /// Solana
    Solana,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ethereum, Chain::Solana];

    /// Name used to namespace persisted keys
    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
        }
    }

    /// SLIP-44 coin type
    pub fn coin_type(&self) -> u32 {
        match self {
            Chain::Ethereum => 60,
            Chain::Solana => 501,
        }
    }

    /// JSON field that carries the displayed address of a persisted wallet
    pub fn address_field(&self) -> &'static str {
        match self {
            Chain::Ethereum => "address",
            Chain::Solana => "publicKey",
        }
    }

    /// Derivation path for the wallet at `index`.
    ///
    /// The index sits at the account level: `m/44'/coin'/index'/0'`.
    pub fn derivation_path(&self, index: u32) -> String {
        format!("m/44'/{}'/{}'/0'", self.coin_type(), index)
    }

    /// Derive the wallet key material at `index`
    pub fn derive(&self, seed: &Seed, index: u32) -> Result<DerivedKey> {
        match self {
            Chain::Ethereum => super::ethereum::derive_ethereum(seed.as_bytes(), index),
            Chain::Solana => super::solana::derive_solana(seed.as_bytes(), index),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            "solana" | "sol" => Ok(Chain::Solana),
            other => Err(Error::InvalidInput(format!("Unknown chain: {}", other))),
        }
    }
}

/// Key material produced for one derivation index
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    /// Chain the key belongs to
    pub chain: Chain,
    /// Checksummed address (Ethereum) or base58 public key (Solana)
    pub address: String,
    /// Displayable private key: `0x` hex (Ethereum) or base58 keypair (Solana)
    pub private_key: String,
    /// Raw public key bytes, 65 bytes uncompressed (Ethereum) or 32 bytes (Solana)
    pub public_key: Vec<u8>,
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("chain", &self.chain)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Parse a BIP-32 derivation path
pub fn parse_derivation_path(path: &str) -> Result<Vec<u32>> {
    if !path.starts_with("m/") {
        return Err(Error::KeyDerivation(format!("Invalid derivation path: {}", path)));
    }

    let components = path.trim_start_matches("m/").split('/');
    let mut result = Vec::new();

    for component in components {
        if component.is_empty() {
            continue;
        }

        let hardened = component.ends_with('\'') || component.ends_with('h');
        let raw = component.trim_end_matches(['\'', 'h']);
        let index = raw.parse::<u32>()
            .ok()
            .filter(|index| *index < HARDENED_OFFSET)
            .ok_or_else(|| Error::KeyDerivation(format!("Invalid derivation path component: {}", component)))?;

        result.push(if hardened { HARDENED_OFFSET + index } else { index });
    }

    Ok(result)
}

/// Reject seeds outside the BIP-32 length bounds
pub(crate) fn check_seed(seed: &[u8]) -> Result<()> {
    if seed.len() < MIN_SEED_LEN || seed.len() > MAX_SEED_LEN {
        return Err(Error::MalformedDerivedSeed(format!(
            "Seed must be {}..={} bytes, got {}",
            MIN_SEED_LEN,
            MAX_SEED_LEN,
            seed.len()
        )));
    }
    Ok(())
}

/// Reject derivation indices that would collide with the hardened range
pub(crate) fn check_index(index: u32) -> Result<()> {
    if index >= HARDENED_OFFSET {
        return Err(Error::KeyDerivation(format!("Derivation index out of range: {}", index)));
    }
    Ok(())
}

/// HMAC-SHA512 split into (key, chain code)
pub(crate) fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<([u8; 32], [u8; 32])> {
    let mut hmac = Hmac::<Sha512>::new_from_slice(key)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(data);
    let result = hmac.finalize().into_bytes();

    let mut left = [0u8; 32];
    let mut right = [0u8; 32];

    left.copy_from_slice(&result[0..32]);
    right.copy_from_slice(&result[32..64]);

    Ok((left, right))
}
