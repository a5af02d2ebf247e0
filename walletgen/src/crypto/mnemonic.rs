//! Mnemonic phrase generation and handling

use std::fmt;
use std::str::FromStr;

use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use crate::error::{Error, Result};

/// Length of a BIP-39 seed in bytes
pub const SEED_LEN: usize = 64;

/// Supported mnemonic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MnemonicStrength {
    /// 12 words (128 bits)
    #[default]
    Words12,
    /// 24 words (256 bits)
    Words24,
}

impl MnemonicStrength {
    /// Get entropy length in bytes
    fn entropy_bytes(&self) -> usize {
        match self {
            Self::Words12 => 16, // 128 bits = 16 bytes
            Self::Words24 => 32, // 256 bits = 32 bytes
        }
    }

    /// Number of words in a phrase of this strength
    pub fn word_count(&self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words24 => 24,
        }
    }
}

impl FromStr for MnemonicStrength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "12" => Ok(Self::Words12),
            "24" => Ok(Self::Words24),
            other => Err(Error::Config(format!(
                "Unsupported mnemonic word count: {} (expected 12 or 24)",
                other
            ))),
        }
    }
}

/// A 64-byte BIP-39 seed.
///
/// Deliberately has no `Display` and a redacted `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Wrap raw seed bytes
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// Generate a new random mnemonic phrase with the specified strength
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<String> {
    let mut entropy = vec![0u8; strength.entropy_bytes()];
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

    Ok(mnemonic.to_string())
}

/// Return `existing` unchanged when it holds a phrase, otherwise generate a new one.
///
/// A live mnemonic is never replaced, even if it fails validation; that is
/// reported later by [`mnemonic_to_seed`].
pub fn ensure_mnemonic(existing: Option<&str>, strength: MnemonicStrength) -> Result<String> {
    match existing {
        Some(phrase) if !phrase.trim().is_empty() => Ok(phrase.to_string()),
        _ => generate_mnemonic(strength),
    }
}

/// Validate a mnemonic phrase
pub fn validate_mnemonic(phrase: &str) -> Result<()> {
    Mnemonic::parse_normalized(phrase)
        .map(|_| ())
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))
}

/// Generate a seed from a mnemonic phrase and optional passphrase
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>) -> Result<Seed> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

    Ok(Seed(mnemonic.to_seed(passphrase.unwrap_or(""))))
}
