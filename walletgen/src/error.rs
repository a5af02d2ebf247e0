//! Error types for the walletgen library

use thiserror::Error;

/// Custom error type for walletgen operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The mnemonic failed word-list or checksum validation
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The key-value backend could not read, write, remove or parse a key
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Seed or derived key material has an unexpected length
    #[error("Malformed derived seed: {0}")]
    MalformedDerivedSeed(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Errors that mean persisted or derived state can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidMnemonic(_) | Error::Persistence(_) | Error::MalformedDerivedSeed(_)
        )
    }
}

/// Result type for walletgen operations
pub type Result<T> = std::result::Result<T, Error>;
