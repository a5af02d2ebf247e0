//! Key derivation and management
//!
//! This module provides functionality for deriving keys for the supported
//! chains from a BIP-39 seed.

pub mod ethereum;
pub mod solana;
mod derivation;

pub use derivation::*;
