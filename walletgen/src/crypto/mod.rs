//! Cryptographic primitives and operations
//!
//! This module provides functionality for mnemonic generation, seed
//! derivation and per-chain key derivation.

pub mod mnemonic;
pub mod keys;

pub use mnemonic::*;
pub use keys::*;
