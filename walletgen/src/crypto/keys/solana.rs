//! Solana key derivation
//!
//! SLIP-0010 over ed25519: only hardened children exist, so every path
//! component must carry the `'` marker.

use ed25519_dalek::SigningKey;

use crate::error::{Error, Result};
use super::derivation::{
    check_index, check_seed, hmac_sha512, parse_derivation_path, Chain, DerivedKey,
    HARDENED_OFFSET,
};

const PUBLIC_KEY_LEN: usize = 32;
const KEYPAIR_LEN: usize = 64;

/// Derive the Solana wallet at `index` (path `m/44'/501'/index'/0'`)
pub fn derive_solana(seed: &[u8], index: u32) -> Result<DerivedKey> {
    check_index(index)?;
    derive_solana_at_path(seed, &Chain::Solana.derivation_path(index))
}

/// Derive a Solana key from a seed and a fully hardened path
pub fn derive_solana_at_path(seed: &[u8], path: &str) -> Result<DerivedKey> {
    check_seed(seed)?;

    let derived = derive_ed25519_seed(seed, path)?;

    let signing_key = SigningKey::from_bytes(&derived);
    let keypair: [u8; KEYPAIR_LEN] = signing_key.to_keypair_bytes();
    let public_key = signing_key.verifying_key().to_bytes();

    let (_, keypair_public) = keypair.split_at(KEYPAIR_LEN - PUBLIC_KEY_LEN);
    if keypair_public != public_key.as_slice() {
        return Err(Error::MalformedDerivedSeed(
            "ed25519 keypair does not end with its public key".to_string(),
        ));
    }

    Ok(DerivedKey {
        chain: Chain::Solana,
        address: public_key_to_address(&public_key)?,
        private_key: bs58::encode(keypair).into_string(),
        public_key: public_key.to_vec(),
    })
}

/// Walk a SLIP-0010 path and return the 32-byte child key
pub fn derive_ed25519_seed(seed: &[u8], path: &str) -> Result<[u8; 32]> {
    let path_components = parse_derivation_path(path)?;

    // Derive the master key
    let (mut secret_key, mut chain_code) = hmac_sha512(b"ed25519 seed", seed)?;

    for component in path_components {
        if component < HARDENED_OFFSET {
            return Err(Error::KeyDerivation(format!(
                "ed25519 derivation requires hardened components: {}",
                path
            )));
        }

        let mut data = Vec::with_capacity(37);
        data.push(0);
        data.extend_from_slice(&secret_key);
        data.extend_from_slice(&component.to_be_bytes());

        (secret_key, chain_code) = hmac_sha512(&chain_code, &data)?;
    }

    Ok(secret_key)
}

/// Get the Solana address from a public key
pub fn public_key_to_address(public_key: &[u8]) -> Result<String> {
    // The public key should be 32 bytes
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(Error::MalformedDerivedSeed(format!(
            "Invalid Solana public key length: {}",
            public_key.len()
        )));
    }

    // Encode the public key as base58
    Ok(bs58::encode(public_key).into_string())
}
