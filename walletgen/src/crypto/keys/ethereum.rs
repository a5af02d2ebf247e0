//! Ethereum key derivation

use ethers_core::types::Address;
use ethers_core::utils::to_checksum;
use secp256k1::{Secp256k1, SecretKey, PublicKey as Secp256k1PublicKey};
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};
use super::derivation::{
    check_index, check_seed, hmac_sha512, parse_derivation_path, Chain, DerivedKey,
    HARDENED_OFFSET,
};

/// Length of an uncompressed secp256k1 public key
const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;

/// Derive the Ethereum wallet at `index` (path `m/44'/60'/index'/0'`)
pub fn derive_ethereum(seed: &[u8], index: u32) -> Result<DerivedKey> {
    check_index(index)?;
    derive_ethereum_at_path(seed, &Chain::Ethereum.derivation_path(index))
}

/// Derive an Ethereum key from a seed and an arbitrary BIP-32 path
pub fn derive_ethereum_at_path(seed: &[u8], path: &str) -> Result<DerivedKey> {
    check_seed(seed)?;

    // Parse the derivation path
    let path_components = parse_derivation_path(path)?;

    // Derive the master key
    let (mut secret_key, mut chain_code) = hmac_sha512(b"Bitcoin seed", seed)?;

    // Derive the child keys
    for component in path_components {
        (secret_key, chain_code) = derive_child_key(secret_key, chain_code, component)?;
    }

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(&secret_key)
        .map_err(|e| Error::KeyDerivation(format!("Invalid secret key: {}", e)))?;
    let public_key = Secp256k1PublicKey::from_secret_key(&secp, &secret_key)
        .serialize_uncompressed()
        .to_vec();

    let address = public_key_to_address(&public_key)?;

    Ok(DerivedKey {
        chain: Chain::Ethereum,
        address,
        private_key: format!("0x{}", hex::encode(secret_key.secret_bytes())),
        public_key,
    })
}

/// Derive a child key from a parent key
fn derive_child_key(parent_key: [u8; 32], parent_chain_code: [u8; 32], index: u32) -> Result<([u8; 32], [u8; 32])> {
    let secp = Secp256k1::new();
    let parent_secret_key = SecretKey::from_slice(&parent_key)
        .map_err(|e| Error::KeyDerivation(format!("Invalid parent key: {}", e)))?;

    let mut data = Vec::with_capacity(37);

    if index >= HARDENED_OFFSET {
        // Hardened derivation
        data.push(0);
        data.extend_from_slice(&parent_key);
    } else {
        // Normal derivation
        let parent_public_key = Secp256k1PublicKey::from_secret_key(&secp, &parent_secret_key);
        data.extend_from_slice(&parent_public_key.serialize());
    }

    // Append the index
    data.extend_from_slice(&index.to_be_bytes());

    let (child_key, child_chain_code) = hmac_sha512(&parent_chain_code, &data)?;

    // Add the parent key to the child key (mod n)
    let child_secret_key = SecretKey::from_slice(&child_key)
        .map_err(|e| Error::KeyDerivation(format!("Invalid child key: {}", e)))?;

    let child_secret_key = child_secret_key.add_tweak(&parent_secret_key.into())
        .map_err(|e| Error::KeyDerivation(format!("Key addition error: {}", e)))?;

    Ok((child_secret_key.secret_bytes(), child_chain_code))
}

/// Get the EIP-55 checksummed Ethereum address from an uncompressed public key
pub fn public_key_to_address(public_key: &[u8]) -> Result<String> {
    if public_key.len() != UNCOMPRESSED_PUBLIC_KEY_LEN {
        return Err(Error::MalformedDerivedSeed(format!(
            "Invalid Ethereum public key length: {}",
            public_key.len()
        )));
    }

    // Skip the first byte (0x04) and hash the rest
    let key_hash = keccak256(&public_key[1..]);

    // Take the last 20 bytes of the hash
    let address = Address::from_slice(&key_hash[12..]);

    Ok(to_checksum(&address, None))
}

/// Check that `address` is `0x` followed by 40 hex digits with a valid EIP-55 checksum
pub fn is_checksummed_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix("0x") else {
        return false;
    };
    match hex::decode(body) {
        Ok(bytes) if bytes.len() == 20 => to_checksum(&Address::from_slice(&bytes), None) == address,
        _ => false,
    }
}

/// Calculate the Keccak-256 hash of data
fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
