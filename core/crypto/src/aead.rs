//! Authenticated encryption using AES-256-GCM.
//!
//! Output format is `nonce || ciphertext || tag` with a fresh random
//! 12-byte nonce per call.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::keys::random_bytes;
use arcadio_common::{Error, Result};

/// Nonce size for AES-256-GCM (12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt plaintext using AES-256-GCM.
///
/// # Postconditions
/// - Returns nonce || ciphertext || tag
/// - The ciphertext length is plaintext length + TAG_SIZE + NONCE_SIZE
///
/// # Errors
/// - `Error::Encryption` if the cipher cannot be constructed from `key`
/// - `Error::Entropy` if no nonce can be generated
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
        Error::Encryption(format!("Invalid key length: got {} bytes", key.len()))
    })?;
    let nonce_bytes: [u8; NONCE_SIZE] = random_bytes()?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| Error::Encryption(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt ciphertext using AES-256-GCM.
///
/// # Errors
/// - `Error::Decryption` for every failure: short input, wrong key, or
///   tampered data all look the same to the caller
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < NONCE_SIZE {
        return Err(Error::Decryption);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| Error::Decryption)?;
    let (nonce_bytes, encrypted) = ciphertext.split_at(NONCE_SIZE);

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
        .map_err(|_| Error::Decryption)
}
