//! Cryptographic primitives for arcadio.
//!
//! This module provides:
//! - Key derivation using Argon2id
//! - Authenticated encryption using AES-256-GCM
//! - One-way hashing for password/answer verification and content digests
//! - Key types with automatic zeroization
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Decryption failures are indistinguishable (wrong key vs. tampering)
//! - Constant-time operations for sensitive comparisons

pub mod aead;
pub mod encoding;
pub mod hash;
pub mod kdf;
pub mod keys;

pub use aead::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use hash::{content_digest, digests_match, hash_answer, DIGEST_LENGTH};
pub use kdf::{derive_key, KdfParams, KDF_ALGORITHM};
pub use keys::{generate_salt, random_bytes, ArcKey, Salt, KEY_LENGTH, SALT_LENGTH};
