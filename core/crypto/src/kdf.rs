//! Key derivation using Argon2id.
//!
//! Argon2id is a memory-hard password hashing function that provides
//! resistance to both GPU and time-memory trade-off attacks.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::keys::{ArcKey, Salt, KEY_LENGTH};
use arcadio_common::{Error, Result};

/// Identifier recorded in each arc's security config.
pub const KDF_ALGORITHM: &str = "argon2id";

/// Parameters for Argon2id key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Reference parameters: one pass over 64 MiB with four lanes.
    pub fn standard() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 1,
            parallelism: 4,
        }
    }

    /// Create moderate parameters for low-memory devices and tests.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 16384, // 16 MiB
            time_cost: 1,
            parallelism: 2,
        }
    }

    /// Whether these are one of the presets above.
    ///
    /// Parameters read back from an arc must satisfy this before any
    /// derivation runs with them.
    pub fn is_supported(&self) -> bool {
        *self == Self::standard() || *self == Self::moderate()
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derive an arc key from a password and salt using Argon2id.
///
/// The derived key is deterministic given the same inputs; distinct salts
/// make results for identical passwords unlinkable.
///
/// # Errors
/// - `Error::KeyDerivation` if the Argon2id parameters are invalid
pub fn derive_key(password: &[u8], salt: &Salt, params: &KdfParams) -> Result<ArcKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| Error::KeyDerivation(format!("Invalid KDF parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_LENGTH];
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut key_bytes)
        .map_err(|e| Error::KeyDerivation(format!("Key derivation failed: {}", e)))?;

    Ok(ArcKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let password = b"test-password-123";
        let salt = Salt::from_bytes([42u8; 32]);
        let params = KdfParams::moderate();

        let key1 = derive_key(password, &salt, &params).unwrap();
        let key2 = derive_key(password, &salt, &params).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salt() {
        let password = b"test-password-123";
        let salt1 = Salt::from_bytes([1u8; 32]);
        let salt2 = Salt::from_bytes([2u8; 32]);
        let params = KdfParams::moderate();

        let key1 = derive_key(password, &salt1, &params).unwrap();
        let key2 = derive_key(password, &salt2, &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = Salt::from_bytes([42u8; 32]);
        let params = KdfParams::moderate();

        let key1 = derive_key(b"password1", &salt, &params).unwrap();
        let key2 = derive_key(b"password2", &salt, &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_standard_params_derive() {
        let salt = Salt::from_bytes([9u8; 32]);
        let key = derive_key(b"correcthorse", &salt, &KdfParams::default()).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_LENGTH);
    }

    #[test]
    fn test_supported_presets() {
        assert!(KdfParams::standard().is_supported());
        assert!(KdfParams::moderate().is_supported());
        assert!(!KdfParams {
            memory_cost: u32::MAX,
            time_cost: 1,
            parallelism: 4,
        }
        .is_supported());
        assert!(!KdfParams {
            time_cost: 1_000_000,
            ..KdfParams::standard()
        }
        .is_supported());
    }

    #[test]
    fn test_invalid_params_fail() {
        let salt = Salt::from_bytes([9u8; 32]);
        let params = KdfParams {
            memory_cost: 1,
            time_cost: 1,
            parallelism: 1,
        };
        assert!(matches!(
            derive_key(b"pw", &salt, &params),
            Err(Error::KeyDerivation(_))
        ));
    }
}
