//! Key types with secure memory handling.
//!
//! Key types zeroize their memory on drop so that derived keys do not
//! outlive the session that needed them.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use arcadio_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of key-derivation salts in bytes.
pub const SALT_LENGTH: usize = 32;

/// Symmetric key derived from an arc password.
///
/// Encrypts both the arc metadata and every document payload of one arc.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ArcKey {
    key: [u8; KEY_LENGTH],
}

impl ArcKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for ArcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArcKey([REDACTED])")
    }
}

/// Salt for key derivation.
///
/// Serialized as standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt(#[serde(with = "crate::encoding::base64_array")] pub [u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt from the OS entropy source.
    ///
    /// # Errors
    /// - `Error::Entropy` if the entropy source is unavailable
    pub fn generate() -> Result<Self> {
        Ok(Self(random_bytes()?))
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

/// Generate a fresh random salt.
pub fn generate_salt() -> Result<Salt> {
    Salt::generate()
}

/// Fill an array from the OS entropy source.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| Error::Entropy(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate().unwrap();
        let salt2 = generate_salt().unwrap();

        // Random salts should be different
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_salt_serializes_as_base64() {
        let salt = Salt::from_bytes([0u8; SALT_LENGTH]);
        let json = serde_json::to_string(&salt).unwrap();
        assert_eq!(json, "\"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=\"");

        let restored: Salt = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, salt);
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = ArcKey::from_bytes([7u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "ArcKey([REDACTED])");
    }
}
