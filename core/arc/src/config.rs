//! Per-arc security configuration and on-disk names.

use serde::{Deserialize, Serialize};

use arcadio_common::{Error, Result};
use arcadio_crypto::{
    encoding::base64_array, hash_answer, KdfParams, Salt, DIGEST_LENGTH, KDF_ALGORITHM,
};

/// Encryption scheme tag recorded in every arc.
pub const ENCRYPTION_VERSION: &str = "v1";

/// Security config file name in the arc directory (plaintext JSON).
pub const SECURITY_FILENAME: &str = "arc.sec";

/// Encrypted metadata file name in the arc directory.
pub const METADATA_FILENAME: &str = "arc.meta";

/// Directory holding document payloads.
pub const DOCUMENTS_DIRNAME: &str = "documents";

/// Extension of document payload files.
pub const DOCUMENT_EXTENSION: &str = "bin";

/// Material needed to reach an arc's key.
///
/// Stored unencrypted and written once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Salt for key derivation.
    pub salt: Salt,
    /// SHA-256 of the password, for verification.
    #[serde(with = "base64_array")]
    pub password_hash: [u8; DIGEST_LENGTH],
    pub security_question: String,
    /// SHA-256 of the security answer.
    #[serde(with = "base64_array")]
    pub answer_hash: [u8; DIGEST_LENGTH],
    /// Key derivation algorithm name.
    pub key_derivation: String,
    /// Parameters used at creation.
    #[serde(default)]
    pub kdf_params: KdfParams,
}

impl SecurityConfig {
    /// Build the config for a new arc.
    pub fn new(
        salt: Salt,
        password: &str,
        security_question: &str,
        answer: &str,
        kdf_params: KdfParams,
    ) -> Self {
        Self {
            salt,
            password_hash: hash_answer(password.as_bytes()),
            security_question: security_question.to_string(),
            answer_hash: hash_answer(answer.as_bytes()),
            key_derivation: KDF_ALGORITHM.to_string(),
            kdf_params,
        }
    }

    /// Serialize to bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserialize from bytes.
    ///
    /// # Errors
    /// - `Error::Serialization` on malformed input
    /// - `Error::CorruptArc` if the key derivation algorithm is unknown or
    ///   its parameters are not a supported preset
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes)?;
        if config.key_derivation != KDF_ALGORITHM {
            return Err(Error::CorruptArc(format!(
                "unsupported key derivation: {}",
                config.key_derivation
            )));
        }
        if !config.kdf_params.is_supported() {
            return Err(Error::CorruptArc(format!(
                "unsupported key derivation parameters: {:?}",
                config.kdf_params
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let salt = Salt::from_bytes([3u8; 32]);
        let config = SecurityConfig::new(salt.clone(), "pw", "Pet?", "Rex", KdfParams::moderate());

        let bytes = config.to_bytes().unwrap();
        let restored = SecurityConfig::from_bytes(&bytes).unwrap();

        assert_eq!(restored.salt, salt);
        assert_eq!(restored.password_hash, hash_answer(b"pw"));
        assert_eq!(restored.answer_hash, hash_answer(b"Rex"));
        assert_eq!(restored.security_question, "Pet?");
        assert_eq!(restored.kdf_params, KdfParams::moderate());
    }

    #[test]
    fn test_missing_kdf_params_default_to_standard() {
        let config = SecurityConfig::new(
            Salt::from_bytes([3u8; 32]),
            "pw",
            "q",
            "a",
            KdfParams::moderate(),
        );
        let mut value = serde_json::to_value(&config).unwrap();
        value.as_object_mut().unwrap().remove("kdf_params");

        let restored = SecurityConfig::from_bytes(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(restored.kdf_params, KdfParams::standard());
    }

    #[test]
    fn test_unknown_kdf_rejected() {
        let mut config = SecurityConfig::new(
            Salt::from_bytes([3u8; 32]),
            "pw",
            "q",
            "a",
            KdfParams::moderate(),
        );
        config.key_derivation = "scrypt".to_string();
        let bytes = config.to_bytes().unwrap();

        assert!(matches!(
            SecurityConfig::from_bytes(&bytes),
            Err(Error::CorruptArc(_))
        ));
    }

    #[test]
    fn test_unsupported_kdf_params_rejected() {
        let config = SecurityConfig::new(
            Salt::from_bytes([3u8; 32]),
            "pw",
            "q",
            "a",
            KdfParams::moderate(),
        );
        let mut value = serde_json::to_value(&config).unwrap();
        value["kdf_params"]["memory_cost"] = serde_json::json!(u32::MAX);

        assert!(matches!(
            SecurityConfig::from_bytes(&serde_json::to_vec(&value).unwrap()),
            Err(Error::CorruptArc(_))
        ));
    }
}
