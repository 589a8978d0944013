//! Common error types for arcadio.

use thiserror::Error;

/// Top-level error type for arcadio operations.
///
/// Credential and decryption failures deliberately carry no detail: callers
/// must not be able to tell a wrong password from corrupted ciphertext.
#[derive(Debug, Error)]
pub enum Error {
    /// No registry entry matched the lookup.
    #[error("arc not found: {0}")]
    ArcNotFound(String),

    /// The document id is not present in the arc.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Password (or security answer) did not verify.
    #[error("invalid password")]
    InvalidPassword,

    /// Password could not be resolved and prompting was disallowed.
    #[error("password unavailable for arc: {0}")]
    PasswordUnavailable(String),

    /// Authenticated decryption failed.
    #[error("decryption failed")]
    Decryption,

    /// Cipher could not be constructed for encryption.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Key derivation failed (invalid parameters).
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    /// Decrypted content does not match its recorded digest.
    #[error("integrity check failed for document {0}")]
    Integrity(String),

    /// Password verified but the metadata could not be decrypted or parsed.
    #[error("corrupt arc: {0}")]
    CorruptArc(String),

    /// The OS entropy source is unavailable.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The durable secret store failed.
    #[error("secret store error: {0}")]
    SecretStore(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_generic() {
        assert_eq!(Error::InvalidPassword.to_string(), "invalid password");
        assert_eq!(Error::Decryption.to_string(), "decryption failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
