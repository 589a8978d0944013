//! One-way hashing with SHA-256.
//!
//! Used for password/answer verification material and for document
//! content digests. Never used as an encryption key.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Hash a password or security answer.
pub fn hash_answer(text: &[u8]) -> [u8; DIGEST_LENGTH] {
    Sha256::digest(text).into()
}

/// Lowercase hex SHA-256 of document plaintext.
pub fn content_digest(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Compare two digests without early exit.
pub fn digests_match(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_answer_known_vector() {
        assert_eq!(
            hex::encode(hash_answer(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(&[1, 2, 3]),
            "039058c6f2c0cb492c533b0a4d14ef77cc0f78abccced5287d84a1a2011cfb81"
        );
    }

    #[test]
    fn test_digests_match() {
        let a = hash_answer(b"answer");
        let b = hash_answer(b"answer");
        let c = hash_answer(b"other");

        assert!(digests_match(&a, &b));
        assert!(!digests_match(&a, &c));
        assert!(!digests_match(&a, &a[..16]));
    }
}
