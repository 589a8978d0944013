//! Serde helpers for binary fields stored in JSON.

/// Serialize fixed-size byte arrays as standard base64 strings.
pub mod base64_array {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let decoded = STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)?;
        decoded.try_into().map_err(|v: Vec<u8>| {
            D::Error::custom(format!("expected {} bytes, got {}", N, v.len()))
        })
    }
}
