//! Redacting wrapper for user-supplied sensitive strings.
//!
//! Secret plaintexts and user passwords travel through the service as
//! [`SecretString`] so they cannot reach logs, `Debug` output, or serialized
//! error bodies by accident.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string whose contents are redacted in `Debug`, `Display`, and
/// serialization, and zeroed on drop.
///
/// Deserialization accepts real values so request bodies can be parsed
/// straight into this type. To write the value out (e.g. in a retrieve
/// response) call [`SecretString::expose_secret`] explicitly.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns the raw bytes of the value, for cryptographic use.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Decode decrypted bytes as UTF-8, zeroing the input buffer either way.
    pub fn from_utf8(mut bytes: Vec<u8>) -> Option<Self> {
        let value = std::str::from_utf8(&bytes).ok().map(Self::new);
        bytes.zeroize();
        value
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_debug_and_display() {
        let secret = SecretString::new("super-secret-value");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_serialization_redacts() {
        let secret = SecretString::new("super-secret-value");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"[REDACTED]\"");
    }

    #[test]
    fn test_deserialization_accepts_values() {
        let secret: SecretString = serde_json::from_str("\"my-password\"").unwrap();
        assert_eq!(secret.expose_secret(), "my-password");
    }

    #[test]
    fn test_from_utf8() {
        let secret = SecretString::from_utf8(b"hello".to_vec()).unwrap();
        assert_eq!(secret.expose_secret(), "hello");
        assert!(SecretString::from_utf8(vec![0xff, 0xfe]).is_none());
    }
}
