//! Secret identity and the results of lifecycle operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier handed to the creator of a secret.
///
/// Always a random v4 UUID in its hyphenated lowercase form, which is also
/// the prefix of every store key belonging to the secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretId(String);

impl SecretId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse and validate a caller-supplied identifier
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s.trim())?;
        Ok(Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key holding the encrypted value
    pub fn value_key(&self) -> String {
        self.0.clone()
    }

    /// Store key holding the encryption marker
    pub fn metadata_key(&self) -> String {
        format!("{}-metadata", self.0)
    }

    /// Store key holding the expiry as UNIX seconds
    pub fn expires_key(&self) -> String {
        format!("{}-expires", self.0)
    }

    /// All store keys, in purge order.
    pub fn all_keys(&self) -> [String; 3] {
        [self.value_key(), self.metadata_key(), self.expires_key()]
    }
}

impl Default for SecretId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SecretId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for SecretId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returned by `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedSecret {
    pub id: SecretId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Returned by `check`. Never includes the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecretStatus {
    pub requires_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique_uuids() {
        let a = SecretId::new();
        let b = SecretId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_parse_normalizes() {
        let id = SecretId::parse("  0B6F3C0E-7E4C-4A53-9D9E-1D1C3F0D8A11 ").unwrap();
        assert_eq!(id.as_str(), "0b6f3c0e-7e4c-4a53-9d9e-1d1c3f0d8a11");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SecretId::parse("not-a-uuid").is_err());
        assert!(SecretId::parse("").is_err());
        assert!("../etc/passwd".parse::<SecretId>().is_err());
    }

    #[test]
    fn test_store_keys() {
        let id = SecretId::parse("0b6f3c0e-7e4c-4a53-9d9e-1d1c3f0d8a11").unwrap();
        assert_eq!(id.value_key(), "0b6f3c0e-7e4c-4a53-9d9e-1d1c3f0d8a11");
        assert_eq!(id.metadata_key(), "0b6f3c0e-7e4c-4a53-9d9e-1d1c3f0d8a11-metadata");
        assert_eq!(id.expires_key(), "0b6f3c0e-7e4c-4a53-9d9e-1d1c3f0d8a11-expires");
    }

    #[test]
    fn test_status_serialization_omits_missing_expiry() {
        let status = SecretStatus { requires_password: true, expires_at: None };
        assert_eq!(serde_json::to_string(&status).unwrap(), r#"{"requires_password":true}"#);
    }
}
