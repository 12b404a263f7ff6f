//! Encryption-status marker persisted next to every secret.
//!
//! The marker records which layers were applied when the secret was written, so
//! retrieval never has to guess from the ciphertext. Two legacy variants remain
//! for values written before the system layer existed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::CryptoError;

/// Which encryption layers protect a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionMarker {
    /// System layer only
    #[serde(rename = "secret_key_encrypted")]
    SystemOnly,
    /// Password layer wrapped in the system layer
    #[serde(rename = "secret_key_password_encrypted")]
    SystemAndPassword,
    /// Password layer only; written before the system layer was mandatory
    #[serde(rename = "encrypted")]
    LegacyEncrypted,
    /// No encryption at all; written before the system layer was mandatory
    #[serde(rename = "plaintext")]
    LegacyPlaintext,
}

impl EncryptionMarker {
    /// The string stored under `{id}-metadata`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemOnly => "secret_key_encrypted",
            Self::SystemAndPassword => "secret_key_password_encrypted",
            Self::LegacyEncrypted => "encrypted",
            Self::LegacyPlaintext => "plaintext",
        }
    }

    /// Whether the stored value is wrapped in the system layer
    pub fn has_system_layer(&self) -> bool {
        match self {
            Self::SystemOnly | Self::SystemAndPassword => true,
            Self::LegacyEncrypted | Self::LegacyPlaintext => false,
        }
    }

    /// Whether the stored value carries a password layer
    pub fn has_password_layer(&self) -> bool {
        match self {
            Self::SystemAndPassword | Self::LegacyEncrypted => true,
            Self::SystemOnly | Self::LegacyPlaintext => false,
        }
    }
}

impl FromStr for EncryptionMarker {
    type Err = CryptoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "secret_key_encrypted" => Ok(Self::SystemOnly),
            "secret_key_password_encrypted" => Ok(Self::SystemAndPassword),
            "encrypted" => Ok(Self::LegacyEncrypted),
            "plaintext" => Ok(Self::LegacyPlaintext),
            _ => Err(CryptoError::system_layer("unrecognized encryption marker")),
        }
    }
}

impl fmt::Display for EncryptionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded view of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStatus {
    pub requires_password: bool,
    pub is_legacy: bool,
}

/// Encodes and decodes [`EncryptionMarker`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataCodec;

impl MetadataCodec {
    /// Marker for a newly created secret.
    pub fn encode(has_password: bool) -> EncryptionMarker {
        if has_password {
            EncryptionMarker::SystemAndPassword
        } else {
            EncryptionMarker::SystemOnly
        }
    }

    /// What a marker demands of the caller.
    pub fn decode(marker: EncryptionMarker) -> MarkerStatus {
        MarkerStatus {
            requires_password: marker.has_password_layer(),
            is_legacy: !marker.has_system_layer(),
        }
    }

    /// Parse a stored marker string. Unknown strings are corruption.
    pub fn parse(stored: &str) -> Result<EncryptionMarker, CryptoError> {
        stored.trim().parse()
    }

    /// Marker to assume when a value exists without its metadata entry.
    ///
    /// This happens when a create was interrupted between the value write and
    /// the marker write.
    pub fn decode_missing() -> EncryptionMarker {
        EncryptionMarker::LegacyPlaintext
    }
}
