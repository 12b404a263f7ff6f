//! Error types for the encryption layers.

use thiserror::Error;

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors raised by the encryption engine.
///
/// Messages are fixed strings or describe the shape of the data only; they
/// never include plaintext, passwords, or key bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A single layer failed to open: wrong key, tampered or truncated bytes.
    #[error("Layer decryption failed")]
    LayerDecrypt,

    /// The marker requires a password and none was supplied.
    #[error("Password required for encrypted secret")]
    PasswordRequired,

    /// The password layer failed to open with the supplied password.
    #[error("Password layer decryption failed")]
    PasswordLayer,

    /// The system layer failed to open, or stored data is malformed.
    #[error("System layer decryption failed: {reason}")]
    SystemLayer { reason: String },

    /// Sealing failed (randomness or key setup).
    #[error("Encryption failed: {reason}")]
    Encryption { reason: String },

    /// Key derivation could not run.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation { reason: String },
}

impl CryptoError {
    /// Create a system layer error.
    pub fn system_layer(reason: impl Into<String>) -> Self {
        Self::SystemLayer { reason: reason.into() }
    }

    /// Create an encryption error.
    pub fn encryption(reason: impl Into<String>) -> Self {
        Self::Encryption { reason: reason.into() }
    }

    /// Create a key derivation error.
    pub fn key_derivation(reason: impl Into<String>) -> Self {
        Self::KeyDerivation { reason: reason.into() }
    }
}
