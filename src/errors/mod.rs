//! # Error Handling
//!
//! Error types for the Ephemera secret service using `thiserror`.
//!
//! Variants map one-to-one onto the secret lifecycle outcomes so the API layer
//! can choose a status code without inspecting messages. No variant ever
//! carries plaintext, passwords, or key material.

use crate::crypto::CryptoError;
use crate::store::StoreError;

/// Custom result type for Ephemera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Ephemera secret service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Bad input (e.g. an expiry in the past); no state was changed
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Unknown or already-consumed secret id
    #[error("Secret not found or already accessed")]
    NotFound { id: String },

    /// The secret's expiry has passed; it has been purged
    #[error("Secret has expired and has been deleted")]
    Expired { id: String, expired_at: i64 },

    /// The secret is password protected and no password was supplied
    #[error("Password required for encrypted secret")]
    PasswordRequired,

    /// The supplied password did not open the password layer
    #[error("Decryption failed: invalid password")]
    InvalidPassword,

    /// Stored ciphertext is corrupted or the system key does not match
    #[error("System decryption failed: {message}")]
    SystemLayer { message: String },

    /// The secret store could not be reached or rejected the operation
    #[error("Secret store error: {context}")]
    Store {
        #[source]
        source: StoreError,
        context: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a not found error
    pub fn not_found<I: Into<String>>(id: I) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an expiry error carrying the original expiry timestamp
    pub fn expired<I: Into<String>>(id: I, expired_at: i64) -> Self {
        Self::Expired { id: id.into(), expired_at }
    }

    /// Create a system layer error
    pub fn system_layer<S: Into<String>>(message: S) -> Self {
        Self::SystemLayer { message: message.into() }
    }

    /// Create a store error with context
    pub fn store<S: Into<String>>(source: StoreError, context: S) -> Self {
        Self::Store { source, context: context.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the caller can fix the request and try again without the
    /// secret changing state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::PasswordRequired | Error::InvalidPassword
        )
    }
}

impl From<CryptoError> for Error {
    fn from(error: CryptoError) -> Self {
        match error {
            CryptoError::PasswordRequired => Error::PasswordRequired,
            CryptoError::PasswordLayer => Error::InvalidPassword,
            CryptoError::SystemLayer { reason } => Error::SystemLayer { message: reason },
            CryptoError::LayerDecrypt => Error::system_layer("authentication failed"),
            CryptoError::Encryption { reason } => {
                Error::Internal(format!("Encryption failed: {}", reason))
            }
            CryptoError::KeyDerivation { reason } => {
                Error::Internal(format!("Key derivation failed: {}", reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::config("missing key");
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: missing key");
    }

    #[test]
    fn test_validation_error_with_field() {
        let error = Error::validation_field("expires_at must be in the future", "expires_at");
        match error {
            Error::Validation { message, field } => {
                assert_eq!(message, "expires_at must be in the future");
                assert_eq!(field, Some("expires_at".to_string()));
            }
            _ => panic!("Expected validation error"),
        }
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::PasswordRequired.is_recoverable());
        assert!(Error::InvalidPassword.is_recoverable());
        assert!(Error::validation("bad").is_recoverable());
        assert!(!Error::not_found("id").is_recoverable());
        assert!(!Error::expired("id", 0).is_recoverable());
        assert!(!Error::system_layer("tampered").is_recoverable());
    }

    #[test]
    fn test_crypto_error_conversion() {
        assert!(matches!(Error::from(CryptoError::PasswordRequired), Error::PasswordRequired));
        assert!(matches!(Error::from(CryptoError::PasswordLayer), Error::InvalidPassword));
        assert!(matches!(
            Error::from(CryptoError::system_layer("bad base64")),
            Error::SystemLayer { .. }
        ));
    }

    #[test]
    fn test_expired_display_does_not_leak_id() {
        let error = Error::expired("0b6f3c0e-7e4c-4a53-9d9e-1d1c3f0d8a11", 42);
        assert_eq!(error.to_string(), "Secret has expired and has been deleted");
    }
}
