//! Key material wrappers.
//!
//! Both the deployment-wide system key and per-secret password-derived keys
//! are 256-bit AES keys held in zeroize-on-drop buffers with redacted `Debug`.

use base64::Engine;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Error, Result};

/// Length of an AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key that is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; KEY_LEN] = slice.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// The process-wide key that wraps every stored value.
///
/// Loaded once at startup and shared read-only; it is never persisted or
/// derived from user input.
#[derive(Clone)]
pub struct SystemKey {
    key: SymmetricKey,
}

impl SystemKey {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Decode a base64-encoded 32-byte key, as supplied by `EPHEMERA_SECRET_KEY`.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut key_bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::config(format!("Invalid base64 in EPHEMERA_SECRET_KEY: {}", e)))?;

        if key_bytes.len() != KEY_LEN {
            let len = key_bytes.len();
            key_bytes.zeroize();
            return Err(Error::config(format!(
                "EPHEMERA_SECRET_KEY must be {} bytes (256 bits), got {} bytes",
                KEY_LEN, len
            )));
        }

        let key = SymmetricKey::from_slice(&key_bytes);
        key_bytes.zeroize();
        key.map(Self::new).ok_or_else(|| Error::config("EPHEMERA_SECRET_KEY has invalid length"))
    }

    pub(crate) fn key(&self) -> &SymmetricKey {
        &self.key
    }
}

impl fmt::Debug for SystemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemKey").field("key", &"[REDACTED]").finish()
    }
}
