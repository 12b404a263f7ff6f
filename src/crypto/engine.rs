//! Two-layer storage encryption.
//!
//! A stored value is the standard-base64 encoding of the outermost envelope:
//!
//! ```text
//! SystemOnly:         system_layer(plaintext)
//! SystemAndPassword:  system_layer(salt || password_layer(plaintext))
//! LegacyEncrypted:    salt || password_layer(plaintext)
//! LegacyPlaintext:    plaintext, not base64 encoded
//! ```
//!
//! Both layers are AES-256-GCM envelopes as produced by
//! [`encrypt_layer`](super::layer::encrypt_layer). The password layer key is
//! derived with PBKDF2 from the user's password and the salt in front of it.

use base64::Engine as _;
use ring::rand::SystemRandom;
use std::sync::Arc;
use tracing::{debug, instrument};
use zeroize::Zeroize;

use super::error::{CryptoError, Result};
use super::kdf::{derive_key, generate_salt, SALT_LEN};
use super::keys::SystemKey;
use super::layer::{decrypt_layer, encrypt_layer};
use crate::domain::{EncryptionMarker, MetadataCodec, SecretString};

/// Encrypts secrets for the store and reverses the process on retrieval.
///
/// Cloning is cheap; the system key and RNG are shared.
#[derive(Clone)]
pub struct EncryptionEngine {
    system_key: Arc<SystemKey>,
    rng: Arc<SystemRandom>,
}

impl std::fmt::Debug for EncryptionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionEngine").field("system_key", &"[REDACTED]").finish()
    }
}

impl EncryptionEngine {
    pub fn new(system_key: SystemKey) -> Self {
        Self { system_key: Arc::new(system_key), rng: Arc::new(SystemRandom::new()) }
    }

    /// Encrypt `plaintext` for persistence.
    ///
    /// An empty password counts as no password. Returns the stored string and
    /// the marker that must be written next to it.
    #[instrument(
        skip_all,
        fields(plaintext_len = plaintext.len(), has_password = tracing::field::Empty)
    )]
    pub fn encrypt_for_storage(
        &self,
        plaintext: &SecretString,
        password: Option<&SecretString>,
    ) -> Result<(String, EncryptionMarker)> {
        let password = password.filter(|p| !p.is_empty());
        let marker = MetadataCodec::encode(password.is_some());
        tracing::Span::current().record("has_password", password.is_some());

        let envelope = match password {
            Some(password) => {
                let mut inner = self.seal_password_layer(plaintext.as_bytes(), password)?;
                let outer = encrypt_layer(&self.rng, &inner, self.system_key.key());
                inner.zeroize();
                outer?
            }
            None => encrypt_layer(&self.rng, plaintext.as_bytes(), self.system_key.key())?,
        };

        debug!(marker = %marker, "Encrypted secret for storage");
        Ok((encode(&envelope), marker))
    }

    /// Reverse [`encrypt_for_storage`](Self::encrypt_for_storage) according to
    /// `marker`.
    #[instrument(skip_all, fields(marker = %marker))]
    pub fn decrypt_from_storage(
        &self,
        stored: &str,
        marker: EncryptionMarker,
        password: Option<&SecretString>,
    ) -> Result<SecretString> {
        let password = password.filter(|p| !p.is_empty());
        if marker.has_password_layer() && password.is_none() {
            return Err(CryptoError::PasswordRequired);
        }
        if !marker.has_system_layer() && !marker.has_password_layer() {
            return Ok(SecretString::new(stored));
        }

        let mut layer = decode(stored)?;
        if marker.has_system_layer() {
            layer = self.open_system_layer(&layer)?;
        }

        let plaintext = match password.filter(|_| marker.has_password_layer()) {
            Some(password) => {
                let opened = open_password_layer(&layer, password);
                layer.zeroize();
                opened?
            }
            None => layer,
        };

        SecretString::from_utf8(plaintext)
            .ok_or_else(|| CryptoError::system_layer("decrypted secret is not valid UTF-8"))
    }

    /// Produce a value in the `LegacyEncrypted` format.
    ///
    /// Only used to seed stores with data shaped like pre-system-layer writes.
    pub fn encrypt_legacy(
        &self,
        plaintext: &SecretString,
        password: &SecretString,
    ) -> Result<String> {
        let envelope = self.seal_password_layer(plaintext.as_bytes(), password)?;
        Ok(encode(&envelope))
    }

    fn seal_password_layer(&self, plaintext: &[u8], password: &SecretString) -> Result<Vec<u8>> {
        let salt = generate_salt(&self.rng)?;
        let key = derive_key(password.as_bytes(), &salt);
        let sealed = encrypt_layer(&self.rng, plaintext, &key)?;

        let mut envelope = Vec::with_capacity(SALT_LEN + sealed.len());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&sealed);
        Ok(envelope)
    }

    fn open_system_layer(&self, envelope: &[u8]) -> Result<Vec<u8>> {
        decrypt_layer(envelope, self.system_key.key())
            .map_err(|_| CryptoError::system_layer("system layer authentication failed"))
    }
}

fn open_password_layer(envelope: &[u8], password: &SecretString) -> Result<Vec<u8>> {
    if envelope.len() < SALT_LEN {
        return Err(CryptoError::PasswordLayer);
    }
    let (salt, sealed) = envelope.split_at(SALT_LEN);
    let key = derive_key(password.as_bytes(), salt);
    decrypt_layer(sealed, &key).map_err(|_| CryptoError::PasswordLayer)
}

fn encode(envelope: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(envelope)
}

fn decode(stored: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(stored.trim())
        .map_err(|_| CryptoError::system_layer("stored value is not valid base64"))
}
