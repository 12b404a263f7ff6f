//! # Encryption Engine
//!
//! Layered AES-256-GCM encryption of secrets at rest.
//!
//! Every value written by the service is sealed under the process-wide
//! [`SystemKey`]. When the creator supplies a password, the plaintext is first
//! sealed under a PBKDF2-derived key and the result is then sealed under the
//! system key. See [`engine`] for the stored formats.

pub mod engine;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod layer;

pub use engine::EncryptionEngine;
pub use error::CryptoError;
pub use kdf::{derive_key, PBKDF2_ITERATIONS, SALT_LEN};
pub use keys::{SymmetricKey, SystemKey, KEY_LEN};
pub use layer::{decrypt_layer, encrypt_layer, NONCE_SIZE, TAG_SIZE};
