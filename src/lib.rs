//! # Ephemera
//!
//! A one-time secret sharing service. A creator stores a secret, receives an
//! opaque id, and hands the id to a recipient who can read the secret exactly
//! once. Secrets may carry a password and an expiry.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API → SecretLifecycleManager → EncryptionEngine
//!                    ↓
//!               SecretStore (memory | Vault KV v2)
//! ```
//!
//! ## Core Components
//!
//! - **EncryptionEngine**: AES-256-GCM under a system key, plus an optional
//!   inner layer keyed by PBKDF2-SHA256 over a caller password
//! - **MetadataCodec**: the per-secret marker recording which layers apply
//! - **SecretLifecycleManager**: create, check and at-most-once retrieve with
//!   purge on expiry
//! - **SecretStore**: key/value persistence with a conditional delete
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ephemera::crypto::{EncryptionEngine, SystemKey};
//! use ephemera::domain::SecretString;
//! use ephemera::services::SecretLifecycleManager;
//! use ephemera::store::MemorySecretStore;
//!
//! # async fn run() -> ephemera::Result<()> {
//! let key = SystemKey::from_base64("QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=")?;
//! let manager =
//!     SecretLifecycleManager::new(Arc::new(MemorySecretStore::new()), EncryptionEngine::new(key));
//!
//! let created = manager.create(SecretString::new("hello"), None, None).await?;
//! let secret = manager.retrieve(created.id.as_str(), None).await?;
//! assert_eq!(secret.expose_secret(), "hello");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod store;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
