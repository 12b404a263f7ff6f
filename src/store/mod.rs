//! # Secret Store
//!
//! The key-value collaborator that holds encrypted values, their encryption
//! markers, and their expiry timestamps.
//!
//! ## Backends
//!
//! - **Memory**: [`MemorySecretStore`], atomic conditional delete
//! - **Vault**: [`VaultSecretStore`], HashiCorp Vault KV v2, claims values
//!   with check-and-set writes
//!
//! The backend is chosen by `EPHEMERA_STORE_BACKEND`.

pub mod client;
pub mod error;
pub mod memory;
pub mod vault;

pub use client::SecretStore;
pub use error::{Result, StoreError};
pub use memory::MemorySecretStore;
pub use vault::{VaultConfig, VaultSecretStore};
