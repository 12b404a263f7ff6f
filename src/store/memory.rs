//! In-process store backed by a concurrent hash map.
//!
//! Used for development, tests, and single-instance deployments. Contents are
//! lost on restart.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::client::{validate_key, SecretStore};
use super::error::Result;

/// [`SecretStore`] over a shared [`DashMap`].
///
/// Clones share the same map. `compare_and_delete` runs under the shard lock,
/// so it is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all secrets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.entries.remove(key);
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.entries.remove_if(key, |_, current| current == expected).is_some())
    }

    fn atomic_conditional_delete(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
