//! The key-value contract the lifecycle manager persists secrets through.

use async_trait::async_trait;

use super::error::{Result, StoreError};

/// A string key-value store with no native TTL and no multi-key transactions.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log stored values; keys are safe to log
/// - Values are already encrypted (or are legacy plaintext) when they arrive
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Create or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove `key` only if it currently holds `expected`.
    ///
    /// Returns `true` when this call removed the value. Two callers racing on
    /// the same key and value must not both see `true` when
    /// [`atomic_conditional_delete`](Self::atomic_conditional_delete) is
    /// `true`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool>;

    /// Whether [`compare_and_delete`](Self::compare_and_delete) is atomic.
    fn atomic_conditional_delete(&self) -> bool;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Reject keys the backends cannot address.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::invalid_key(key, "key cannot be empty"));
    }
    if key.contains('/') || key.contains("..") {
        return Err(StoreError::invalid_key(key, "key cannot contain path separators"));
    }
    Ok(())
}
