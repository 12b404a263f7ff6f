//! HashiCorp Vault KV v2 store.
//!
//! Each store key is a KV v2 path under the configured mount. The stored
//! string lives in the `value` field of the secret's data map. Deletes remove
//! the path's metadata so no prior version can be recovered.
//!
//! # Configuration
//!
//! - `VAULT_ADDR`: Vault server address
//! - `VAULT_TOKEN`: authentication token
//! - `VAULT_NAMESPACE`: optional Enterprise namespace
//! - `VAULT_MOUNT_PATH`: KV v2 mount path (default: "secret")
//!
//! # Claiming a value
//!
//! KV v2 has no conditional delete. [`compare_and_delete`] instead reads the
//! current version, then overwrites it with a `claimed` tombstone using a
//! check-and-set write pinned to that version. Vault accepts only one such
//! write per version, so only one caller wins the claim. The winner then
//! removes the path's metadata. Reads treat a tombstone as an absent key.
//!
//! [`compare_and_delete`]: SecretStore::compare_and_delete

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vaultrs::api::kv2::requests::SetSecretRequestOptions;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::{validate_key, SecretStore};
use super::error::{Result, StoreError};

const VALUE_FIELD: &str = "value";
const CLAIMED_FIELD: &str = "claimed";

/// Configuration for the Vault backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Vault authentication token
    pub token: Option<String>,

    /// Vault namespace (for Enterprise multi-tenancy)
    pub namespace: Option<String>,

    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

fn default_mount_path() -> String {
    "secret".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: default_mount_path(),
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

/// [`SecretStore`] over Vault's KV v2 engine.
pub struct VaultSecretStore {
    client: VaultClient,
    mount_path: String,
}

impl VaultSecretStore {
    /// Connect to Vault and verify it is reachable.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ConfigError`] if configuration is invalid
    /// - [`StoreError::ConnectionFailed`] if Vault is unreachable
    pub async fn new(config: VaultConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(StoreError::config_error("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(namespace) = config.namespace {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder
            .build()
            .map_err(|e| StoreError::config_error(format!("Invalid Vault configuration: {}", e)))?;

        let client = VaultClient::new(settings).map_err(|e| {
            StoreError::connection_failed(format!("Failed to create Vault client: {}", e))
        })?;

        let store = Self { client, mount_path: config.mount_path };
        match store.health_check().await {
            Ok(()) => {
                tracing::info!(address = %config.address, "Successfully connected to Vault");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    address = %config.address,
                    "Failed to connect to Vault"
                );
                return Err(e);
            }
        }

        Ok(store)
    }
}

fn is_not_found(error: &ClientError) -> bool {
    matches!(error, ClientError::APIError { code: 404, .. })
}

/// Vault rejects a check-and-set write whose version is no longer current
/// with a 400 naming the `cas` parameter.
fn is_cas_mismatch(error: &ClientError) -> bool {
    match error {
        ClientError::APIError { code: 400, errors } => {
            errors.iter().any(|e| e.contains("check-and-set"))
        }
        _ => false,
    }
}

fn request_failed(error: ClientError, action: &str, key: &str) -> StoreError {
    tracing::error!(error = %error, key = %key, action = action, "Vault request failed");
    match error {
        ClientError::APIError { code: 401 | 403, .. } => {
            StoreError::authentication_failed(format!("Vault denied {} of '{}'", action, key))
        }
        e => StoreError::backend_error(format!("Failed to {} '{}': {}", action, key, e)),
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let data: HashMap<String, String> =
            match kv2::read(&self.client, &self.mount_path, key).await {
                Ok(data) => data,
                Err(e) if is_not_found(&e) => return Ok(None),
                Err(e) => return Err(request_failed(e, "read", key)),
            };

        if data.contains_key(CLAIMED_FIELD) {
            return Ok(None);
        }

        data.get(VALUE_FIELD).cloned().map(Some).ok_or_else(|| {
            StoreError::backend_error(format!("Entry '{}' has no '{}' field", key, VALUE_FIELD))
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let mut data = HashMap::new();
        data.insert(VALUE_FIELD.to_string(), value.to_string());

        kv2::set(&self.client, &self.mount_path, key, &data)
            .await
            .map_err(|e| request_failed(e, "store", key))?;

        tracing::debug!(key = %key, "Wrote entry to Vault");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match kv2::delete_metadata(&self.client, &self.mount_path, key).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(request_failed(e, "delete", key)),
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        validate_key(key)?;
        let version = match kv2::read_metadata(&self.client, &self.mount_path, key).await {
            Ok(metadata) => metadata.current_version,
            Err(e) if is_not_found(&e) => return Ok(false),
            Err(e) => return Err(request_failed(e, "read metadata of", key)),
        };

        let data: HashMap<String, String> =
            match kv2::read_version(&self.client, &self.mount_path, key, version).await {
                Ok(data) => data,
                Err(e) if is_not_found(&e) => return Ok(false),
                Err(e) => return Err(request_failed(e, "read", key)),
            };

        // A tombstone has no value field and never matches.
        if data.get(VALUE_FIELD).map(String::as_str) != Some(expected) {
            return Ok(false);
        }

        let cas = u32::try_from(version).map_err(|_| {
            StoreError::backend_error(format!("Version of '{}' is out of check-and-set range", key))
        })?;
        let tombstone = HashMap::from([(CLAIMED_FIELD.to_string(), "true".to_string())]);
        let options = SetSecretRequestOptions { cas };

        match kv2::set_with_options(&self.client, &self.mount_path, key, &tombstone, options).await
        {
            Ok(_) => {}
            Err(e) if is_cas_mismatch(&e) => {
                tracing::debug!(key = %key, version = version, "Claim lost to a concurrent writer");
                return Ok(false);
            }
            Err(e) => return Err(request_failed(e, "claim", key)),
        }

        // The claim is final; a failed cleanup leaves only the tombstone and
        // older versions behind.
        if let Err(e) = self.delete(key).await {
            tracing::warn!(error = %e, key = %key, "Claimed entry could not be removed");
        }
        Ok(true)
    }

    fn atomic_conditional_delete(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<()> {
        vaultrs::sys::health(&self.client)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::connection_failed(format!("Vault health check failed: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "vault"
    }
}
