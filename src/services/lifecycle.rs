//! Secret lifecycle service
//!
//! Owns the create / check / retrieve state machine. A secret is `Active`
//! while its value entry exists in the store and `Gone` otherwise; a
//! successful retrieve or a detected expiry moves it to `Gone` by purging all
//! of its entries.
//!
//! The three entries of a secret are written one after another, since the
//! store has no transactions. When a later write fails, `create` deletes the
//! entries it already wrote before returning the error. If that cleanup fails
//! too, the value entry stays behind unreachable, as no caller learned its id.
//! A process crash between writes leaves a value without marker (read back as
//! legacy plaintext) or without expiry (never expires).
//!
//! A successful retrieve claims the value entry first and then deletes the
//! marker and expiry entries. A failure in that second step is logged and not
//! reported to the caller. The orphaned `-metadata` and `-expires` entries
//! remain in the store, since nothing looks them up without the value.

use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

use crate::crypto::{CryptoError, EncryptionEngine};
use crate::domain::{
    CreatedSecret, EncryptionMarker, MetadataCodec, SecretId, SecretStatus, SecretString,
};
use crate::errors::{Error, Result};
use crate::observability::metrics;
use crate::services::clock::{Clock, SystemClock};
use crate::store::SecretStore;
use crate::store_span;

/// Service implementing one-time secret semantics over a [`SecretStore`]
pub struct SecretLifecycleManager {
    store: Arc<dyn SecretStore>,
    engine: EncryptionEngine,
    clock: Arc<dyn Clock>,
}

impl SecretLifecycleManager {
    /// Create a new lifecycle manager reading time from the system clock
    pub fn new(store: Arc<dyn SecretStore>, engine: EncryptionEngine) -> Self {
        Self::with_clock(store, engine, Arc::new(SystemClock))
    }

    /// Create a new lifecycle manager with an explicit clock
    pub fn with_clock(
        store: Arc<dyn SecretStore>,
        engine: EncryptionEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if !store.atomic_conditional_delete() {
            warn!(
                backend = store.backend_name(),
                "Store has no atomic conditional delete; concurrent retrieves of the same \
                 secret may both succeed"
            );
        }
        Self { store, engine, clock }
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Encrypt and persist a new secret.
    ///
    /// An empty password is treated as no password. Nothing is written when
    /// validation fails.
    pub async fn create(
        &self,
        plaintext: SecretString,
        password: Option<SecretString>,
        expires_at: Option<i64>,
    ) -> Result<CreatedSecret> {
        if plaintext.is_empty() {
            return Err(Error::validation_field("Missing required field: secret", "secret"));
        }

        if let Some(expires_at) = expires_at {
            if expires_at <= self.clock.now_unix() {
                return Err(Error::validation_field(
                    "expires_at must be in the future",
                    "expires_at",
                ));
            }
        }

        let password = password.filter(|p| !p.is_empty());
        let engine = self.engine.clone();
        let (stored, marker) = tokio::task::spawn_blocking(move || {
            engine.encrypt_for_storage(&plaintext, password.as_ref())
        })
        .await
        .map_err(|e| Error::internal(format!("Encryption task failed: {}", e)))??;

        let id = SecretId::new();
        self.persist(&id, &stored, marker, expires_at)
            .instrument(store_span!("create", secret_id = %id))
            .await?;

        info!(
            secret_id = %id,
            marker = %marker,
            expires_at = ?expires_at,
            "Secret created"
        );
        metrics::record_secret_created(
            MetadataCodec::decode(marker).requires_password,
            expires_at.is_some(),
        )
        .await;

        Ok(CreatedSecret { id, expires_at })
    }

    /// Report whether a secret exists and needs a password, without consuming it.
    ///
    /// An expired secret is purged by this call.
    pub async fn check(&self, raw_id: &str) -> Result<SecretStatus> {
        let result = self.status(raw_id).await;
        if let Some(outcome) = check_outcome(&result) {
            metrics::record_secret_checked(outcome).await;
        }
        result
    }

    async fn status(&self, raw_id: &str) -> Result<SecretStatus> {
        let (id, _) = self.load_value(raw_id).await?;
        let expires_at = self.check_expiry(&id).await?;
        let marker = self.load_marker(&id).await?;
        let requires_password = MetadataCodec::decode(marker).requires_password;

        debug!(secret_id = %id, marker = %marker, "Secret checked");
        Ok(SecretStatus { requires_password, expires_at })
    }

    /// Decrypt and purge a secret. Succeeds at most once per secret.
    ///
    /// A missing or wrong password leaves the secret in place so the caller
    /// can try again.
    pub async fn retrieve(
        &self,
        raw_id: &str,
        password: Option<SecretString>,
    ) -> Result<SecretString> {
        let (id, stored) = self.load_value(raw_id).await?;
        self.check_expiry(&id).await?;
        let marker = self.load_marker(&id).await?;

        let password = password.filter(|p| !p.is_empty());
        if MetadataCodec::decode(marker).requires_password && password.is_none() {
            debug!(secret_id = %id, "Retrieve rejected: password required");
            metrics::record_password_failure("missing").await;
            return Err(Error::PasswordRequired);
        }

        let engine = self.engine.clone();
        let ciphertext = stored.clone();
        let decrypted = tokio::task::spawn_blocking(move || {
            engine.decrypt_from_storage(&ciphertext, marker, password.as_ref())
        })
        .await
        .map_err(|e| Error::internal(format!("Decryption task failed: {}", e)))?;

        let plaintext = match decrypted {
            Ok(plaintext) => plaintext,
            Err(CryptoError::PasswordLayer) => {
                info!(secret_id = %id, "Retrieve rejected: invalid password");
                metrics::record_password_failure("invalid").await;
                return Err(Error::InvalidPassword);
            }
            Err(e) => {
                error!(secret_id = %id, marker = %marker, error = %e, "Failed to decrypt secret");
                return Err(e.into());
            }
        };

        let consumed = self
            .store
            .compare_and_delete(&id.value_key(), &stored)
            .instrument(store_span!("consume", secret_id = %id))
            .await
            .map_err(|e| Error::store(e, "Failed to purge retrieved secret"))?;

        if !consumed {
            warn!(secret_id = %id, "Secret consumed by a concurrent retrieve");
            metrics::record_retrieval_race_lost().await;
            return Err(Error::not_found(id.as_str()));
        }

        for key in [id.metadata_key(), id.expires_key()] {
            if let Err(e) = self.store.delete(&key).await {
                warn!(secret_id = %id, key = %key, error = %e, "Failed to delete secret metadata");
            }
        }

        info!(secret_id = %id, marker = %marker, "Secret retrieved and deleted");
        metrics::record_secret_retrieved(marker.as_str()).await;
        Ok(plaintext)
    }

    async fn persist(
        &self,
        id: &SecretId,
        stored: &str,
        marker: EncryptionMarker,
        expires_at: Option<i64>,
    ) -> Result<()> {
        let result = self.write_entries(id, stored, marker, expires_at).await;
        if result.is_err() {
            self.discard(id).await;
        }
        result
    }

    async fn write_entries(
        &self,
        id: &SecretId,
        stored: &str,
        marker: EncryptionMarker,
        expires_at: Option<i64>,
    ) -> Result<()> {
        self.store
            .set(&id.value_key(), stored)
            .await
            .map_err(|e| Error::store(e, "Failed to store secret value"))?;

        self.store
            .set(&id.metadata_key(), marker.as_str())
            .await
            .map_err(|e| Error::store(e, "Failed to store encryption marker"))?;

        if let Some(expires_at) = expires_at {
            self.store
                .set(&id.expires_key(), &expires_at.to_string())
                .await
                .map_err(|e| Error::store(e, "Failed to store expiry"))?;
        }

        Ok(())
    }

    /// Best-effort removal of a partially written secret.
    async fn discard(&self, id: &SecretId) {
        for key in [id.value_key(), id.metadata_key()] {
            if let Err(e) = self.store.delete(&key).await {
                error!(
                    secret_id = %id,
                    key = %key,
                    error = %e,
                    "Failed to discard partially written secret"
                );
            }
        }
    }

    /// Resolve a caller-supplied id to its stored value.
    ///
    /// A malformed id is reported exactly like an unknown one.
    async fn load_value(&self, raw_id: &str) -> Result<(SecretId, String)> {
        let id = SecretId::parse(raw_id).map_err(|_| Error::not_found(raw_id))?;

        let value = self
            .store
            .get(&id.value_key())
            .await
            .map_err(|e| Error::store(e, "Failed to read secret value"))?;

        match value {
            Some(value) => Ok((id, value)),
            None => Err(Error::not_found(id.as_str())),
        }
    }

    /// Returns the expiry if one is set and still in the future. A passed
    /// expiry purges the secret and yields [`Error::Expired`].
    async fn check_expiry(&self, id: &SecretId) -> Result<Option<i64>> {
        let raw = self
            .store
            .get(&id.expires_key())
            .await
            .map_err(|e| Error::store(e, "Failed to read secret expiry"))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let expires_at: i64 = raw.trim().parse().map_err(|_| {
            error!(secret_id = %id, "Stored expiry is not a UNIX timestamp");
            Error::system_layer("stored expiry is not a valid UNIX timestamp")
        })?;

        if self.clock.now_unix() >= expires_at {
            self.purge(id).instrument(store_span!("purge", secret_id = %id)).await?;
            info!(secret_id = %id, expired_at = expires_at, "Secret expired and deleted");
            metrics::record_secret_expired().await;
            return Err(Error::expired(id.as_str(), expires_at));
        }

        Ok(Some(expires_at))
    }

    async fn load_marker(&self, id: &SecretId) -> Result<EncryptionMarker> {
        let raw = self
            .store
            .get(&id.metadata_key())
            .await
            .map_err(|e| Error::store(e, "Failed to read encryption marker"))?;

        match raw {
            Some(raw) => MetadataCodec::parse(&raw).map_err(|e| {
                error!(secret_id = %id, "Stored encryption marker is not recognized");
                Error::from(e)
            }),
            None => {
                warn!(
                    secret_id = %id,
                    "Encryption marker missing; treating value as legacy plaintext"
                );
                Ok(MetadataCodec::decode_missing())
            }
        }
    }

    async fn purge(&self, id: &SecretId) -> Result<()> {
        for key in id.all_keys() {
            self.store
                .delete(&key)
                .await
                .map_err(|e| Error::store(e, "Failed to purge secret"))?;
        }
        Ok(())
    }
}

/// Label recorded in `secrets_checked_total`. Store and corruption failures
/// say nothing about the secret and are not counted.
fn check_outcome(result: &Result<SecretStatus>) -> Option<&'static str> {
    match result {
        Ok(_) => Some("active"),
        Err(Error::NotFound { .. }) => Some("not_found"),
        Err(Error::Expired { .. }) => Some("expired"),
        Err(_) => None,
    }
}
