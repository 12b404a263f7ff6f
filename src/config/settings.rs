//! # Configuration Settings
//!
//! Defines the configuration structure for the Ephemera secret service.

use crate::domain::SecretString;
use crate::errors::{Error, Result};
use crate::store::VaultConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Default allowed CORS origin
pub const DEFAULT_CORS_ORIGIN: &str = "https://secrets.merabytes.com";

/// Cloudflare Turnstile verification endpoint
pub const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Base64-encoded 32-byte system key
    pub secret_key: SecretString,

    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Secret store configuration
    pub store: StoreConfig,

    /// Human verification configuration
    #[validate(nested)]
    pub verification: VerificationConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)
            .map_err(|e| Error::config(format!("Invalid configuration: {}", e)))?;

        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.secret_key.is_empty() {
            return Err(Error::config("EPHEMERA_SECRET_KEY is required"));
        }

        if self.observability.enable_metrics && self.observability.metrics_port == self.server.port
        {
            return Err(Error::config("API and metrics ports cannot be the same"));
        }

        if let StoreBackend::Vault = self.store.backend {
            match &self.store.vault {
                Some(vault) if !vault.address.is_empty() => {}
                _ => return Err(Error::config("VAULT_ADDR is required for the vault backend")),
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// The single origin allowed by CORS
    #[validate(length(min = 1, message = "CORS origin cannot be empty"))]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which [`SecretStore`](crate::store::SecretStore) adapter to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Vault,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "vault" => Ok(Self::Vault),
            other => Err(Error::config(format!(
                "Unknown store backend '{}', expected 'memory' or 'vault'",
                other
            ))),
        }
    }
}

/// Secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Only read when `backend` is [`StoreBackend::Vault`]
    pub vault: Option<VaultConfig>,
}

/// Human verification (Cloudflare Turnstile) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerificationConfig {
    /// Turnstile secret; verification is disabled when unset
    pub turnstile_secret: Option<SecretString>,

    #[validate(url(message = "Turnstile verify URL must be a valid URL"))]
    pub turnstile_verify_url: String,

    /// Verification request timeout in seconds
    #[validate(range(min = 1, max = 60, message = "Timeout must be between 1 and 60 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            turnstile_secret: None,
            turnstile_verify_url: DEFAULT_TURNSTILE_VERIFY_URL.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl VerificationConfig {
    pub fn is_enabled(&self) -> bool {
        self.turnstile_secret.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            service_name: "ephemera".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}
