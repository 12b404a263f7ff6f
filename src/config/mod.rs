//! # Configuration Management
//!
//! Environment-driven configuration for the Ephemera secret service.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `EPHEMERA_SECRET_KEY` | required, base64 of 32 bytes |
//! | `EPHEMERA_API_BIND_ADDRESS` | `0.0.0.0` |
//! | `EPHEMERA_API_PORT` | `8080` |
//! | `EPHEMERA_CORS_ORIGIN` | `https://secrets.merabytes.com` |
//! | `EPHEMERA_STORE_BACKEND` | `memory` |
//! | `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE`, `VAULT_MOUNT_PATH` | vault backend only |
//! | `EPHEMERA_TURNSTILE_SECRET` | unset, verification disabled |
//! | `EPHEMERA_TURNSTILE_VERIFY_URL` | Cloudflare siteverify |
//! | `EPHEMERA_LOG_LEVEL` | `info` |
//! | `EPHEMERA_JSON_LOGGING` | `false` |
//! | `EPHEMERA_ENABLE_METRICS` | `false` |
//! | `EPHEMERA_METRICS_PORT` | `9090` |

pub mod settings;

pub use settings::{
    AppConfig, ObservabilityConfig, ServerConfig, StoreBackend, StoreConfig, VerificationConfig,
    DEFAULT_CORS_ORIGIN, DEFAULT_TURNSTILE_VERIFY_URL,
};

use crate::domain::SecretString;
use crate::errors::{Error, Result};
use crate::store::VaultConfig;
use std::str::FromStr;

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("EPHEMERA_SECRET_KEY")
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::new)
            .ok_or_else(|| Error::config("EPHEMERA_SECRET_KEY is required"))?;

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            host: lookup("EPHEMERA_API_BIND_ADDRESS").unwrap_or(server_defaults.host),
            port: parse_or(&lookup, "EPHEMERA_API_PORT", server_defaults.port)?,
            cors_origin: lookup("EPHEMERA_CORS_ORIGIN").unwrap_or(server_defaults.cors_origin),
        };

        let backend = match lookup("EPHEMERA_STORE_BACKEND") {
            Some(value) => StoreBackend::from_str(&value)?,
            None => StoreBackend::default(),
        };
        let vault = match backend {
            StoreBackend::Vault => Some(VaultConfig {
                address: lookup("VAULT_ADDR").unwrap_or_default(),
                token: lookup("VAULT_TOKEN"),
                namespace: lookup("VAULT_NAMESPACE"),
                mount_path: lookup("VAULT_MOUNT_PATH").unwrap_or_else(|| "secret".to_string()),
            }),
            StoreBackend::Memory => None,
        };

        let verification_defaults = VerificationConfig::default();
        let verification = VerificationConfig {
            turnstile_secret: lookup("EPHEMERA_TURNSTILE_SECRET")
                .filter(|v| !v.is_empty())
                .map(SecretString::new),
            turnstile_verify_url: lookup("EPHEMERA_TURNSTILE_VERIFY_URL")
                .unwrap_or(verification_defaults.turnstile_verify_url),
            timeout_seconds: verification_defaults.timeout_seconds,
        };

        let observability_defaults = ObservabilityConfig::default();
        let observability = ObservabilityConfig {
            enable_metrics: parse_bool_or(
                &lookup,
                "EPHEMERA_ENABLE_METRICS",
                observability_defaults.enable_metrics,
            )?,
            metrics_port: parse_or(
                &lookup,
                "EPHEMERA_METRICS_PORT",
                observability_defaults.metrics_port,
            )?,
            service_name: observability_defaults.service_name,
            log_level: lookup("EPHEMERA_LOG_LEVEL").unwrap_or(observability_defaults.log_level),
            json_logging: parse_bool_or(
                &lookup,
                "EPHEMERA_JSON_LOGGING",
                observability_defaults.json_logging,
            )?,
        };

        let config = Self {
            secret_key,
            server,
            store: StoreConfig { backend, vault },
            verification,
            observability,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => Err(Error::config(format!("Invalid {}: '{}' is not a boolean", key, other))),
    }
}
