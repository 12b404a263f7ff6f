//! Human verification for the secrets endpoint
//!
//! Requests other than `healthcheck` may be gated behind a Cloudflare
//! Turnstile token. Verification is optional: with no Turnstile secret
//! configured the [`DisabledVerifier`] lets every request through.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::VerificationConfig;
use crate::domain::SecretString;
use crate::errors::{Error, Result};

/// Decides whether a request was made by a human
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Whether requests must carry a verification token at all
    fn is_enabled(&self) -> bool;

    /// Verify a token. Any failure to reach the verification service counts
    /// as a rejection.
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool;
}

/// Verifier used when human verification is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVerifier;

#[async_trait]
impl HumanVerifier for DisabledVerifier {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile siteverify client
pub struct TurnstileVerifier {
    client: Client,
    secret: SecretString,
    verify_url: String,
}

impl TurnstileVerifier {
    /// Build a verifier from configuration.
    ///
    /// Fails if no Turnstile secret is configured or the HTTP client cannot
    /// be created.
    pub fn new(config: &VerificationConfig) -> Result<Self> {
        let secret = config
            .turnstile_secret
            .clone()
            .ok_or_else(|| Error::config("Turnstile secret is not configured"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, secret, verify_url: config.turnstile_verify_url.clone() })
    }
}

impl std::fmt::Debug for TurnstileVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnstileVerifier")
            .field("verify_url", &self.verify_url)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl HumanVerifier for TurnstileVerifier {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        let mut form = vec![("secret", self.secret.expose_secret()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = match self.client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Turnstile verification request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Turnstile verification returned an error status");
            return false;
        }

        match response.json::<SiteVerifyResponse>().await {
            Ok(body) => {
                if !body.success {
                    debug!(error_codes = ?body.error_codes, "Turnstile token rejected");
                }
                body.success
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse Turnstile verification response");
                false
            }
        }
    }
}
