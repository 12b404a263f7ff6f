//! Request and response bodies for the secrets endpoint.
//!
//! Every request is one JSON object discriminated by its `action` field.

use serde::{Deserialize, Serialize};

use crate::domain::{CreatedSecret, SecretStatus, SecretString};
use crate::errors::{Error, Result};

pub const ACTION_CREATE: &str = "create";
pub const ACTION_CHECK: &str = "check";
pub const ACTION_RETRIEVE: &str = "retrieve";
pub const ACTION_HEALTHCHECK: &str = "healthcheck";

/// A request to the secrets endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SecretRequest {
    Create(CreateSecretBody),
    Check(LookupSecretBody),
    Retrieve(RetrieveSecretBody),
    Healthcheck,
}

impl SecretRequest {
    pub fn action(&self) -> &'static str {
        match self {
            SecretRequest::Create(_) => ACTION_CREATE,
            SecretRequest::Check(_) => ACTION_CHECK,
            SecretRequest::Retrieve(_) => ACTION_RETRIEVE,
            SecretRequest::Healthcheck => ACTION_HEALTHCHECK,
        }
    }

    pub fn turnstile_token(&self) -> Option<&str> {
        let token = match self {
            SecretRequest::Create(body) => body.turnstile_token.as_deref(),
            SecretRequest::Check(body) => body.turnstile_token.as_deref(),
            SecretRequest::Retrieve(body) => body.turnstile_token.as_deref(),
            SecretRequest::Healthcheck => None,
        };
        token.filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSecretBody {
    #[serde(default)]
    pub secret: Option<SecretString>,

    #[serde(default)]
    pub password: Option<SecretString>,

    /// UNIX seconds, as a number or a numeric string.
    #[serde(default)]
    pub expires_at: Option<ExpiryInput>,

    #[serde(default)]
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupSecretBody {
    #[serde(default, alias = "uuid")]
    pub id: Option<String>,

    #[serde(default)]
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveSecretBody {
    #[serde(default, alias = "uuid")]
    pub id: Option<String>,

    #[serde(default)]
    pub password: Option<SecretString>,

    #[serde(default)]
    pub turnstile_token: Option<String>,
}

/// Loosely typed expiry as sent by browser clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpiryInput {
    Seconds(i64),
    Text(String),
}

impl ExpiryInput {
    /// Zero and the empty string mean "never expires".
    pub fn to_unix(&self) -> Result<Option<i64>> {
        let seconds = match self {
            ExpiryInput::Seconds(seconds) => *seconds,
            ExpiryInput::Text(text) if text.trim().is_empty() => return Ok(None),
            ExpiryInput::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                Error::validation_field(
                    "Invalid expires_at format. Expected UNIX timestamp (integer)",
                    "expires_at",
                )
            })?,
        };
        Ok(if seconds == 0 { None } else { Some(seconds) })
    }
}

/// Require an id field, accepting either `id` or `uuid`.
pub fn required_id(id: Option<String>) -> Result<String> {
    id.filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::validation_field("Missing required field: id", "id"))
}

#[derive(Debug, Serialize)]
pub struct CreateSecretResponse {
    pub id: String,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl From<CreatedSecret> for CreateSecretResponse {
    fn from(created: CreatedSecret) -> Self {
        Self {
            id: created.id.to_string(),
            message: "Secret created successfully",
            expires_at: created.expires_at,
        }
    }
}

/// `encrypted` mirrors `requires_password` for older clients.
#[derive(Debug, Serialize)]
pub struct CheckSecretResponse {
    pub requires_password: bool,
    pub encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl From<SecretStatus> for CheckSecretResponse {
    fn from(status: SecretStatus) -> Self {
        Self {
            requires_password: status.requires_password,
            encrypted: status.requires_password,
            expires_at: status.expires_at,
        }
    }
}

/// Carries the disclosed plaintext. Deliberately not `Debug`.
#[derive(Serialize)]
pub struct RetrieveSecretResponse {
    pub secret: String,
    pub message: &'static str,
}

impl RetrieveSecretResponse {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            secret: secret.expose_secret().to_string(),
            message: "Secret retrieved and deleted successfully",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealth {
    pub backend: String,
    pub healthy: bool,
}
