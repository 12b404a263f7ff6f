//! Handlers for the secrets endpoint and the health endpoint.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::api::dto::{
    required_id, CheckSecretResponse, CreateSecretBody, CreateSecretResponse, HealthResponse,
    LookupSecretBody, RetrieveSecretBody, RetrieveSecretResponse, SecretRequest, StoreHealth,
    ACTION_CHECK, ACTION_CREATE, ACTION_HEALTHCHECK, ACTION_RETRIEVE,
};
use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::observability::metrics;
use crate::request_span;

const MISSING_BODY: &str =
    "Missing request body. Expected fields: action, secret (for create), id (for retrieve/check)";
const INVALID_ACTION: &str =
    "Invalid or missing action. Must be \"create\", \"retrieve\", \"check\", or \"healthcheck\"";
const MISSING_TOKEN: &str = "Missing required field: turnstile_token (bot protection enabled)";
const REJECTED_TOKEN: &str = "Invalid or expired Turnstile token";

/// Single entry point for every secret action.
///
/// The body is parsed by hand so that malformed JSON, a missing body and an
/// unknown action all produce the same error shape as every other failure.
pub async fn secrets_handler(
    State(state): State<ApiState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let span = request_span!("POST", uri.path());

    let (action, response) = async {
        match parse_request(&body) {
            Ok(request) => {
                let action = request.action();
                tracing::Span::current().record("action", action);
                let response = match dispatch(&state, &headers, request).await {
                    Ok(response) => response,
                    Err(err) => err.into_response(),
                };
                (action, response)
            }
            Err(err) => ("invalid", err.into_response()),
        }
    }
    .instrument(span)
    .await;

    metrics::record_http_request(
        action,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    )
    .await;
    response
}

/// Liveness check that also reports whether the secret store answers.
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.manager.store();
    let healthy = match store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(backend = store.backend_name(), error = %e, "Store health check failed");
            false
        }
    };

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: crate::VERSION.to_string(),
        store: Some(StoreHealth { backend: store.backend_name().to_string(), healthy }),
    };
    (status, Json(body))
}

fn parse_request(body: &[u8]) -> Result<SecretRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request(MISSING_BODY));
    }

    // Only the error category is logged; serde messages can quote the input.
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(category = ?e.classify(), "Rejected malformed request body");
        ApiError::bad_request("Request body must be valid JSON")
    })?;

    let action = value.get("action").and_then(Value::as_str).map(str::to_owned);
    if !matches!(
        action.as_deref(),
        Some(ACTION_CREATE | ACTION_CHECK | ACTION_RETRIEVE | ACTION_HEALTHCHECK)
    ) {
        return Err(ApiError::bad_request(INVALID_ACTION));
    }

    serde_json::from_value(value).map_err(|e| {
        debug!(category = ?e.classify(), action = ?action, "Rejected invalid request fields");
        ApiError::bad_request("Invalid request fields for action")
    })
}

async fn dispatch(
    state: &ApiState,
    headers: &HeaderMap,
    request: SecretRequest,
) -> Result<Response, ApiError> {
    if !matches!(request, SecretRequest::Healthcheck) {
        verify_human(state, headers, &request).await?;
    }

    match request {
        SecretRequest::Create(body) => create_secret(state, body).await,
        SecretRequest::Check(body) => check_secret(state, body).await,
        SecretRequest::Retrieve(body) => retrieve_secret(state, body).await,
        SecretRequest::Healthcheck => Ok(healthcheck().into_response()),
    }
}

async fn create_secret(state: &ApiState, body: CreateSecretBody) -> Result<Response, ApiError> {
    let secret = body
        .secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: secret"))?;
    let expires_at = body.expires_at.map(|e| e.to_unix()).transpose()?.flatten();

    let created = state.manager.create(secret, body.password, expires_at).await?;
    Ok((StatusCode::CREATED, Json(CreateSecretResponse::from(created))).into_response())
}

async fn check_secret(state: &ApiState, body: LookupSecretBody) -> Result<Response, ApiError> {
    let id = required_id(body.id)?;
    let status = state.manager.check(&id).await?;
    Ok(Json(CheckSecretResponse::from(status)).into_response())
}

async fn retrieve_secret(
    state: &ApiState,
    body: RetrieveSecretBody,
) -> Result<Response, ApiError> {
    let id = required_id(body.id)?;
    let plaintext = state.manager.retrieve(&id, body.password).await?;
    Ok(Json(RetrieveSecretResponse::new(&plaintext)).into_response())
}

fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        store: None,
    })
}

async fn verify_human(
    state: &ApiState,
    headers: &HeaderMap,
    request: &SecretRequest,
) -> Result<(), ApiError> {
    if !state.verifier.is_enabled() {
        return Ok(());
    }

    let token = match request.turnstile_token() {
        Some(token) => token,
        None => {
            metrics::record_verification("missing").await;
            return Err(ApiError::bad_request(MISSING_TOKEN));
        }
    };

    let remote_ip = client_ip(headers);
    if state.verifier.verify(token, remote_ip.as_deref()).await {
        metrics::record_verification("passed").await;
        Ok(())
    } else {
        debug!(remote_ip = ?remote_ip, "Human verification rejected");
        metrics::record_verification("rejected").await;
        Err(ApiError::forbidden(REJECTED_TOKEN))
    }
}

/// Best-effort client address for human verification.
///
/// Prefers Cloudflare's `CF-Connecting-IP`, then the first `X-Forwarded-For`
/// entry, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(ip) = header("cf-connecting-ip") {
        return Some(ip.trim().to_string());
    }
    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    header("x-real-ip").map(|ip| ip.trim().to_string())
}
