use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::errors::{Error, Result};
use crate::services::SecretLifecycleManager;

use super::{
    handlers::{health_handler, secrets_handler},
    verification::HumanVerifier,
};

#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<SecretLifecycleManager>,
    pub verifier: Arc<dyn HumanVerifier>,
}

impl ApiState {
    pub fn new(manager: Arc<SecretLifecycleManager>, verifier: Arc<dyn HumanVerifier>) -> Self {
        Self { manager, verifier }
    }
}

/// Build the CORS policy for a single allowed origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| Error::config(format!("Invalid CORS origin '{}': {}", origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn build_router(state: ApiState, cors_origin: &str) -> Result<Router> {
    let router = Router::new()
        .route("/", post(secrets_handler))
        .route("/api/v1/secrets", post(secrets_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
