//! Common test utilities for all integration tests.
//!
//! Builds a lifecycle manager over the in-memory store with a controllable
//! clock, and drives the HTTP router without binding a socket.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use ephemera::{
    api::{build_router, ApiState, DisabledVerifier, HumanVerifier},
    crypto::{EncryptionEngine, SymmetricKey, SystemKey},
    services::{ManualClock, SecretLifecycleManager},
    store::MemorySecretStore,
};
use serde_json::Value;
use tower::ServiceExt;

/// Fixed "now" for tests, 2023-11-14T22:13:20Z.
pub const NOW: i64 = 1_700_000_000;

pub const CORS_ORIGIN: &str = "https://secrets.example.test";

pub fn system_key(byte: u8) -> SystemKey {
    SystemKey::new(SymmetricKey::new([byte; 32]))
}

pub fn engine() -> EncryptionEngine {
    EncryptionEngine::new(system_key(0x42))
}

pub struct TestApp {
    pub manager: Arc<SecretLifecycleManager>,
    pub store: MemorySecretStore,
    pub clock: Arc<ManualClock>,
    verifier: Arc<dyn HumanVerifier>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_verifier(Arc::new(DisabledVerifier))
    }

    pub fn with_verifier(verifier: Arc<dyn HumanVerifier>) -> Self {
        let store = MemorySecretStore::new();
        let clock = Arc::new(ManualClock::new(NOW));
        let manager = Arc::new(SecretLifecycleManager::with_clock(
            Arc::new(store.clone()),
            engine(),
            clock.clone(),
        ));
        Self { manager, store, clock, verifier }
    }

    pub fn router(&self) -> Router {
        let state = ApiState::new(self.manager.clone(), self.verifier.clone());
        build_router(state, CORS_ORIGIN).expect("build router")
    }

    /// POST a JSON body to `path` and return status and parsed body.
    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        self.post_raw(path, bytes).await
    }

    pub async fn post_raw(&self, path: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(body.into())
            .expect("build request");

        let response = self.router().oneshot(request).await.expect("request");
        let status = response.status();
        (status, read_json(response.into_body()).await)
    }

    pub async fn action(&self, body: Value) -> (StatusCode, Value) {
        self.post("/", body).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn read_json(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.expect("read response body as bytes");
    serde_json::from_slice(&bytes).expect("parse json response")
}
