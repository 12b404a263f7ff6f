//! # Metrics Collection
//!
//! Prometheus metrics for the secret lifecycle and the HTTP surface.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record an HTTP action and its response status
    pub fn record_http_request(&self, action: &str, status: u16, duration: f64) {
        let labels = [("action", action.to_string()), ("status", status.to_string())];
        counter!("http_requests_total", &labels).increment(1);

        let duration_labels = [("action", action.to_string())];
        histogram!("http_request_duration_seconds", &duration_labels).record(duration);
    }

    /// Record a created secret
    pub fn record_secret_created(&self, password_protected: bool, expiring: bool) {
        let labels = [
            ("password_protected", password_protected.to_string()),
            ("expiring", expiring.to_string()),
        ];
        counter!("secrets_created_total", &labels).increment(1);
    }

    /// Record the outcome of a check
    pub fn record_secret_checked(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("secrets_checked_total", &labels).increment(1);
    }

    /// Record a successful one-time retrieval
    pub fn record_secret_retrieved(&self, marker: &str) {
        let labels = [("marker", marker.to_string())];
        counter!("secrets_retrieved_total", &labels).increment(1);
    }

    /// Record a secret purged because its expiry had passed
    pub fn record_secret_expired(&self) {
        counter!("secrets_expired_total").increment(1);
    }

    /// Record a retrieve rejected for a missing or wrong password
    pub fn record_password_failure(&self, reason: &str) {
        let labels = [("reason", reason.to_string())];
        counter!("secret_password_failures_total", &labels).increment(1);
    }

    /// Record a retrieve that decrypted but lost the conditional delete
    pub fn record_retrieval_race_lost(&self) {
        counter!("secret_retrieval_races_lost_total").increment(1);
    }

    /// Record a human verification outcome
    pub fn record_verification(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("human_verifications_total", &labels).increment(1);
    }

    /// Describe all metrics so the exporter emits HELP lines
    pub fn register_metrics(&self) {
        describe_counter!("http_requests_total", Unit::Count, "API requests by action and status");
        describe_histogram!(
            "http_request_duration_seconds",
            Unit::Seconds,
            "API request handling latency by action"
        );
        describe_counter!("secrets_created_total", Unit::Count, "Secrets created");
        describe_counter!("secrets_checked_total", Unit::Count, "Secret checks by outcome");
        describe_counter!("secrets_retrieved_total", Unit::Count, "Secrets disclosed and purged");
        describe_counter!("secrets_expired_total", Unit::Count, "Secrets purged on expiry");
        describe_counter!(
            "secret_password_failures_total",
            Unit::Count,
            "Retrieves rejected for a missing or wrong password"
        );
        describe_counter!(
            "secret_retrieval_races_lost_total",
            Unit::Count,
            "Retrieves that lost the purge race to a concurrent retrieve"
        );
        describe_counter!(
            "human_verifications_total",
            Unit::Count,
            "Human verification outcomes"
        );

        counter!("secrets_expired_total").absolute(0);
        counter!("secret_retrieval_races_lost_total").absolute(0);
    }
}

/// Global metrics recorder instance
static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    let builder = PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name);

    builder
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }

    recorder.register_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Get the global metrics recorder
pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

/// Record an HTTP action using the global metrics recorder
pub async fn record_http_request(action: &str, status: u16, duration: f64) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_http_request(action, status, duration);
    }
}

/// Record a created secret via the global recorder
pub async fn record_secret_created(password_protected: bool, expiring: bool) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_secret_created(password_protected, expiring);
    }
}

/// Record a check outcome via the global recorder
pub async fn record_secret_checked(outcome: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_secret_checked(outcome);
    }
}

/// Record a successful retrieval via the global recorder
pub async fn record_secret_retrieved(marker: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_secret_retrieved(marker);
    }
}

/// Record an expiry purge via the global recorder
pub async fn record_secret_expired() {
    if let Some(metrics) = get_metrics().await {
        metrics.record_secret_expired();
    }
}

/// Record a password failure via the global recorder
pub async fn record_password_failure(reason: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_password_failure(reason);
    }
}

/// Record a lost retrieval race via the global recorder
pub async fn record_retrieval_race_lost() {
    if let Some(metrics) = get_metrics().await {
        metrics.record_retrieval_race_lost();
    }
}

/// Record a human verification outcome via the global recorder
pub async fn record_verification(outcome: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_verification(outcome);
    }
}
