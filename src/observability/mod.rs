//! # Observability Infrastructure
//!
//! Structured logging and Prometheus metrics for the Ephemera secret service.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{init_metrics, MetricsRecorder};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging, then metrics if enabled.
pub async fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;

    if config.enable_metrics {
        init_metrics(config).await?;
    }

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        metrics_enabled = %config.enable_metrics,
        "Observability initialized successfully"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_observability_rejects_invalid_log_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = ObservabilityConfig {
            log_level: "ephemera=loudest".to_string(),
            enable_metrics: true,
            ..Default::default()
        };

        let result = init_observability(&config).await;
        assert!(matches!(result, Err(crate::Error::Config(_))));
        assert!(super::metrics::get_metrics().await.is_none());
    }
}
