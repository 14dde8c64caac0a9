// packages/proxy/src/observability/mod.rs
//! Logging and metrics setup
//!
//! Library code only emits `tracing` events and `metrics` counters. These
//! functions install the process-wide subscriber and recorder, once.
//!
//! Metrics emitted by the engine:
//!
//! - `proxy_invocations_total`: calls routed through the pipeline
//! - `proxy_identity_calls_total`: `to_string` / `hash` / `equals` calls
//! - `proxy_excluded_calls_total`: calls bypassing interception by policy
//! - `proxy_faults_total`: calls that ended in a fault
//! - `proxy_call_duration_seconds`: histogram, from `TimingInterceptor`

use crate::utils::config::LoggingConfig;
use crate::utils::errors::{ProxyError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    installed.map_err(|e| ProxyError::ObservabilityError(format!("Tracing init failed: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            ProxyError::ObservabilityError(format!("Invalid log level {:?}: {}", config.level, e))
        })
}

/// Install the Prometheus recorder and return its render handle
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ProxyError::ObservabilityError(format!("Metrics init failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "app=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(
            build_filter(&config),
            Err(ProxyError::ObservabilityError(_))
        ));
    }

    #[test]
    fn test_valid_level_accepted() {
        let config = LoggingConfig {
            level: "sentra_lab_proxy=debug,info".to_string(),
            json: true,
        };
        assert!(build_filter(&config).is_ok());
    }
}
