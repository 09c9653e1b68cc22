//! Prometheus exporter

use metrics::Unit;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::ServerError;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: &str) -> Result<(), ServerError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| ServerError::Metrics(format!("invalid listen address '{}': {}", addr, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    metrics::describe_histogram!(
        "lead_intel_inference_latency_ms",
        Unit::Milliseconds,
        "End-to-end latency of one scoring request"
    );
    metrics::describe_counter!("lead_intel_requests_total", "Scoring requests served, by model");
    metrics::describe_counter!("lead_intel_cache_hits_total", "Requests answered from the result cache");
    metrics::describe_counter!("lead_intel_errors_total", "Degraded or failed stages, by stage");

    tracing::info!(%addr, "Prometheus metrics listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_rejected() {
        assert!(matches!(init_metrics("not-an-address"), Err(ServerError::Metrics(_))));
    }
}
