//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define invocation metrics (count, latency, errors)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-route and aggregate metrics
//!
//! # Metrics
//! - `lambda_invocations_total` (counter): requests by method, route, status
//! - `lambda_invocation_duration_seconds` (histogram): latency distribution
//! - `lambda_jwks_fetches_total` (counter): key-set downloads by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Unmatched requests are labelled with route `none`

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one request served (or refused) by the dispatcher.
pub fn record_invocation(method: &str, route: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let route = route.to_string();
    let status = status.to_string();

    ::metrics::counter!(
        "lambda_invocations_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "lambda_invocation_duration_seconds",
        "method" => method,
        "route" => route,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one key-set download attempt.
pub fn record_key_fetch(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("lambda_jwks_fetches_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_invocation("GET", "/items", 200, Instant::now());
        record_key_fetch(false);
    }
}
