//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): dispatches by service, operation, outcome
//! - `relay_request_duration_seconds` (histogram): dispatch latency
//!
//! Outcomes are `ok`, `connection_refused`, `decode_error` and `rejected`.
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Record one finished dispatch.
pub fn record_dispatch(service: &str, operation: &str, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "relay_requests_total",
        "service" => service.to_string(),
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        "relay_request_duration_seconds",
        "service" => service.to_string(),
        "operation" => operation.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
