//! Metrics collection and exposition.
//!
//! # Metrics
//! - `webfn_client_requests_total` (counter): client exchanges by method, status
//! - `webfn_client_errors_total` (counter): failed exchanges by method
//! - `webfn_client_request_duration_seconds` (histogram): exchange latency
//! - `webfn_server_requests_total` (counter): served requests by method, status
//! - `webfn_server_request_duration_seconds` (histogram): handler latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in via configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_client_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "webfn_client_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "webfn_client_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_client_error(method: &str) {
    metrics::counter!("webfn_client_errors_total", "method" => method.to_string()).increment(1);
}

pub fn record_server_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "webfn_server_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "webfn_server_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
