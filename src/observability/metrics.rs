//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method and status
//! - `gateway_nonces_issued_total` (counter): script nonces issued
//! - `gateway_rewrite_failures_total` (counter): HTML rewrites that fell back
//!   to the original body, by reason

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_nonce_issued() {
    metrics::counter!("gateway_nonces_issued_total").increment(1);
}

pub fn record_rewrite_failure(reason: &'static str) {
    metrics::counter!("gateway_rewrite_failures_total", "reason" => reason).increment(1);
}
