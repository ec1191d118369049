//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devproxy_resolutions_total` (counter): resolutions by rule, target
//! - `devproxy_requests_total` (counter): requests by method, status, target
//! - `devproxy_request_duration_seconds` (histogram): latency by method, target
//!
//! Requests recorded without an upstream (404s, timeouts) carry `target="none"`.
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_resolution(rule: &str, target: &str) {
    metrics::counter!(
        "devproxy_resolutions_total",
        "rule" => rule.to_string(),
        "target" => target.to_string()
    )
    .increment(1);
}

pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    metrics::counter!(
        "devproxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "devproxy_request_duration_seconds",
        "method" => method.to_string(),
        "target" => target.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
