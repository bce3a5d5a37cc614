//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relief_requests_total` (counter): requests by method, route, status
//! - `relief_request_duration_seconds` (histogram): latency distribution
//! - `relief_rate_limited_total` (counter): rejected requests
//! - `relief_cors_rejected_total` (counter): disallowed origins
//! - `relief_analytics_events_total` (counter): events by name and outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and metric-less deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let status = status.to_string();
    counter!(
        "relief_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "relief_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(reason: &'static str) {
    counter!("relief_rate_limited_total", "reason" => reason).increment(1);
}

pub fn record_cors_rejected() {
    counter!("relief_cors_rejected_total").increment(1);
}

pub fn record_analytics_event(event: &str, counted: bool) {
    counter!(
        "relief_analytics_events_total",
        "event" => event.to_string(),
        "counted" => if counted { "true" } else { "false" }
    )
    .increment(1);
}
