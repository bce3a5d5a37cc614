//! Per-request accounting.
//!
//! Times every request, feeds the analytics performance counters and the
//! Prometheus metrics, and writes one access log line with the masked
//! client address.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::analytics::AnalyticsStore;
use crate::http::request::{request_id, user_agent, ClientAddr};
use crate::observability::metrics;

/// Metric label for a path. Keeps label cardinality bounded.
pub fn route_label(path: &str) -> &'static str {
    let path = path.strip_prefix("/api").unwrap_or(path);
    match path {
        "/health" => "/health",
        "/charities" => "/charities",
        "/analytics" => "/analytics",
        _ => "unmatched",
    }
}

pub async fn track_requests(
    State(store): State<Arc<AnalyticsStore>>,
    client: ClientAddr,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let id = request_id(request.headers()).to_string();
    let agent = user_agent(request.headers()).to_string();

    let response = next.run(request).await;

    let status = response.status();
    let latency = start.elapsed();
    store.record_request(latency, status.is_server_error());
    metrics::record_request(method.as_str(), status.as_u16(), route_label(&path), start);

    tracing::info!(
        request_id = %id,
        client = %client,
        method = %method,
        path = %path,
        status = status.as_u16(),
        latency_ms = latency.as_millis() as u64,
        user_agent = %agent,
        "Request completed"
    );

    response
}
