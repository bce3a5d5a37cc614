//! Cross-origin request policy.
//!
//! Requests without an `Origin` header pass untouched. Origins must match an
//! allowed origin exactly or one of the configured patterns; anything else is
//! rejected with 403 before routing. Allowed origins get standard CORS
//! response headers (and preflight answers) from `tower-http`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::analytics::{AnalyticsStore, SecurityEventKind};
use crate::config::CorsConfig;
use crate::http::request::ClientAddr;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::mask::mask_ip;

/// Compiled origin allow-list.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl OriginPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, regex::Error> {
        let patterns = config
            .allowed_origin_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            exact: config.allowed_origins.clone(),
            patterns,
        })
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.exact.iter().any(|o| o == origin) || self.patterns.iter().any(|p| p.is_match(origin))
    }
}

/// State of [`cors_guard_middleware`].
#[derive(Clone)]
pub struct CorsGuard {
    pub policy: Arc<OriginPolicy>,
    pub store: Arc<AnalyticsStore>,
}

/// Reject requests from origins outside the policy.
pub async fn cors_guard_middleware(
    State(guard): State<CorsGuard>,
    client: ClientAddr,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    match origin {
        Some(origin) if !guard.policy.allows(&origin) => {
            tracing::warn!(
                client = %client,
                origin = %mask_ip(&origin),
                path = %request.uri().path(),
                "Origin not allowed by CORS"
            );
            metrics::record_cors_rejected();
            guard.store.record_security(SecurityEventKind::CorsViolation);
            ApiError::OriginNotAllowed.into_response()
        }
        _ => next.run(request).await,
    }
}

/// CORS response headers and preflight handling for allowed origins.
pub fn cors_layer(policy: Arc<OriginPolicy>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(false)
}
