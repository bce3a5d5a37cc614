//! JSON API routes.
//!
//! Each resource is its own sub-router so it can carry its own
//! `X-Relief-Service` and `Cache-Control` headers. Unsupported methods fall
//! through to a 405 that lists the allowed ones.

pub mod analytics;
pub mod charities;
pub mod health;

use axum::{
    http::{header, HeaderName, HeaderValue},
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::response::ApiError;
use crate::http::server::AppState;

pub const X_RELIEF_SERVICE: HeaderName = HeaderName::from_static("x-relief-service");

/// Routes for `/health`, `/charities` and `/analytics`.
pub fn setup_api_router() -> Router<AppState> {
    let health = Router::new().route(
        "/health",
        get(health::health_check).fallback(get_only),
    );
    let charities = Router::new().route(
        "/charities",
        get(charities::list_charities)
            .post(charities::submit_charity)
            .fallback(get_or_post),
    );
    let analytics = Router::new().route(
        "/analytics",
        get(analytics::get_snapshot)
            .post(analytics::track_event)
            .fallback(get_or_post),
    );

    Router::new()
        .merge(with_service_headers(
            health,
            "Health Check API",
            "no-cache, no-store, must-revalidate",
        ))
        .merge(with_service_headers(
            charities,
            "Charity API",
            "public, max-age=300, s-maxage=300",
        ))
        .merge(with_service_headers(
            analytics,
            "Analytics API",
            "private, max-age=60",
        ))
}

fn with_service_headers(
    router: Router<AppState>,
    service: &'static str,
    cache_control: &'static str,
) -> Router<AppState> {
    router
        .layer(SetResponseHeaderLayer::overriding(
            X_RELIEF_SERVICE,
            HeaderValue::from_static(service),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        ))
}

async fn get_only() -> ApiError {
    ApiError::MethodNotAllowed { allowed: &["GET"] }
}

async fn get_or_post() -> ApiError {
    ApiError::MethodNotAllowed {
        allowed: &["GET", "POST"],
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
