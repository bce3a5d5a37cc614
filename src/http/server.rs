//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all API routes
//! - Wire up the ingress layers (tracing, request ID, security headers,
//!   client resolution, accounting, panic recovery, rate limiting, CORS,
//!   body limit, timeout)
//! - Bind the server to a listener and drain on shutdown

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::header::InvalidHeaderValue,
    middleware::{from_fn_with_state, map_response},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::analytics::AnalyticsStore;
use crate::api;
use crate::config::AppConfig;
use crate::directory::Directory;
use crate::health::HealthChecker;
use crate::http::middleware::{json_layer_errors, track_requests};
use crate::http::request::{resolve_client, ClientResolver};
use crate::http::response::ApiError;
use crate::lifecycle::ShutdownSignal;
use crate::security::cors::{cors_guard_middleware, cors_layer};
use crate::security::headers::security_headers_middleware;
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{CorsGuard, OriginPolicy, RateLimiter, SecurityHeaders};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<Directory>,
    pub store: Arc<AnalyticsStore>,
    pub health: Arc<HealthChecker>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid CORS origin pattern: {0}")]
    OriginPattern(#[from] regex::Error),

    #[error("invalid security header value: {0}")]
    SecurityHeader(#[from] InvalidHeaderValue),
}

/// HTTP server for the relief API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server serving `directory` with the given configuration.
    pub fn new(config: AppConfig, directory: Directory) -> Result<Self, ServerError> {
        let store = Arc::new(AnalyticsStore::seeded(&config.analytics, &directory));
        let health = Arc::new(HealthChecker::new(&config, &directory));

        let state = AppState {
            directory: Arc::new(directory),
            store,
            health,
        };

        let router = Self::build_router(&config, state.clone())?;
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Result<Router, ServerError> {
        let api = api::setup_api_router();
        let routes = Router::new()
            .nest("/api", api.clone())
            .merge(api)
            .fallback(api::not_found);
        Self::with_ingress(routes, config, state)
    }

    /// Wrap `routes` in the ingress layers.
    ///
    /// Layers added last run first, so the list below reads inside out.
    #[allow(deprecated)]
    fn with_ingress(
        routes: Router<AppState>,
        config: &AppConfig,
        state: AppState,
    ) -> Result<Router, ServerError> {
        let origins = Arc::new(OriginPolicy::from_config(&config.cors)?);
        let cors_guard = CorsGuard {
            policy: origins.clone(),
            store: state.store.clone(),
        };
        let resolver = ClientResolver {
            trust_forwarded_for: config.security.trust_forwarded_for,
        };

        let mut router = routes
            .with_state(state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(map_response(json_layer_errors))
            .layer(cors_layer(origins))
            .layer(from_fn_with_state(cors_guard, cors_guard_middleware));

        if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::new(&config.rate_limit, state.store.clone()));
            router = router.layer(from_fn_with_state(limiter, rate_limit_middleware));
        }

        // Panics must become 500s inside the accounting layer.
        router = router
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(from_fn_with_state(state.store.clone(), track_requests))
            .layer(from_fn_with_state(resolver, resolve_client));

        if config.security.enable_headers {
            let headers = Arc::new(SecurityHeaders::from_config(&config.security)?);
            router = router.layer(from_fn_with_state(headers, security_headers_middleware));
        }

        Ok(router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http()))
    }

    /// Shared state, for inspection by embedders and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            charities = self.state.directory.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let reason = shutdown.recv().await;
                tracing::info!(reason = %reason, "Shutting down, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
