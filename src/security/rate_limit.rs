//! Fixed-window rate limiting keyed by the connection's peer address.
//!
//! The masked client address only appears in log lines; forwarded headers
//! never choose the window a request counts against.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::analytics::{AnalyticsStore, SecurityEventKind};
use crate::config::RateLimitConfig;
use crate::http::request::{peer_key, ClientAddr};
use crate::http::response::ApiError;
use crate::observability::metrics;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Requests seen from one client in the current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset: Duration },
    Limited { reset: Duration },
}

pub struct RateLimiter {
    windows: DashMap<String, Window>,
    window: Duration,
    max_requests: u32,
    max_clients: usize,
    exempt_paths: Vec<String>,
    store: Arc<AnalyticsStore>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, store: Arc<AnalyticsStore>) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            max_clients: config.max_tracked_clients.max(1),
            exempt_paths: config.exempt_paths.clone(),
            store,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    /// Count one request from `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> Decision {
        if self.windows.len() >= self.max_clients && !self.windows.contains_key(key) {
            self.sweep(now);
            if self.windows.len() >= self.max_clients {
                self.evict_oldest();
            }
        }

        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        let mut elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window { started: now, count: 0 };
            elapsed = Duration::ZERO;
        }
        let reset = self.window - elapsed;

        if entry.count < self.max_requests {
            entry.count += 1;
            Decision::Allowed {
                remaining: self.max_requests - entry.count,
                reset,
            }
        } else {
            Decision::Limited { reset }
        }
    }

    /// Drop windows that have already expired.
    pub fn sweep(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }

    /// Drop the window that started first.
    fn evict_oldest(&self) {
        let oldest = self
            .windows
            .iter()
            .min_by_key(|entry| entry.started)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.windows.remove(&key);
            tracing::debug!("Rate limiter full, evicted oldest client window");
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Middleware enforcing the per-client window.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    client: ClientAddr,
    request: Request<Body>,
    next: Next,
) -> Response {
    if limiter.is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    let key = peer_key(request.extensions());
    match limiter.check(&key) {
        Decision::Allowed { remaining, reset } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limiter.max_requests()));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
            headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset)));
            response
        }
        Decision::Limited { reset } => {
            tracing::warn!(
                client = %client,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited("window");
            limiter.store.record_security(SecurityEventKind::RateLimit);
            limiter.store.flag_client(&key);

            let retry_after_secs = ceil_secs(reset).max(1);
            let mut response = ApiError::RateLimited { retry_after_secs }.into_response();
            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limiter.max_requests()));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(0u32));
            headers.insert(RATELIMIT_RESET, HeaderValue::from(retry_after_secs));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownKeyPolicy;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        let config = RateLimitConfig {
            enabled: true,
            window_secs,
            max_requests,
            exempt_paths: vec!["/api/health".into()],
            max_tracked_clients: 3,
        };
        RateLimiter::new(&config, Arc::new(AnalyticsStore::new(UnknownKeyPolicy::Insert)))
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            match limiter.check_at("xxx.xxx.1.1", now) {
                Decision::Allowed { remaining, .. } => assert_eq!(remaining, expected_remaining),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(matches!(limiter.check_at("xxx.xxx.1.1", now), Decision::Limited { .. }));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(matches!(limiter.check_at("a", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("b", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), Decision::Limited { .. }));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(1, 10);
        let start = Instant::now();
        assert!(matches!(limiter.check_at("a", start), Decision::Allowed { .. }));

        match limiter.check_at("a", start + Duration::from_secs(4)) {
            Decision::Limited { reset } => assert_eq!(reset, Duration::from_secs(6)),
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            limiter.check_at("a", start + Duration::from_secs(10)),
            Decision::Allowed { remaining: 0, .. }
        ));
    }

    #[test]
    fn sweep_drops_expired_windows() {
        let limiter = limiter(5, 10);
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("new", start + Duration::from_secs(8));

        limiter.sweep(start + Duration::from_secs(12));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn full_table_evicts_oldest_window() {
        let limiter = limiter(1, 60);
        let start = Instant::now();
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            limiter.check_at(key, start + Duration::from_secs(i as u64));
        }
        assert_eq!(limiter.tracked_clients(), 3);

        limiter.check_at("d", start + Duration::from_secs(5));
        assert_eq!(limiter.tracked_clients(), 3);
        assert!(matches!(
            limiter.check_at("b", start + Duration::from_secs(6)),
            Decision::Limited { .. }
        ));
        // "a" was evicted, so it starts a fresh window.
        assert!(matches!(
            limiter.check_at("a", start + Duration::from_secs(7)),
            Decision::Allowed { .. }
        ));
    }

    #[test]
    fn exempt_paths_match_exactly() {
        let limiter = limiter(1, 60);
        assert!(limiter.is_exempt("/api/health"));
        assert!(!limiter.is_exempt("/api/health/extra"));
        assert!(!limiter.is_exempt("/api/charities"));
    }

    #[test]
    fn reset_rounds_up_to_whole_seconds() {
        assert_eq!(ceil_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ceil_secs(Duration::from_secs(3)), 3);
    }
}
