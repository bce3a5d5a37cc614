//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relief API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin request policy.
    pub cors: CorsConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,

    /// Health endpoint thresholds and database probe.
    pub health: HealthConfig,

    /// Analytics counter behaviour.
    pub analytics: AnalyticsConfig,

    /// Charity catalog source.
    pub directory: DirectoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total handler time) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Length of one counting window in seconds.
    pub window_secs: u64,

    /// Requests allowed per client within one window.
    pub max_requests: u32,

    /// Paths never counted against the limit.
    pub exempt_paths: Vec<String>,

    /// Client windows held at once; the oldest is evicted beyond this.
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 15 * 60,
            max_requests: 100,
            exempt_paths: vec!["/api/health".to_string(), "/health".to_string()],
            max_tracked_clients: 10_000,
        }
    }
}

/// Cross-origin request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed by exact match.
    pub allowed_origins: Vec<String>,

    /// Regular expressions an origin may match instead.
    pub allowed_origin_patterns: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://localhost:3000".to_string(),
            ],
            allowed_origin_patterns: Vec::new(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,

    /// Value of the Content-Security-Policy header.
    pub content_security_policy: String,

    /// HSTS max-age in seconds.
    pub hsts_max_age_secs: u64,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Log the first X-Forwarded-For hop as the client address.
    ///
    /// Only meaningful behind a proxy that overwrites the header. The rate
    /// limiter always keys on the socket peer.
    pub trust_forwarded_for: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            content_security_policy: concat!(
                "default-src 'self'; ",
                "style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; ",
                "script-src 'self' 'unsafe-inline'; ",
                "font-src 'self' https://fonts.gstatic.com; ",
                "img-src 'self' data: https: blob:; ",
                "connect-src 'self' https: wss:; ",
                "frame-src 'none'; ",
                "object-src 'none'; ",
                "upgrade-insecure-requests"
            )
            .to_string(),
            hsts_max_age_secs: 31_536_000,
            max_body_size: 10 * 1024 * 1024, // 10MB
            trust_forwarded_for: false,
        }
    }
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Database address probed with a TCP connect ("host:port").
    pub database_address: Option<String>,

    /// Probe timeout in milliseconds.
    pub database_timeout_ms: u64,

    /// Resident memory ceiling in megabytes.
    pub max_memory_mb: u64,

    /// Report generation ceiling in milliseconds.
    pub max_response_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            database_address: None,
            database_timeout_ms: 2_000,
            max_memory_mb: 900,
            max_response_ms: 5_000,
        }
    }
}

/// What to do with a counter key the store has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    /// Create the counter on first sight.
    #[default]
    Insert,
    /// Drop the increment.
    Ignore,
}

/// Analytics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub unknown_keys: UnknownKeyPolicy,

    /// Keys one counter map may hold; new keys beyond this are dropped.
    pub max_counter_keys: usize,

    /// Distinct rate-limited clients remembered as suspicious.
    pub max_flagged_clients: usize,

    /// Country counters present at startup.
    pub countries: Vec<String>,

    /// Referrer counters present at startup.
    pub referrers: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::Insert,
            max_counter_keys: 256,
            max_flagged_clients: 10_000,
            countries: [
                "United States",
                "United Kingdom",
                "Canada",
                "Australia",
                "Germany",
                "Others",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            referrers: ["Direct", "Social Media", "Search Engines", "Other Websites"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Charity catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DirectoryConfig {
    /// JSON file replacing the built-in catalog.
    pub catalog_path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
