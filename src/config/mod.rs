//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → HttpServer::new (builds every subsystem from it)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_runtime_config, ConfigError, EnvOverride};
pub use schema::{
    AnalyticsConfig, AppConfig, CorsConfig, DirectoryConfig, Environment,
    HealthConfig, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig,
    SecurityConfig, TimeoutConfig, UnknownKeyPolicy,
};
