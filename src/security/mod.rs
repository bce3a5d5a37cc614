//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (hardening headers on the way out)
//!     → mask.rs (client address masked once, at ingress)
//!     → rate_limit.rs (per-client fixed window)
//!     → cors.rs (origin allow-list, preflight)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Rejections are counted in the analytics store's security counters
//! - No trust in client input

pub mod cors;
pub mod headers;
pub mod mask;
pub mod rate_limit;

pub use cors::{CorsGuard, OriginPolicy};
pub use headers::SecurityHeaders;
pub use mask::mask_ip;
pub use rate_limit::RateLimiter;
