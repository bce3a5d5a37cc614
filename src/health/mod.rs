//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health:
//!     → probe.rs (optional TCP connect to the database)
//!     → memory.rs (process memory, on a blocking thread)
//!     → report.rs (classify healthy/degraded, build payload)
//! ```
//!
//! # Design Decisions
//! - Read-only: reporting never touches the analytics counters
//! - A failed probe degrades the report instead of failing the request

pub mod memory;
pub mod probe;
pub mod report;

pub use probe::{DatabaseProbe, DatabaseState, DatabaseStatus};
pub use report::{HealthChecker, HealthError, HealthReport, HealthStatus};
