//! Analytics subsystem.
//!
//! # Data Flow
//! ```text
//! POST /analytics {event, data}
//!     → event.rs (AnalyticsEvent::parse)
//!     → store.rs (lock, apply, unlock)
//!     → counters.rs (monotonic counter tree)
//!
//! Request layer (rate limiter, CORS, request timing)
//!     → store.rs (security / performance counters)
//!
//! GET /analytics?type=..
//!     → snapshot.rs (read-only views)
//! ```
//!
//! # Design Decisions
//! - Process-lifetime only: nothing is persisted or shared between instances
//! - The store is passed by Arc, never held in a global

pub mod counters;
pub mod event;
pub mod snapshot;
pub mod store;

pub use counters::{AnalyticsCounters, KeyRules};
pub use event::{AnalyticsEvent, EventRequest, SecurityEventKind};
pub use snapshot::SnapshotKind;
pub use store::AnalyticsStore;
