//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, ingress layers)
//!     → request.rs (request ID, masked client address)
//!     → middleware/ (timing, access log, performance counters)
//!     → [api routes]
//!     → response.rs (JSON envelopes and errors)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientAddr, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer, ServerError};
