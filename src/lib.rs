//! Charity directory and donation analytics API.

pub mod analytics;
pub mod api;
pub mod config;
pub mod directory;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::AppConfig;
pub use directory::Directory;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
