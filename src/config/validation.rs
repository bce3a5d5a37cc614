//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! consistency. Every problem is collected rather than stopping at the first.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use regex::Regex;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
        if config.rate_limit.max_tracked_clients == 0 {
            errors.push(ValidationError::new(
                "rate_limit.max_tracked_clients",
                "must be greater than 0",
            ));
        }
    }

    for pattern in &config.cors.allowed_origin_patterns {
        if let Err(e) = Regex::new(pattern) {
            errors.push(ValidationError::new(
                "cors.allowed_origin_patterns",
                format!("invalid pattern '{}': {}", pattern, e),
            ));
        }
    }

    if HeaderValue::from_str(&config.security.content_security_policy).is_err() {
        errors.push(ValidationError::new(
            "security.content_security_policy",
            "not a valid header value",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if let Some(addr) = &config.health.database_address {
        if addr.rsplit_once(':').and_then(|(_, port)| port.parse::<u16>().ok()).is_none() {
            errors.push(ValidationError::new(
                "health.database_address",
                format!("'{}' must be host:port", addr),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.window_secs = 0;
        config.cors.allowed_origin_patterns.push("(".into());
        config.health.database_address = Some("db.internal".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "rate_limit.window_secs",
                "cors.allowed_origin_patterns",
                "health.database_address",
            ]
        );
    }

    #[test]
    fn disabled_rate_limit_skips_its_checks() {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }
}
