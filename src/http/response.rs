//! Response envelopes and the API error type.
//!
//! Every body is JSON. Errors carry the machine status code plus a fixed
//! human-readable message and a timestamp.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::directory::{FilterError, SubmissionError};

/// Filler text attached to every response body.
pub const MESSAGE: &str = "Allah S.W.T knows best, and we can only guess";

/// Current time as an RFC 3339 string with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Errors returned by API handlers and middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed { allowed: &'static [&'static str] },

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid donation URL")]
    InvalidDonationUrl(String),

    #[error("Invalid query parameter")]
    InvalidQuery(#[from] FilterError),

    #[error("Malformed query string")]
    MalformedQuery(String),

    #[error("Event type required")]
    MissingEvent,

    #[error("Invalid JSON body")]
    InvalidBody { status: StatusCode, detail: String },

    #[error("Not found")]
    NotFound,

    #[error("Not allowed by CORS")]
    OriginNotAllowed,

    #[error("Too many requests from this IP")]
    RateLimited { retry_after_secs: u64 },

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Request timeout")]
    Timeout,

    #[error("Health check failed")]
    HealthCheckFailed(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingFields(_)
            | ApiError::InvalidDonationUrl(_)
            | ApiError::InvalidQuery(_)
            | ApiError::MalformedQuery(_)
            | ApiError::MissingEvent => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::OriginNotAllowed => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::HealthCheckFailed(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        match self {
            ApiError::MethodNotAllowed { allowed } => {
                extra.insert("allowedMethods".into(), json!(allowed));
            }
            ApiError::MissingFields(missing) => {
                extra.insert("required".into(), json!(crate::directory::submission::REQUIRED_FIELDS));
                extra.insert("missing".into(), json!(missing));
            }
            ApiError::InvalidDonationUrl(url) => {
                extra.insert("field".into(), json!("donationUrl"));
                extra.insert("value".into(), json!(url));
            }
            ApiError::InvalidQuery(e) => {
                extra.insert("field".into(), json!(e.field));
                extra.insert("value".into(), json!(e.value));
            }
            ApiError::InvalidBody { detail, .. } | ApiError::MalformedQuery(detail) => {
                extra.insert("detail".into(), json!(detail));
            }
            ApiError::RateLimited { retry_after_secs } => {
                extra.insert("retryAfter".into(), json!(retry_after_secs));
            }
            ApiError::HealthCheckFailed(_) => {
                extra.insert("status".into(), json!("error"));
            }
            ApiError::MissingEvent
            | ApiError::NotFound
            | ApiError::OriginNotAllowed
            | ApiError::PayloadTooLarge
            | ApiError::Timeout
            | ApiError::Internal(_) => {}
        }
        extra
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::MissingFields(missing) => ApiError::MissingFields(missing),
            SubmissionError::InvalidDonationUrl(url) => ApiError::InvalidDonationUrl(url),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(detail) | ApiError::HealthCheckFailed(detail) = &self {
            tracing::error!(error = %detail, "{}", self);
        }

        let mut body = Map::new();
        body.insert("error".into(), json!(self.to_string()));
        body.insert("message".into(), json!(MESSAGE));
        body.insert("timestamp".into(), json!(timestamp()));
        body.extend(self.details());

        let mut response = (status, Json(Value::Object(body))).into_response();
        match &self {
            ApiError::MethodNotAllowed { allowed } => {
                if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
            }
            ApiError::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }
        response
    }
}
