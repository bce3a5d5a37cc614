//! Security response headers.
//!
//! Adds the hardening headers to every response (including error and
//! rate-limit responses) and strips headers that identify the server.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, header::InvalidHeaderValue, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Precomputed header set.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, InvalidHeaderValue> {
        let hsts = format!(
            "max-age={}; includeSubDomains; preload",
            config.hsts_max_age_secs
        );
        let headers = vec![
            (
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_str(&config.content_security_policy)?,
            ),
            (header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_str(&hsts)?),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ),
            (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        ];
        Ok(Self { headers })
    }

    /// Apply the header set to a response in place.
    pub fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers.remove(header::SERVER);
        headers.remove(X_POWERED_BY);
    }
}

pub async fn security_headers_middleware(
    State(headers): State<Arc<SecurityHeaders>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_hardening_and_strips_identity() {
        let headers = SecurityHeaders::from_config(&SecurityConfig::default()).unwrap();

        let mut response = Response::new(Body::empty());
        response
            .headers_mut()
            .insert(header::SERVER, HeaderValue::from_static("hyper"));
        response
            .headers_mut()
            .insert(X_POWERED_BY, HeaderValue::from_static("Express"));

        headers.apply(&mut response);
        let h = response.headers();

        assert_eq!(h[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(h[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(
            h[header::STRICT_TRANSPORT_SECURITY],
            "max-age=31536000; includeSubDomains; preload"
        );
        assert!(h[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'"));
        assert!(h.get(header::SERVER).is_none());
        assert!(h.get(X_POWERED_BY).is_none());
    }

    #[test]
    fn rejects_policy_with_control_characters() {
        let config = SecurityConfig {
            content_security_policy: "default-src 'self'\n".into(),
            ..Default::default()
        };
        assert!(SecurityHeaders::from_config(&config).is_err());
    }
}
