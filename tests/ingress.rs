//! Ingress layer tests: rate limiting, CORS, security headers, request IDs
//! and body limits.

use relief_api::config::AppConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

fn limited_config(max_requests: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.rate_limit.max_requests = max_requests;
    config
}

#[tokio::test]
async fn test_rate_limit_rejects_and_counts() {
    let server = common::start_server(28401, limited_config(3)).await;
    let url = server.url("/api/charities");

    for expected_remaining in ["2", "1", "0"] {
        let res = server
            .client
            .get(&url)
            .header("x-forwarded-for", "203.0.113.9")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["ratelimit-limit"], "3");
        assert_eq!(res.headers()["ratelimit-remaining"], expected_remaining);
    }

    let res = server
        .client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("retry-after"));
    assert_eq!(res.headers()["ratelimit-remaining"], "0");
    // Hardening headers apply to rejections too.
    assert_eq!(res.headers()["x-frame-options"], "DENY");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests from this IP");
    assert!(body["retryAfter"].as_u64().unwrap() > 0);

    // A second rejection counts again but flags the client only once.
    server
        .client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();
    let security = server.store.security();
    assert_eq!(security.rate_limit_hits, 2);
    assert_eq!(security.suspicious_ips, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_rotating_forwarded_for_stays_limited() {
    let mut config = limited_config(1);
    config.security.trust_forwarded_for = true;
    let server = common::start_server(28410, config).await;
    let url = server.url("/api/charities");

    let mut statuses = Vec::new();
    for i in 0..5 {
        let res = server
            .client
            .get(&url)
            .header("x-forwarded-for", format!("1.1.1.{}", i))
            .send()
            .await
            .unwrap();
        statuses.push(res.status());
    }
    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
    // One socket peer, so one suspicious client.
    assert_eq!(server.store.security().suspicious_ips, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_health_is_exempt_from_rate_limit() {
    let server = common::start_server(28402, limited_config(1)).await;

    for _ in 0..3 {
        let res = server
            .client
            .get(server.url("/api/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.headers().contains_key("ratelimit-limit"));
    }

    server.stop().await;
}

#[tokio::test]
async fn test_disallowed_origin_is_forbidden() {
    let server = common::start_server(28403, AppConfig::default()).await;

    let res = server
        .client
        .get(server.url("/api/charities"))
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Not allowed by CORS");
    assert_eq!(server.store.security().cors_violations, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_allowed_origin_gets_cors_headers() {
    let server = common::start_server(28404, AppConfig::default()).await;

    let res = server
        .client
        .get(server.url("/api/charities"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );

    let res = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/api/analytics"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let methods = res.headers()["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));

    server.stop().await;
}

#[tokio::test]
async fn test_origin_patterns() {
    let mut config = AppConfig::default();
    config.cors.allowed_origin_patterns = vec![r"\.vercel\.app$".into()];
    let server = common::start_server(28405, config).await;

    let res = server
        .client
        .get(server.url("/api/health"))
        .header("origin", "https://relief-preview.vercel.app")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn test_security_headers_present() {
    let server = common::start_server(28406, AppConfig::default()).await;

    for path in ["/api/health", "/api/missing"] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        let headers = res.headers();
        assert!(headers["content-security-policy"]
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'"));
        assert_eq!(
            headers["strict-transport-security"],
            "max-age=31536000; includeSubDomains; preload"
        );
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
        assert!(!headers.contains_key("x-powered-by"));
    }

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let server = common::start_server(28407, AppConfig::default()).await;

    let res = server
        .client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let res = server
        .client
        .get(server.url("/api/health"))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-abc-123");

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.security.max_body_size = 64;
    let server = common::start_server(28408, config).await;

    let res = server
        .client
        .post(server.url("/api/charities"))
        .json(&json!({
            "name": "Big",
            "description": "x".repeat(200),
            "donationUrl": "https://example.org"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Payload too large");
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn test_requests_feed_performance_counters() {
    let server = common::start_server(28409, AppConfig::default()).await;

    for _ in 0..3 {
        server
            .client
            .get(server.url("/charities"))
            .send()
            .await
            .unwrap();
    }

    let perf = server.store.performance();
    assert!(perf.total_requests >= 3);
    assert_eq!(perf.server_error_rate, 0.0);

    server.stop().await;
}
