//! End-to-end tests of the JSON API.

use relief_api::config::{AppConfig, UnknownKeyPolicy};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_verified_charities_with_limit() {
    let server = common::start_server(28301, AppConfig::default()).await;

    let res = server
        .client
        .get(server.url("/api/charities?verified=true&limit=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-relief-service"], "Charity API");
    assert_eq!(
        res.headers()["cache-control"],
        "public, max-age=300, s-maxage=300"
    );

    let body: Value = res.json().await.unwrap();
    let ids: Vec<&str> = body["charities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["islamic-relief", "muslim-aid"]);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["available"], 6);
    assert_eq!(body["meta"]["categories"].as_array().unwrap().len(), 5);
    assert!(body["meta"]["message"].as_str().unwrap().starts_with("Allah"));

    server.stop().await;
}

#[tokio::test]
async fn test_category_filter_is_case_insensitive() {
    let server = common::start_server(28302, AppConfig::default()).await;

    let body: Value = server
        .client
        .get(server.url("/charities?category=medical"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = body["charities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["muslim-aid", "map-uk"]);

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_query_value_is_rejected() {
    let server = common::start_server(28303, AppConfig::default()).await;

    let res = server
        .client
        .get(server.url("/api/charities?limit=lots"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid query parameter");
    assert_eq!(body["field"], "limit");
    assert_eq!(body["value"], "lots");

    server.stop().await;
}

#[tokio::test]
async fn test_charity_submission() {
    let server = common::start_server(28304, AppConfig::default()).await;

    let res = server
        .client
        .post(server.url("/api/charities"))
        .json(&json!({
            "name": "Gaza Water Project",
            "description": "Solar-powered desalination units",
            "donationUrl": "https://example.org/donate",
            "category": "Infrastructure"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "pending_review");
    assert_eq!(body["reviewTime"], "2-5 business days");
    assert!(body["submissionId"].as_str().unwrap().starts_with("relief-"));

    // Nothing is persisted.
    let list: Value = server
        .client
        .get(server.url("/api/charities"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["meta"]["total"], 6);

    server.stop().await;
}

#[tokio::test]
async fn test_submission_missing_fields() {
    let server = common::start_server(28305, AppConfig::default()).await;

    let res = server
        .client
        .post(server.url("/api/charities"))
        .json(&json!({ "name": "Half a submission" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["required"], json!(["name", "description", "donationUrl"]));
    assert_eq!(body["missing"], json!(["description", "donationUrl"]));

    server.stop().await;
}

#[tokio::test]
async fn test_submission_rejects_relative_url() {
    let server = common::start_server(28306, AppConfig::default()).await;

    let res = server
        .client
        .post(server.url("/api/charities"))
        .json(&json!({
            "name": "Somewhere",
            "description": "Somehow",
            "donationUrl": "donate-here"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["field"], "donationUrl");

    server.stop().await;
}

#[tokio::test]
async fn test_non_json_body_is_rejected() {
    let server = common::start_server(28307, AppConfig::default()).await;

    let res = server
        .client
        .post(server.url("/api/analytics"))
        .header("content-type", "text/plain")
        .body("event=donation_click")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Invalid JSON body");

    let res = server
        .client
        .post(server.url("/api/analytics"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn test_donation_click_end_to_end() {
    let server = common::start_server(28308, AppConfig::default()).await;

    let res = server
        .client
        .post(server.url("/api/analytics"))
        .json(&json!({
            "event": "donation_click",
            "data": { "charityId": "islamic-relief", "category": "Emergency Aid" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let ack: Value = res.json().await.unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["event"], "donation_click");
    assert!(ack["timestamp"].is_string());

    let body: Value = server
        .client
        .get(server.url("/api/analytics?type=donations"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalClicks"], 1);
    assert_eq!(body["todayClicks"], 1);
    assert_eq!(body["charitiesClicked"]["islamic-relief"], 1);
    assert_eq!(body["charitiesClicked"]["muslim-aid"], 0);
    assert_eq!(body["categoryClicks"]["Emergency Aid"], 1);

    server.stop().await;
}

#[tokio::test]
async fn test_repeated_clicks_count_exactly() {
    let server = common::start_server(28309, AppConfig::default()).await;

    for _ in 0..5 {
        server
            .client
            .post(server.url("/analytics"))
            .json(&json!({ "event": "donation_click", "data": { "charityId": "map-uk" } }))
            .send()
            .await
            .unwrap();
    }

    let donations = server.store.donations();
    assert_eq!(donations.total_clicks, 5);
    assert_eq!(donations.charities_clicked["map-uk"], 5);
    assert_eq!(donations.category_clicks["Medical Support"], 0);

    server.stop().await;
}

#[tokio::test]
async fn test_ignore_policy_leaves_unknown_country_uncounted() {
    let mut config = AppConfig::default();
    config.analytics.unknown_keys = UnknownKeyPolicy::Ignore;
    let server = common::start_server(28310, config).await;

    server
        .client
        .post(server.url("/api/analytics"))
        .json(&json!({ "event": "page_view", "data": { "country": "Atlantis" } }))
        .send()
        .await
        .unwrap();

    let body: Value = server
        .client
        .get(server.url("/api/analytics?type=visitors"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["today"], 1);
    assert!(body["countries"].get("Atlantis").is_none());
    assert!(body["countries"]
        .as_object()
        .unwrap()
        .values()
        .all(|v| v == 0));

    server.stop().await;
}

#[tokio::test]
async fn test_missing_event_is_rejected() {
    let server = common::start_server(28311, AppConfig::default()).await;

    let res = server
        .client
        .post(server.url("/api/analytics"))
        .json(&json!({ "data": { "charityId": "islamic-relief" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Event type required");
    assert_eq!(server.store.donations().total_clicks, 0);

    server.stop().await;
}

#[tokio::test]
async fn test_summary_is_the_default_snapshot() {
    let server = common::start_server(28312, AppConfig::default()).await;

    server
        .client
        .post(server.url("/api/analytics"))
        .json(&json!({
            "event": "donation_click",
            "data": { "charityId": "penny-appeal", "category": "Food Distribution" }
        }))
        .send()
        .await
        .unwrap();

    for query in ["", "?type=bogus"] {
        let body: Value = server
            .client
            .get(server.url(&format!("/api/analytics{}", query)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let summary = &body["summary"];
        assert_eq!(summary["totalDonationClicks"], 1);
        assert_eq!(summary["topCharity"], json!(["penny-appeal", 1]));
        assert_eq!(summary["topCategory"], json!(["Food Distribution", 1]));
        assert!(body["lastUpdated"].is_string());
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unsupported_method_lists_allowed() {
    let server = common::start_server(28313, AppConfig::default()).await;

    let res = server
        .client
        .delete(server.url("/api/charities"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "GET, POST");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Method not allowed");
    assert_eq!(body["allowedMethods"], json!(["GET", "POST"]));

    let res = server
        .client
        .post(server.url("/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "GET");

    server.stop().await;
}

#[tokio::test]
async fn test_health_report() {
    let server = common::start_server(28314, AppConfig::default()).await;

    for path in ["/api/health", "/health"] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{}", path);
        assert_eq!(res.headers()["x-relief-service"], "Health Check API");
        assert_eq!(
            res.headers()["cache-control"],
            "no-cache, no-store, must-revalidate"
        );

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"]["status"], "not_configured");
        assert_eq!(body["charitiesVerified"], 6);
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_database_degrades_health() {
    // Bind then drop to get a port nothing listens on.
    let dead = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let mut config = AppConfig::default();
    config.health.database_address = Some(dead.to_string());
    config.health.database_timeout_ms = 500;
    let server = common::start_server(28315, config).await;

    let res = server
        .client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"]["status"], "error");

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let server = common::start_server(28316, AppConfig::default()).await;

    let res = server
        .client
        .get(server.url("/api/donors"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Not found");

    server.stop().await;
}
