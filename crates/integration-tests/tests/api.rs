//! Integration tests for the JSON endpoints.
//!
//! Each test starts a fake Sheets/Apps Script upstream and the real site
//! router on ephemeral ports.

#![allow(clippy::indexing_slicing)]

use dabs_integration_tests::{REQUESTS_HEADER, STORES_TAB, TestSite, Upstream};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn error_message(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.expect("Failed to parse error body");
    body["error"].as_str().unwrap_or_default().to_string()
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_stores_listing() {
    let upstream = Upstream::start().await;
    upstream.set_tab("Stores", STORES_TAB).await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .get(site.url("/api/stores"))
        .send()
        .await
        .expect("Failed to get stores");

    assert_eq!(resp.status(), StatusCode::OK);
    let stores: Value = resp.json().await.expect("Failed to parse stores");
    assert_eq!(stores.as_array().map(Vec::len), Some(2));
    assert_eq!(stores[0]["name"], "High Desert Dispensary");
    assert_eq!(stores[0]["lat"], 35.0844);
    assert_eq!(stores[1]["lng"], -105.5731);
}

#[tokio::test]
async fn test_header_only_requests_tab_is_empty_array() {
    let upstream = Upstream::start().await;
    upstream.set_tab("ProductRequests", &[REQUESTS_HEADER]).await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .get(site.url("/api/requests"))
        .send()
        .await
        .expect("Failed to get requests");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse requests");
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_empty_stores_tab_is_not_found() {
    let upstream = Upstream::start().await;
    upstream.set_tab("Stores", &[STORES_TAB[0]]).await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .get(site.url("/api/stores"))
        .send()
        .await
        .expect("Failed to get stores");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(resp).await, "No store data found");
}

#[tokio::test]
async fn test_missing_column_is_schema_mismatch() {
    let upstream = Upstream::start().await;
    upstream
        .set_tab(
            "Stores",
            &[
                &["State", "Name", "Address", "City", "Zip", "Phone", "Longitude"],
                &["NM", "No Lat", "1 Main", "Taos", "87571", "575-555-0100", "-105.5"],
            ],
        )
        .await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .get(site.url("/api/stores"))
        .send()
        .await
        .expect("Failed to get stores");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = error_message(resp).await;
    assert_eq!(message, "Sheet layout not recognized");
}

#[tokio::test]
async fn test_upstream_failure_hides_details() {
    let upstream = Upstream::start().await;
    upstream.set_sheets_status(StatusCode::SERVICE_UNAVAILABLE).await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .get(site.url("/api/requests"))
        .send()
        .await
        .expect("Failed to get requests");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(resp).await, "Failed to fetch request data");
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_submission_fills_not_provided() {
    let upstream = Upstream::start().await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .post(site.url("/api/request"))
        .json(&json!({"city": "Santa Fe", "store": "Plaza Leaf", "product": "Badder"}))
        .send()
        .await
        .expect("Failed to submit request");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({"success": true}));

    let forwarded = upstream.forwarded().await;
    assert_eq!(forwarded.len(), 1);
    let record = &forwarded[0];
    assert_eq!(record.kind, "request");
    assert_eq!(record.body["city"], "Santa Fe");
    assert_eq!(record.body["email"], "Not provided");
    assert_eq!(record.body["instagram"], "Not provided");
    assert_eq!(record.body["status"], "New");
    assert!(record.body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}

#[tokio::test]
async fn test_missing_fields_rejected_without_forward() {
    let upstream = Upstream::start().await;
    let site = TestSite::start(&upstream).await;

    for body in [
        json!({"store": "Plaza Leaf", "product": "Badder"}),
        json!({"city": "Santa Fe", "product": "Badder"}),
        json!({"city": "Santa Fe", "store": "Plaza Leaf", "product": "   "}),
    ] {
        let resp = TestSite::client()
            .post(site.url("/api/request"))
            .json(&body)
            .send()
            .await
            .expect("Failed to submit request");

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(resp).await.starts_with("Missing required fields"));
    }

    assert!(upstream.forwarded().await.is_empty());
}

#[tokio::test]
async fn test_non_post_submission_is_405() {
    let upstream = Upstream::start().await;
    let site = TestSite::start(&upstream).await;
    let client = TestSite::client();

    for method in [reqwest::Method::GET, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let resp = client
            .request(method.clone(), site.url("/api/request"))
            .body(r#"{"city": "Santa Fe", "store": "Plaza Leaf", "product": "Badder"}"#)
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(error_message(resp).await, "Method not allowed");
    }

    assert!(upstream.forwarded().await.is_empty());
}

#[tokio::test]
async fn test_unconfigured_target_is_500() {
    let upstream = Upstream::start().await;
    let mut config = upstream.site_config();
    config.request_target = None;
    let site = TestSite::start_with(config).await;

    let resp = TestSite::client()
        .post(site.url("/api/request"))
        .json(&json!({"city": "Santa Fe", "store": "Plaza Leaf", "product": "Badder"}))
        .send()
        .await
        .expect("Failed to submit request");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(resp).await, "Server not configured");
    assert!(upstream.forwarded().await.is_empty());
}

#[tokio::test]
async fn test_downstream_rejection_is_500() {
    let upstream = Upstream::start().await;
    upstream.set_script_status(StatusCode::BAD_GATEWAY).await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .post(site.url("/api/request"))
        .json(&json!({"city": "Santa Fe", "store": "Plaza Leaf", "product": "Badder"}))
        .send()
        .await
        .expect("Failed to submit request");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(resp).await, "Failed to submit request");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let upstream = Upstream::start().await;
    let site = TestSite::start(&upstream).await;

    let resp = TestSite::client()
        .post(site.url("/api/request"))
        .body("{not json")
        .send()
        .await
        .expect("Failed to submit request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Invalid request body");
}
