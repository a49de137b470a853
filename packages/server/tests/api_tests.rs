//! HTTP surface tests: drive the router with `oneshot`, no listener.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::*;
use scrape_core::common::ScrapeJobId;
use scrape_core::kernel::{MockScraper, StoreOp};
use scrape_core::server::build_app;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_reports_store_status() {
    let healthy = TestHarness::new(&[], MockScraper::new()).await;
    let (status, body) = get_json(&build_app(healthy.deps.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let broken =
        TestHarness::with_faults(&[], MockScraper::new(), |s| s.failing(StoreOp::Ping)).await;
    let (status, body) = get_json(&build_app(broken.deps.clone()), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["store"]["status"], "error");
}

#[tokio::test]
async fn test_websites_are_listed_by_name() {
    let harness = TestHarness::new(&[SITE_TWO, SITE_ONE], MockScraper::new()).await;
    let app = build_app(harness.deps.clone());

    let (status, body) = get_json(&app, "/websites").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec![SITE_ONE.0, SITE_TWO.0]);
}

#[tokio::test]
async fn test_create_job_and_read_it_back() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let app = build_app(harness.deps.clone());
    let site = harness.website(SITE_ONE.0).id;

    let (status, job) =
        post_json(&app, "/jobs", json!({ "websiteIds": [site.to_string()] })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(job["status"], "in_progress");

    let job_id: ScrapeJobId = job["id"].as_str().unwrap().parse().unwrap();
    harness.wait_for_terminal(job_id).await;

    let (status, job) = get_json(&app, &format!("/jobs/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["status"], "completed");

    let (_, results) = get_json(&app, &format!("/jobs/{}/results", job_id)).await;
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[0]["kind"], "task");

    let (_, progress) = get_json(&app, &format!("/jobs/{}/progress", job_id)).await;
    assert_eq!(progress["progress_percent"], 100.0);
    assert_eq!(progress["is_terminal"], true);
    assert_eq!(progress["tasks"][0]["website_name"], SITE_ONE.0);

    let (_, history) = get_json(&app, "/jobs?limit=5").await;
    assert_eq!(history[0]["job_id"], job_id.to_string());
    assert_eq!(history[0]["sites_succeeded"], 1);
}

#[tokio::test]
async fn test_create_job_rejects_bad_selection() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let app = build_app(harness.deps.clone());

    let (status, body) = post_json(&app, "/jobs", json!({ "websiteIds": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Select at least one website" }));

    let (status, body) = post_json(&app, "/jobs", json!({ "websiteIds": ["nope"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid website id: nope");

    let request = Request::post("/jobs")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dispatch_endpoint() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let app = build_app(harness.deps.clone());
    let site = harness.website(SITE_ONE.0).id.to_string();

    let (status, body) = post_json(
        &app,
        "/scrape",
        json!({ "jobId": ScrapeJobId::new().to_string(), "websiteIds": [site] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let job = create_in_progress_job(harness.memory.as_ref()).await;

    let (status, body) = post_json(
        &app,
        "/scrape",
        json!({ "jobId": job.id.to_string(), "websiteIds": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = post_json(
        &app,
        "/scrape",
        json!({ "jobId": job.id.to_string(), "websiteIds": [site] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Scraping started for 1 websites");

    harness.wait_for_terminal(job.id).await;

    let (status, _) = post_json(
        &app,
        "/scrape",
        json!({ "jobId": job.id.to_string(), "websiteIds": [site] }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_job_lookup_errors() {
    let harness = TestHarness::new(&[], MockScraper::new()).await;
    let app = build_app(harness.deps.clone());

    let (status, body) = get_json(&app, "/jobs/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid job id: not-a-uuid");

    let (status, _) = get_json(&app, &format!("/jobs/{}/progress", ScrapeJobId::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_of_finished_job_ends_after_snapshot() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let app = build_app(harness.deps.clone());
    let site = harness.website(SITE_ONE.0).id.to_string();

    let (_, job) = post_json(&app, "/jobs", json!({ "websiteIds": [site] })).await;
    let job_id: ScrapeJobId = job["id"].as_str().unwrap().parse().unwrap();
    harness.wait_for_terminal(job_id).await;

    let request = Request::get(format!("/jobs/{}/stream", job_id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let body = String::from_utf8(body).unwrap();
    assert_eq!(body.matches("event: progress").count(), 1);
    assert!(body.contains("\"is_terminal\":true"));
}
