// libs/scheduling-cell/tests/handlers_test.rs
mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use scheduling_cell::error::SchedulingError;
use scheduling_cell::router::scheduling_routes;
use scheduling_cell::services::SlotOptimizer;

use common::*;

fn create_test_app(optimizer: SlotOptimizer) -> Router {
    scheduling_routes(Arc::new(optimizer))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn optimize_request(address: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/optimize")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "address": address }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_optimize_returns_ranked_slots() {
    // Slots are scored against the wall clock, so the schedule starts tomorrow.
    let start = chrono::Utc::now() + chrono::Duration::days(1);
    let intervals = vec![
        busy("carlos", start, start + chrono::Duration::hours(1)),
        busy(
            "carlos",
            start + chrono::Duration::minutes(150),
            start + chrono::Duration::minutes(210),
        ),
    ];

    let app = create_test_app(optimizer(
        FixedGeocoder::ok(PATIENT),
        five_minute_legs(),
        StaticRegistry(Ok(vec![worker("carlos")])),
        FakeCalendar::default().with("carlos", intervals),
    ));

    let response = app.oneshot(optimize_request("Av. Afonso Pena, 1000")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert!(json_response["slots"].is_array());
    assert_eq!(json_response["slots"].as_array().unwrap().len(), 1);
    assert_eq!(json_response["slots"][0]["worker_id"], "carlos");
    assert_eq!(json_response["slots"][0]["total_travel_minutes"], 10);
    assert!(json_response["slots"][0]["score"].is_i64());
    assert_eq!(json_response["skipped_gaps"], 0);
    assert_eq!(json_response["skipped_workers"], 0);
}

#[tokio::test]
async fn test_blank_address_is_bad_request() {
    let app = create_test_app(optimizer(
        FixedGeocoder::ok(PATIENT),
        five_minute_legs(),
        StaticRegistry(Ok(vec![worker("carlos")])),
        FakeCalendar::default(),
    ));

    let response = app.oneshot(optimize_request("  ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_response = body_json(response).await;
    assert!(json_response["error"].as_str().unwrap().contains("blank"));
}

#[tokio::test]
async fn test_malformed_body_returns_error_json() {
    let app = create_test_app(optimizer(
        FixedGeocoder::ok(PATIENT),
        five_minute_legs(),
        StaticRegistry(Ok(vec![worker("carlos")])),
        FakeCalendar::default(),
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/optimize")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"street": "Rua da Bahia"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_response = body_json(response).await;
    assert!(json_response["error"].as_str().unwrap().contains("address"));
}

#[tokio::test]
async fn test_geocoding_failure_is_unprocessable() {
    let app = create_test_app(optimizer(
        FixedGeocoder::failing(SchedulingError::Geocoding("ZeroResults".into())),
        five_minute_legs(),
        StaticRegistry(Ok(vec![worker("carlos")])),
        FakeCalendar::default(),
    ));

    let response = app.oneshot(optimize_request("Rua que não existe")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_no_workers_is_not_found() {
    let app = create_test_app(optimizer(
        FixedGeocoder::ok(PATIENT),
        five_minute_legs(),
        StaticRegistry(Ok(vec![])),
        FakeCalendar::default(),
    ));

    let response = app.oneshot(optimize_request("Rua da Bahia, 1200")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_reports_last_outcome() {
    let optimizer = Arc::new(optimizer(
        FixedGeocoder::failing(SchedulingError::Geocoding("ZeroResults".into())),
        five_minute_legs(),
        StaticRegistry(Ok(vec![worker("carlos")])),
        FakeCalendar::default(),
    ));
    let app = scheduling_routes(Arc::clone(&optimizer));

    let request = Request::builder()
        .method("GET")
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["state"]["status"], "idle");
    assert_eq!(json_response["is_loading"], false);

    let _ = optimizer.optimize("Rua que não existe").await;

    let request = Request::builder()
        .method("GET")
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let json_response = body_json(response).await;
    assert_eq!(json_response["state"]["status"], "failed");
    assert!(json_response["state"]["message"]
        .as_str()
        .unwrap()
        .contains("ZeroResults"));
    assert_eq!(json_response["is_loading"], false);
}
