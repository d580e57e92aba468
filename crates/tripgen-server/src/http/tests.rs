use super::{create_router, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tripgen_core::{
    GenerationError, GenerationPrompt, ItineraryGenerator, MemoryTripStore, Pipeline, TripStatus,
    TripStore, TripUpdate,
};

const BODY_LIMIT: usize = 1024 * 1024;

/// Generator that answers every prompt with the same result.
struct FixedGenerator(fn() -> Result<String, GenerationError>);

#[async_trait]
impl ItineraryGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &GenerationPrompt) -> Result<String, GenerationError> {
        (self.0)()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

async fn build_test_router(
    reply: fn() -> Result<String, GenerationError>,
) -> (Router, Arc<MemoryTripStore>) {
    let store = Arc::new(MemoryTripStore::new());
    store.create("t1").await.unwrap();
    let pipeline = Pipeline::new(Arc::new(FixedGenerator(reply)), store.clone());
    let state = AppState {
        pipeline,
        start_time: std::time::Instant::now(),
    };
    (create_router(state), store)
}

fn lisbon_body() -> Value {
    json!({
        "tripId": "t1",
        "destination": "Lisbon",
        "startDate": "2025-05-01",
        "endDate": "2025-05-07",
        "travelers": 2,
        "budget": "1500",
        "travelStyle": "relaxed",
        "pace": "slow",
        "startingCity": "NYC",
        "surpriseMe": false
    })
}

fn generate_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-itinerary")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn generate_commits_fenced_itinerary() {
    let (app, store) = build_test_router(|| Ok("```json\n{\"days\":[]}\n```".into())).await;

    let response = app.oneshot(generate_request(&lisbon_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["tripId"], "t1");
    assert_eq!(json["data"]["status"], "READY");

    let applied = store.applied_updates().await;
    assert_eq!(applied.len(), 1);
    match &applied[0].1 {
        TripUpdate::Ready { itinerary } => assert_eq!(itinerary.as_value(), &json!({"days": []})),
        other => panic!("unexpected update: {other:?}"),
    }
    let record = store.get("t1").await.unwrap().unwrap();
    assert_eq!(record.status, TripStatus::Ready);
}

#[tokio::test]
async fn generate_reports_extraction_error() {
    let (app, store) = build_test_router(|| Ok("I cannot help with that.".into())).await;

    let response = app.oneshot(generate_request(&lisbon_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "ExtractionError");
    assert!(store.applied_updates().await.is_empty());
}

#[tokio::test]
async fn generate_reports_generation_error() {
    let (app, store) = build_test_router(|| {
        Err(GenerationError::Status {
            status: 500,
            message: "internal".into(),
        })
    })
    .await;

    let response = app.oneshot(generate_request(&lisbon_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["kind"], "GenerationError");
    assert!(json["error"].as_str().unwrap().contains("500"));
    assert!(store.applied_updates().await.is_empty());
}

#[tokio::test]
async fn generate_timeout_is_gateway_timeout() {
    let (app, _store) =
        build_test_router(|| Err(GenerationError::Timeout(Duration::from_secs(60)))).await;

    let response = app.oneshot(generate_request(&lisbon_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["kind"], "GenerationError");
}

#[tokio::test]
async fn generate_unknown_trip_is_not_found() {
    let (app, store) = build_test_router(|| Ok("{}".into())).await;
    let mut body = lisbon_body();
    body["tripId"] = json!("missing");

    let response = app.oneshot(generate_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["kind"], "PersistenceError");
    assert!(store.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn generate_rejects_incomplete_body() {
    let (app, store) = build_test_router(|| Ok("{}".into())).await;
    let mut body = lisbon_body();
    body.as_object_mut().unwrap().remove("destination");

    let response = app.oneshot(generate_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["kind"], "InvalidRequest");
    assert!(json["error"].as_str().unwrap().contains("destination"));
    assert!(store.applied_updates().await.is_empty());
}

#[tokio::test]
async fn get_trip_returns_record() {
    let (app, _store) = build_test_router(|| Ok("{}".into())).await;

    let request = Request::builder()
        .uri("/trips/t1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["tripId"], "t1");
    assert_eq!(json["data"]["status"], "PENDING");
}

#[tokio::test]
async fn get_trip_missing_is_not_found() {
    let (app, _store) = build_test_router(|| Ok("{}".into())).await;

    let request = Request::builder()
        .uri("/trips/nope")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["kind"], "NotFound");
}

#[tokio::test]
async fn health_reports_backends() {
    let (app, _store) = build_test_router(|| Ok("{}".into())).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["healthy"], true);
    assert_eq!(json["data"]["generator"], "fixed");
    assert_eq!(json["data"]["store"], "memory");
}
