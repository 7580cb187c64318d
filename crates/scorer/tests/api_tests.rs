//! Integration tests for the scorer API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use scorer_lib::{
    health::{components, HealthRegistry},
    observability::{ScorerMetrics, StructuredLogger},
    ArtifactPaths, Scorer,
};
use scorer_service::{create_router, warmup, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const FEATURES: &str = r#"["glucose", "bmi", "age"]"#;
const MODEL: &str = r#"{"intercept": -6.0, "coefficients": [0.04, 0.05, 0.01]}"#;

async fn setup_test_app(with_artifacts: bool) -> (Router, AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(dir.path().join("model.json"), dir.path().join("features.json"));
    if with_artifacts {
        std::fs::write(&paths.model, MODEL).unwrap();
        std::fs::write(&paths.features, FEATURES).unwrap();
    }

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ARTIFACTS).await;
    health_registry.register(components::MODEL).await;

    let state = AppState::new(
        Arc::new(Scorer::from_paths(paths)),
        health_registry,
        ScorerMetrics::new(),
        StructuredLogger::new("test"),
    );
    let router = create_router(Arc::new(state.clone()));

    (router, state, dir)
}

async fn post_score(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/score")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_score_records() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = post_score(app, r#"[{"glucose": 120, "bmi": 28.5}]"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 1);
    assert_eq!(body["probabilities"].as_array().unwrap().len(), 1);
    let p = body["probabilities"][0].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p));
}

#[tokio::test]
async fn test_score_json_string_body_matches_records() {
    let (app, _state, _dir) = setup_test_app(true).await;
    let records = json!([
        {"glucose": 180, "bmi": 35.0, "age": 60},
        {"glucose": 80, "bmi": 21.5, "age": 30}
    ]);

    let (direct_status, direct) = post_score(app.clone(), records.to_string()).await;
    let encoded = Value::String(records.to_string()).to_string();
    let (status, via_string) = post_score(app, encoded).await;

    assert_eq!(direct_status, StatusCode::OK);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(direct["predictions"].as_array().unwrap().len(), 2);
    assert_eq!(direct, via_string);
}

#[tokio::test]
async fn test_score_envelope() {
    let (app, _state, _dir) = setup_test_app(true).await;
    let body = json!({
        "input_data": [{"fields": ["glucose", "bmi"], "values": [[120, 28.5], [95, 22.0]]}]
    });

    let (status, body) = post_score(app, body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_score_invalid_json_returns_structured_error() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = post_score(app, "{not valid json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid input format: "));
}

#[tokio::test]
async fn test_score_non_utf8_body_returns_structured_error() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = post_score(app, vec![b'[', 0xFF, b']']).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid input format: "));
}

#[tokio::test]
async fn test_score_oversized_body_returns_structured_error() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = post_score(app, vec![b' '; 3 * 1024 * 1024]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid input format: "));
}

#[tokio::test]
async fn test_score_missing_artifacts() {
    let (app, _state, _dir) = setup_test_app(false).await;

    let (status, body) = post_score(app, r#"[{"glucose": 120}]"#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Model or feature file not found."}));
}

#[tokio::test]
async fn test_score_prediction_failure() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = post_score(app, "[]").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Prediction failed: "));
}

#[tokio::test]
async fn test_root_banner() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = get(app, "/").await;
    let body: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn test_warm_up_marks_healthy() {
    let (app, state, _dir) = setup_test_app(true).await;
    state.health_registry.set_ready(true).await;

    assert!(warmup::run_once(&state).await.is_ok());

    let (status, body) = get(app.clone(), "/healthz").await;
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    let (status, _) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_warm_up_without_artifacts_is_unhealthy() {
    let (app, state, _dir) = setup_test_app(false).await;
    state.health_registry.set_ready(true).await;

    assert!(warmup::run_once(&state).await.is_err());

    let (status, body) = get(app.clone(), "/healthz").await;
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(
        health["components"]["artifacts"]["message"],
        "Model or feature file not found."
    );

    let (status, _) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, body) = get(app, "/readyz").await;
    let readiness: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state, _dir) = setup_test_app(true).await;

    let (status, _) = post_score(app.clone(), r#"[{"glucose": 100}]"#).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app, "/metrics").await;
    let metrics_text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(metrics_text.contains("diabetes_scorer_score_latency_seconds_bucket"));
    assert!(metrics_text.contains("diabetes_scorer_requests_total"));
    assert!(metrics_text.contains("diabetes_scorer_rows_scored_total"));
}
