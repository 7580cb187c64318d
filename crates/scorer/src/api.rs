//! HTTP API for scoring, health checks and Prometheus metrics

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scorer_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{ScorerMetrics, StructuredLogger},
    ScoreError, ScoreInput, ScoreOutput, ScoreResponse, Scorer,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<Scorer>,
    pub health_registry: HealthRegistry,
    pub metrics: ScorerMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        scorer: Arc<Scorer>,
        health_registry: HealthRegistry,
        metrics: ScorerMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            scorer,
            health_registry,
            metrics,
            logger,
        }
    }

    /// Score on the blocking pool; inference is CPU-bound
    pub async fn score(&self, input: ScoreInput) -> Result<ScoreOutput, ScoreError> {
        let scorer = self.scorer.clone();
        tokio::task::spawn_blocking(move || scorer.try_score(input))
            .await
            .unwrap_or_else(|e| Err(ScoreError::Prediction(format!("scoring task failed: {}", e))))
    }
}

/// HTTP status for a scoring outcome; the body is always a `ScoreResponse`
pub fn status_for(result: &Result<ScoreOutput, ScoreError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(ScoreError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        Err(ScoreError::ArtifactsMissing | ScoreError::ArtifactLoad(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(ScoreError::Prediction(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Decode a request body; unreadable or non-UTF-8 bodies are invalid input
fn decode_body(body: Result<Bytes, BytesRejection>) -> Result<ScoreInput, ScoreError> {
    let bytes = body.map_err(|rejection| ScoreError::InvalidInput(rejection.body_text()))?;
    let text = std::str::from_utf8(&bytes).map_err(|e| ScoreError::InvalidInput(e.to_string()))?;
    Ok(ScoreInput::from_body(text))
}

/// Score records, a columnar object, the deployment envelope, or JSON text
async fn score(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let start = Instant::now();
    let result = match decode_body(body) {
        Ok(input) => state.score(input).await,
        Err(e) => Err(e),
    };
    let elapsed = start.elapsed();

    state.metrics.observe_score_latency(elapsed.as_secs_f64());
    state.metrics.record_outcome(&result);
    state.logger.log_score(&result, elapsed.as_secs_f64() * 1000.0);

    let status = status_for(&result);
    (status, Json(ScoreResponse::from(result)))
}

/// Liveness banner
async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "alive",
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("failed to encode metrics: {}", e).into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/score", post(score))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
