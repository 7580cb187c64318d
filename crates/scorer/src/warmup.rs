//! Periodic model warm-up
//!
//! Scores one all-zero record so the artifacts are exercised before traffic
//! arrives and stay verified afterwards. Each run refreshes the health
//! components and the model info gauge.

use crate::api::AppState;
use scorer_lib::{ScoreError, ScoreOutput, Scorer};
use std::time::Duration;
use tracing::debug;

/// Run one warm-up and fold the outcome into health and metrics
pub async fn run_once(state: &AppState) -> Result<ScoreOutput, ScoreError> {
    let scorer = state.scorer.clone();
    let (model_info, result) = tokio::task::spawn_blocking(move || match scorer.artifacts() {
        Ok(artifacts) => {
            let model_info = (artifacts.classifier.format(), artifacts.model_checksum.clone());
            (Some(model_info), Scorer::warm_up(&artifacts))
        }
        Err(e) => (None, Err(e)),
    })
    .await
    .unwrap_or_else(|e| {
        (
            None,
            Err(ScoreError::Prediction(format!("warm-up task failed: {}", e))),
        )
    });

    if let Some((format, checksum)) = model_info {
        state.metrics.set_model_info(format, &checksum);
    }
    if result.is_err() {
        state.metrics.inc_warmup_failures();
    }
    state.logger.log_warm_up(&result);
    state
        .health_registry
        .record_warm_up(result.as_ref().map(|_| ()))
        .await;

    result
}

/// Warm up every `interval` until the task is dropped
pub async fn run_periodic(state: AppState, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // First tick completes immediately; startup already ran a warm-up.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        debug!(interval_secs = interval.as_secs(), "Running periodic warm-up");
        let _ = run_once(&state).await;
    }
}
