//! Observability infrastructure for the scoring service
//!
//! Provides:
//! - Prometheus metrics (score latency, outcomes, rows scored, model info)
//! - Structured JSON logging with tracing

use crate::error::ScoreError;
use crate::models::ScoreOutput;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for scoring latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Outcome label for successful requests
pub const OUTCOME_SUCCESS: &str = "success";

static GLOBAL_METRICS: OnceLock<ScorerMetricsInner> = OnceLock::new();

struct ScorerMetricsInner {
    score_latency_seconds: Histogram,
    score_requests: IntCounterVec,
    rows_scored: IntCounter,
    positive_predictions: IntCounter,
    warmup_failures: IntCounter,
    model_info: GaugeVec,
}

impl ScorerMetricsInner {
    fn new() -> Self {
        Self {
            score_latency_seconds: register_histogram!(
                "diabetes_scorer_score_latency_seconds",
                "Time spent scoring a request end to end",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register score_latency_seconds"),

            score_requests: register_int_counter_vec!(
                "diabetes_scorer_requests_total",
                "Scoring requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register requests_total"),

            rows_scored: register_int_counter!(
                "diabetes_scorer_rows_scored_total",
                "Total number of input rows scored"
            )
            .expect("Failed to register rows_scored_total"),

            positive_predictions: register_int_counter!(
                "diabetes_scorer_positive_predictions_total",
                "Total number of rows predicted as the positive class"
            )
            .expect("Failed to register positive_predictions_total"),

            warmup_failures: register_int_counter!(
                "diabetes_scorer_warmup_failures_total",
                "Total number of failed warm-up runs"
            )
            .expect("Failed to register warmup_failures_total"),

            model_info: register_gauge_vec!(
                "diabetes_scorer_model_info",
                "Information about the currently loaded model",
                &["format", "checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Scorer metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ScorerMetrics {
    _private: (),
}

impl Default for ScorerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScorerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScorerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScorerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_score_latency(&self, duration_secs: f64) {
        self.inner().score_latency_seconds.observe(duration_secs);
    }

    /// Count a request and, on success, its rows
    pub fn record_outcome(&self, result: &Result<ScoreOutput, ScoreError>) {
        match result {
            Ok(output) => {
                self.inner()
                    .score_requests
                    .with_label_values(&[OUTCOME_SUCCESS])
                    .inc();
                self.inner().rows_scored.inc_by(output.len() as u64);
                let positives = output.predictions.iter().filter(|p| p.is_positive()).count();
                self.inner().positive_predictions.inc_by(positives as u64);
            }
            Err(e) => {
                self.inner()
                    .score_requests
                    .with_label_values(&[e.kind()])
                    .inc();
            }
        }
    }

    pub fn inc_warmup_failures(&self) {
        self.inner().warmup_failures.inc();
    }

    pub fn set_model_info(&self, format: &str, checksum: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[format, checksum])
            .set(1.0);
    }
}

/// Structured logger for scorer events
///
/// Provides consistent JSON-formatted logging for scoring and lifecycle
/// events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_score(&self, result: &Result<ScoreOutput, ScoreError>, elapsed_ms: f64) {
        match result {
            Ok(output) => {
                let positives = output.predictions.iter().filter(|p| p.is_positive()).count();
                info!(
                    event = "score_completed",
                    instance = %self.instance,
                    rows = output.len(),
                    positives = positives,
                    elapsed_ms = elapsed_ms,
                    "Scored request"
                );
            }
            Err(e) => {
                warn!(
                    event = "score_failed",
                    instance = %self.instance,
                    kind = e.kind(),
                    error = %e,
                    elapsed_ms = elapsed_ms,
                    "Scoring failed"
                );
            }
        }
    }

    pub fn log_warm_up(&self, result: &Result<ScoreOutput, ScoreError>) {
        match result {
            Ok(_) => info!(event = "warmup", instance = %self.instance, success = true, "Model warm-up succeeded"),
            Err(e) => warn!(
                event = "warmup",
                instance = %self.instance,
                success = false,
                kind = e.kind(),
                error = %e,
                "Model warm-up failed"
            ),
        }
    }

    pub fn log_startup(&self, version: &str, model_path: &str, features_path: &str, cached: bool) {
        info!(
            event = "scorer_started",
            instance = %self.instance,
            version = %version,
            model_path = %model_path,
            features_path = %features_path,
            cache_artifacts = cached,
            "Diabetes scorer started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scorer_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Diabetes scorer shutting down"
        );
    }
}
