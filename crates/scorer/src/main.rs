//! Diabetes Scorer - HTTP scoring service
//!
//! Loads the trained classifier and its feature schema and serves
//! predictions, health probes and Prometheus metrics.

use anyhow::Result;
use scorer_lib::{
    health::{components, HealthRegistry},
    observability::{ScorerMetrics, StructuredLogger},
    ArtifactStore, Scorer,
};
use scorer_service::{api, warmup, ScorerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCORER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting diabetes-scorer");

    let config = ScorerConfig::load()?;
    info!(
        instance = %config.instance_name,
        port = config.api_port,
        "Scorer configured"
    );

    let store = ArtifactStore::new(config.artifact_paths())
        .with_cache(config.cache_artifacts)
        .with_expected_checksum(config.model_sha256.clone());
    let scorer = Arc::new(Scorer::new(store));

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ARTIFACTS).await;
    health_registry.register(components::MODEL).await;

    let metrics = ScorerMetrics::new();

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(
        SCORER_VERSION,
        &config.model_path.display().to_string(),
        &config.features_path.display().to_string(),
        config.cache_artifacts,
    );

    let app_state = api::AppState::new(scorer, health_registry.clone(), metrics, logger.clone());

    // Readiness follows the first warm-up; failures surface through /healthz
    let _ = warmup::run_once(&app_state).await;
    health_registry.set_ready(true).await;

    let warmup_handle = config
        .warmup_interval()
        .map(|interval| tokio::spawn(warmup::run_periodic(app_state.clone(), interval)));

    let mut api_handle = tokio::spawn(api::serve(config.api_port, Arc::new(app_state)));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
        served = &mut api_handle => {
            match served {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    if let Some(handle) = warmup_handle {
        handle.abort();
    }
    api_handle.abort();
    info!("Shutting down");

    Ok(())
}
