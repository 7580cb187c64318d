//! Scorer service configuration

use anyhow::{Context, Result};
use scorer_lib::{ArtifactPaths, DEFAULT_FEATURES_PATH, DEFAULT_MODEL_PATH};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Scorer service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerConfig {
    /// Instance name attached to every log record
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP port for scoring, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Serialized model location
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Feature schema location
    #[serde(default = "default_features_path")]
    pub features_path: PathBuf,

    /// Keep artifacts in memory after the first successful load
    #[serde(default)]
    pub cache_artifacts: bool,

    /// Expected SHA-256 of the model file (hex)
    #[serde(default)]
    pub model_sha256: Option<String>,

    /// Seconds between warm-up runs; 0 disables the periodic run
    #[serde(default = "default_warmup_interval")]
    pub warmup_interval_secs: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "diabetes-scorer".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_features_path() -> PathBuf {
    PathBuf::from(DEFAULT_FEATURES_PATH)
}

fn default_warmup_interval() -> u64 {
    240
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            model_path: default_model_path(),
            features_path: default_features_path(),
            cache_artifacts: false,
            model_sha256: None,
            warmup_interval_secs: default_warmup_interval(),
        }
    }
}

impl ScorerConfig {
    /// Load from an optional `scorer.{toml,json,yaml}` file, then `SCORER_*` env vars
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("scorer").required(false))
            .add_source(config::Environment::with_prefix("SCORER").try_parsing(true))
            .build()
            .context("Failed to read scorer configuration")?;

        config
            .try_deserialize()
            .context("Invalid scorer configuration")
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_path, &self.features_path)
    }

    pub fn warmup_interval(&self) -> Option<Duration> {
        (self.warmup_interval_secs > 0).then(|| Duration::from_secs(self.warmup_interval_secs))
    }
}
