//! Configuration management for the CLI

use anyhow::{Context, Result};
use scorer_lib::{ArtifactPaths, DEFAULT_FEATURES_PATH, DEFAULT_MODEL_PATH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Service URL used when neither flag, env nor config file set one
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Scoring service URL
    pub api_url: Option<String>,
    /// Model artifact for local scoring
    pub model_path: Option<PathBuf>,
    /// Feature schema for local scoring
    pub features_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location, if present
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// `~/.config/dscore/config.json`
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("dscore").join("config.json"))
    }

    pub fn api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Flags win over the config file, which wins over the defaults
    pub fn artifact_paths(&self, model: Option<PathBuf>, features: Option<PathBuf>) -> ArtifactPaths {
        ArtifactPaths::new(
            model
                .or_else(|| self.model_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            features
                .or_else(|| self.features_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FEATURES_PATH)),
        )
    }
}
