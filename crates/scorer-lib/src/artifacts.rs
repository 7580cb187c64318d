//! Model and feature-schema artifacts
//!
//! Artifacts are read-only inputs living at fixed paths. By default they are
//! loaded fresh on every call; a store built with caching keeps the first
//! successful load for the life of the process. The presence check runs on
//! every call either way.

use crate::classifier::{load_classifier, Classifier};
use crate::error::ScoreError;
use crate::schema::FeatureSchema;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Default model location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "diabetes_model.onnx";

/// Default feature schema location, relative to the working directory
pub const DEFAULT_FEATURES_PATH: &str = "model_features.json";

/// Locations of the two artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub features: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_PATH, DEFAULT_FEATURES_PATH)
    }
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, features: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            features: features.into(),
        }
    }

    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_MODEL_PATH), dir.join(DEFAULT_FEATURES_PATH))
    }

    /// Both files are present
    pub fn exist(&self) -> bool {
        self.model.exists() && self.features.exists()
    }
}

/// Loaded, immutable artifacts
pub struct Artifacts {
    pub classifier: Arc<dyn Classifier>,
    pub schema: FeatureSchema,
    pub model_checksum: String,
}

impl std::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifacts")
            .field("format", &self.classifier.format())
            .field("schema", &self.schema)
            .field("model_checksum", &self.model_checksum)
            .finish()
    }
}

/// Loads artifacts, optionally caching them process-wide
pub struct ArtifactStore {
    paths: ArtifactPaths,
    expected_checksum: Option<String>,
    cache: Option<RwLock<Option<Arc<Artifacts>>>>,
}

impl ArtifactStore {
    /// Store that loads fresh artifacts on every call
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            expected_checksum: None,
            cache: None,
        }
    }

    /// Keep the first successful load for later calls
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(|| RwLock::new(None));
        self
    }

    /// Require the model file to hash to this SHA-256 (hex)
    pub fn with_expected_checksum(mut self, checksum: Option<String>) -> Self {
        self.expected_checksum = checksum.map(|c| c.trim().to_ascii_lowercase());
        self
    }

    /// Check presence, then return cached or freshly loaded artifacts
    pub fn load(&self) -> Result<Arc<Artifacts>, ScoreError> {
        if !self.paths.exist() {
            return Err(ScoreError::ArtifactsMissing);
        }

        let Some(cache) = &self.cache else {
            return self.load_fresh().map(Arc::new).map_err(ScoreError::load);
        };

        if let Some(artifacts) = cache
            .read()
            .map_err(|e| ScoreError::ArtifactLoad(format!("Lock poisoned: {}", e)))?
            .as_ref()
        {
            return Ok(artifacts.clone());
        }

        let artifacts = Arc::new(self.load_fresh().map_err(ScoreError::load)?);
        let mut slot = cache
            .write()
            .map_err(|e| ScoreError::ArtifactLoad(format!("Lock poisoned: {}", e)))?;
        let artifacts = slot.get_or_insert(artifacts).clone();
        info!(
            model = %self.paths.model.display(),
            format = artifacts.classifier.format(),
            features = artifacts.schema.len(),
            "Model artifacts cached"
        );
        Ok(artifacts)
    }

    fn load_fresh(&self) -> Result<Artifacts> {
        let bytes = std::fs::read(&self.paths.model)
            .with_context(|| format!("Failed to read model {}", self.paths.model.display()))?;

        let checksum = compute_checksum(&bytes);
        if let Some(expected) = &self.expected_checksum {
            if *expected != checksum {
                anyhow::bail!("Checksum mismatch: expected {}, got {}", expected, checksum);
            }
        }

        let classifier = load_classifier(&self.paths.model, &bytes)?;
        let schema = FeatureSchema::load(&self.paths.features)?;

        debug!(
            model = %self.paths.model.display(),
            size = bytes.len(),
            checksum = %checksum,
            features = schema.len(),
            "Model artifacts loaded"
        );

        Ok(Artifacts {
            classifier,
            schema,
            model_checksum: checksum,
        })
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
