//! Classifier boundary
//!
//! The trained model is opaque to the scorer. Any format that can produce
//! labels and per-class probabilities for a feature matrix plugs in behind
//! [`Classifier`].

mod logistic;
mod onnx;

pub use logistic::LogisticClassifier;
pub use onnx::OnnxClassifier;

use crate::models::Label;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Row-major numeric matrix handed to the model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * columns.len() {
            bail!(
                "matrix data has {} cells, expected {} rows x {} columns",
                data.len(),
                rows,
                columns.len()
            );
        }
        Ok(Self { columns, rows, data })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let cols = self.cols();
        &self.data[i * cols..(i + 1) * cols]
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

/// Labels and per-class probabilities for the same rows
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub labels: Vec<Label>,
    pub probabilities: Vec<Vec<f64>>,
}

/// Trait for trained binary classifiers
pub trait Classifier: Send + Sync {
    /// Predicted label per row
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>>;

    /// Probability per class per row, classes in model order
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>>;

    /// Both outputs at once; formats that compute them together override this
    fn classify(&self, features: &FeatureMatrix) -> Result<Classification> {
        Ok(Classification {
            labels: self.predict(features)?,
            probabilities: self.predict_proba(features)?,
        })
    }

    /// Short format name for logs and metrics
    fn format(&self) -> &'static str;
}

/// Load a classifier, choosing the format from the file extension
pub fn load_classifier(path: &Path, bytes: &[u8]) -> Result<Arc<dyn Classifier>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    debug!(path = %path.display(), format = %extension, "Loading classifier");

    let classifier: Arc<dyn Classifier> = match extension.as_str() {
        "onnx" => Arc::new(OnnxClassifier::new(bytes)?),
        "json" => Arc::new(
            LogisticClassifier::from_json(bytes)
                .with_context(|| format!("Failed to parse model {}", path.display()))?,
        ),
        other => bail!(
            "unsupported model format '.{}' for {} (expected .onnx or .json)",
            other,
            path.display()
        ),
    };
    Ok(classifier)
}
