//! Scoring pipeline
//!
//! A single linear pass: artifact presence, artifact load, input
//! normalization, schema alignment, inference. Each step either hands its
//! result to the next or ends the call with a [`ScoreError`].

use crate::artifacts::{ArtifactPaths, ArtifactStore, Artifacts};
use crate::error::ScoreError;
use crate::models::{ScoreInput, ScoreOutput, ScoreResponse};
use crate::table::Table;
use anyhow::anyhow;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Index of the positive class in per-class probability rows
pub const POSITIVE_CLASS_INDEX: usize = 1;

/// Scores input against the model artifacts
pub struct Scorer {
    store: ArtifactStore,
}

impl Scorer {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Scorer over the given paths, loading artifacts on every call
    pub fn from_paths(paths: ArtifactPaths) -> Self {
        Self::new(ArtifactStore::new(paths))
    }

    /// Score input, folding any failure into the structured error response
    pub fn score(&self, input: impl Into<ScoreInput>) -> ScoreResponse {
        self.try_score(input.into()).into()
    }

    pub fn try_score(&self, input: ScoreInput) -> Result<ScoreOutput, ScoreError> {
        let artifacts = self.store.load()?;
        Self::score_with(&artifacts, input)
    }

    /// Normalize, align and infer against already loaded artifacts
    pub fn score_with(artifacts: &Artifacts, input: ScoreInput) -> Result<ScoreOutput, ScoreError> {
        let start = Instant::now();

        let table = Table::from_input(input)?;
        let aligned = table.align(&artifacts.schema);
        let output = infer(artifacts, &aligned)?;

        debug!(
            rows = output.len(),
            format = artifacts.classifier.format(),
            elapsed_us = start.elapsed().as_micros(),
            "Scoring completed"
        );
        Ok(output)
    }

    /// Score a single all-zero record over the schema to verify the model runs
    pub fn warm_up(artifacts: &Artifacts) -> Result<ScoreOutput, ScoreError> {
        let record: Map<String, Value> = artifacts
            .schema
            .columns()
            .iter()
            .map(|c| (c.clone(), Value::from(0)))
            .collect();
        Self::score_with(
            artifacts,
            ScoreInput::Records(Value::Array(vec![Value::Object(record)])),
        )
    }

    /// Load the artifacts without scoring
    pub fn artifacts(&self) -> Result<Arc<Artifacts>, ScoreError> {
        self.store.load()
    }
}

fn infer(artifacts: &Artifacts, aligned: &Table) -> Result<ScoreOutput, ScoreError> {
    if aligned.num_rows() == 0 {
        return Err(ScoreError::Prediction(format!(
            "Found array with 0 sample(s) (shape=(0, {})) while a minimum of 1 is required.",
            aligned.num_columns()
        )));
    }

    let matrix = aligned.to_matrix().map_err(ScoreError::prediction)?;
    let classification = artifacts
        .classifier
        .classify(&matrix)
        .map_err(ScoreError::prediction)?;

    let rows = matrix.rows();
    if classification.labels.len() != rows || classification.probabilities.len() != rows {
        return Err(ScoreError::prediction(anyhow!(
            "model returned {} labels and {} probability rows for {} input rows",
            classification.labels.len(),
            classification.probabilities.len(),
            rows
        )));
    }

    let probabilities = classification
        .probabilities
        .iter()
        .enumerate()
        .map(|(row, classes)| {
            let p = classes.get(POSITIVE_CLASS_INDEX).copied().ok_or_else(|| {
                ScoreError::Prediction(format!(
                    "model returned {} class probability column(s); a binary classifier needs 2",
                    classes.len()
                ))
            })?;
            // NaN fails the range check too
            if !(0.0..=1.0).contains(&p) {
                return Err(ScoreError::Prediction(format!(
                    "model returned probability {} for row {}, outside [0, 1]",
                    p, row
                )));
            }
            Ok(p)
        })
        .collect::<Result<Vec<f64>, ScoreError>>()?;

    Ok(ScoreOutput {
        predictions: classification.labels,
        probabilities,
    })
}
