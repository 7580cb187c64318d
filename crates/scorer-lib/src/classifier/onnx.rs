//! ONNX classifier inference using tract
//!
//! Expects the usual scikit-learn export without ZipMap: output 0 holds the
//! predicted labels, output 1 the `[rows, classes]` probability tensor. A
//! model with a single output is treated as probabilities only and labels
//! are taken as the argmax class index.

use super::{Classification, Classifier, FeatureMatrix};
use crate::models::Label;
use anyhow::{bail, Context, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Plan compilation time before a warning is emitted
const MAX_COMPILE_MS: u128 = 500;

/// Compiled plans kept per classifier; one is evicted when a new shape arrives
pub const MAX_CACHED_PLANS: usize = 16;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier; runnable plans are compiled lazily per batch
/// shape and at most [`MAX_CACHED_PLANS`] are kept
pub struct OnnxClassifier {
    model: InferenceModel,
    plans: DashMap<(usize, usize), Arc<TractModel>>,
}

impl OnnxClassifier {
    /// Parse an ONNX model from bytes
    pub fn new(model_bytes: &[u8]) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?;
        Ok(Self {
            model,
            plans: DashMap::new(),
        })
    }

    /// Fetch or build the optimized plan for a `[rows, cols]` input
    fn plan(&self, rows: usize, cols: usize) -> Result<Arc<TractModel>> {
        if let Some(plan) = self.plans.get(&(rows, cols)) {
            return Ok(plan.clone());
        }

        let start = Instant::now();
        let plan = self
            .model
            .clone()
            .with_input_fact(0, f32::fact([rows, cols]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        let plan = Arc::new(plan);

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_COMPILE_MS {
            warn!(rows, cols, elapsed_ms = elapsed.as_millis(), "Slow ONNX plan compilation");
        } else {
            debug!(rows, cols, elapsed_us = elapsed.as_micros(), "ONNX plan compiled");
        }

        if self.plans.len() >= MAX_CACHED_PLANS {
            let evicted = self.plans.iter().next().map(|entry| *entry.key());
            if let Some(key) = evicted {
                self.plans.remove(&key);
                debug!(rows = key.0, cols = key.1, "Evicted ONNX plan");
            }
        }
        self.plans.insert((rows, cols), plan.clone());
        Ok(plan)
    }

    /// Number of compiled plans currently cached
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    fn features_to_tensor(features: &FeatureMatrix) -> Result<Tensor> {
        let data: Vec<f32> = features.data().iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((features.rows(), features.cols()), data)
            .context("Failed to shape input tensor")?;
        Ok(array.into())
    }

    fn run(&self, features: &FeatureMatrix) -> Result<Classification> {
        let plan = self.plan(features.rows(), features.cols())?;
        let input = Self::features_to_tensor(features)?;
        let outputs = plan.run(tvec!(input.into()))?;

        let (labels, probabilities) = match outputs.len() {
            0 => bail!("No output from model"),
            1 => {
                let probabilities = probability_rows(&outputs[0], features.rows())?;
                let labels = probabilities.iter().map(|row| argmax_label(row)).collect();
                (labels, probabilities)
            }
            _ => (
                tensor_to_labels(&outputs[0])?,
                probability_rows(&outputs[1], features.rows())?,
            ),
        };

        Ok(Classification {
            labels,
            probabilities,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>> {
        Ok(self.run(features)?.labels)
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        Ok(self.run(features)?.probabilities)
    }

    fn classify(&self, features: &FeatureMatrix) -> Result<Classification> {
        self.run(features)
    }

    fn format(&self) -> &'static str {
        "onnx"
    }
}

fn tensor_to_labels(tensor: &Tensor) -> Result<Vec<Label>> {
    let labels = match tensor.datum_type() {
        DatumType::I64 => tensor.as_slice::<i64>()?.iter().map(|v| Label::Int(*v)).collect(),
        DatumType::I32 => tensor
            .as_slice::<i32>()?
            .iter()
            .map(|v| Label::Int(*v as i64))
            .collect(),
        DatumType::String => tensor
            .as_slice::<String>()?
            .iter()
            .map(|v| Label::Text(v.clone()))
            .collect(),
        DatumType::F32 => tensor
            .as_slice::<f32>()?
            .iter()
            .map(|v| Label::Int(v.round() as i64))
            .collect(),
        other => bail!("Unsupported label tensor type {:?}", other),
    };
    Ok(labels)
}

fn probability_rows(tensor: &Tensor, rows: usize) -> Result<Vec<Vec<f64>>> {
    let view = tensor.to_array_view::<f32>()?;
    let values: Vec<f64> = view.iter().map(|v| *v as f64).collect();
    if rows == 0 || values.len() % rows != 0 {
        bail!(
            "Probability output has {} values, not divisible into {} rows",
            values.len(),
            rows
        );
    }
    let classes = values.len() / rows;
    Ok(values.chunks(classes).map(|c| c.to_vec()).collect())
}

fn argmax_label(row: &[f64]) -> Label {
    let idx = row
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    Label::Int(idx as i64)
}
