//! Logistic regression exported as JSON
//!
//! Coefficients are stored in feature-schema order, optionally preceded by a
//! standard scaler (`(x - mean) / scale`).

use super::{Classification, Classifier, FeatureMatrix};
use crate::models::Label;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_classes")]
    pub classes: Vec<Label>,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_classes() -> Vec<Label> {
    vec![Label::Int(0), Label::Int(1)]
}

impl LogisticClassifier {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
            mean: None,
            scale: None,
            threshold: default_threshold(),
            classes: default_classes(),
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let model: Self = serde_json::from_slice(bytes).context("Invalid logistic model JSON")?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let n = self.coefficients.len();
        for (name, values) in [("mean", &self.mean), ("scale", &self.scale)] {
            if let Some(values) = values {
                if values.len() != n {
                    bail!("{} has {} entries for {} coefficients", name, values.len(), n);
                }
            }
        }
        if let Some(scale) = &self.scale {
            if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                bail!("scale entries must be finite and non-zero");
            }
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("threshold {} is outside [0, 1]", self.threshold);
        }
        if self.classes.len() != 2 {
            bail!("expected 2 classes, got {}", self.classes.len());
        }
        Ok(())
    }

    /// Positive-class probability per row
    fn positive_probabilities(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if features.cols() != self.coefficients.len() {
            bail!(
                "X has {} features, but LogisticClassifier is expecting {} features as input",
                features.cols(),
                self.coefficients.len()
            );
        }
        if features.data().iter().any(|v| v.is_nan()) {
            bail!("Input X contains NaN.");
        }

        Ok((0..features.rows())
            .map(|i| {
                let z = features
                    .row(i)
                    .iter()
                    .enumerate()
                    .fold(self.intercept, |acc, (j, x)| acc + self.coefficients[j] * self.standardize(j, *x));
                sigmoid(z)
            })
            .collect())
    }

    fn standardize(&self, j: usize, x: f64) -> f64 {
        let centered = match &self.mean {
            Some(mean) => x - mean[j],
            None => x,
        };
        match &self.scale {
            Some(scale) => centered / scale[j],
            None => centered,
        }
    }

    fn label_for(&self, p: f64) -> Label {
        if p >= self.threshold {
            self.classes[1].clone()
        } else {
            self.classes[0].clone()
        }
    }
}

impl Classifier for LogisticClassifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>> {
        Ok(self
            .positive_probabilities(features)?
            .into_iter()
            .map(|p| self.label_for(p))
            .collect())
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .positive_probabilities(features)?
            .into_iter()
            .map(|p| vec![1.0 - p, p])
            .collect())
    }

    fn classify(&self, features: &FeatureMatrix) -> Result<Classification> {
        let positive = self.positive_probabilities(features)?;
        Ok(Classification {
            labels: positive.iter().map(|p| self.label_for(*p)).collect(),
            probabilities: positive.into_iter().map(|p| vec![1.0 - p, p]).collect(),
        })
    }

    fn format(&self) -> &'static str {
        "logistic"
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
