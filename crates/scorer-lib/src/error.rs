//! Error contract of the scoring pipeline
//!
//! Every failure of [`crate::Scorer`] ends up as one of these variants. The
//! `Display` text is exactly the message returned to callers under `error`.

use thiserror::Error;

/// Fixed message for absent model or schema files
pub const ARTIFACTS_MISSING_MESSAGE: &str = "Model or feature file not found.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// Model or feature schema file is absent
    #[error("Model or feature file not found.")]
    ArtifactsMissing,

    /// Artifacts exist but could not be read, verified or deserialized
    #[error("Failed to load model artifacts: {0}")]
    ArtifactLoad(String),

    /// Input could not be parsed or shaped into a table
    #[error("Invalid input format: {0}")]
    InvalidInput(String),

    /// Matrix conversion or model call failed
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

impl ScoreError {
    /// Short stable name, used as a metrics label and in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::ArtifactsMissing => "artifacts_missing",
            ScoreError::ArtifactLoad(_) => "artifact_load",
            ScoreError::InvalidInput(_) => "invalid_input",
            ScoreError::Prediction(_) => "prediction",
        }
    }

    /// Wrap an error chain as a load failure, keeping every context layer
    pub(crate) fn load(err: anyhow::Error) -> Self {
        ScoreError::ArtifactLoad(format!("{:#}", err))
    }

    /// Wrap an error chain as an inference failure, keeping every context layer
    pub(crate) fn prediction(err: anyhow::Error) -> Self {
        ScoreError::Prediction(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifacts_message_is_fixed() {
        assert_eq!(ScoreError::ArtifactsMissing.to_string(), ARTIFACTS_MISSING_MESSAGE);
    }

    #[test]
    fn test_messages_embed_details() {
        assert_eq!(
            ScoreError::InvalidInput("expected value at line 1 column 1".into()).to_string(),
            "Invalid input format: expected value at line 1 column 1"
        );
        assert_eq!(
            ScoreError::Prediction("Input X contains NaN.".into()).to_string(),
            "Prediction failed: Input X contains NaN."
        );
        assert_eq!(
            ScoreError::ArtifactLoad("bad header".into()).to_string(),
            "Failed to load model artifacts: bad header"
        );
    }

    #[test]
    fn test_context_chain_is_flattened() {
        let err = anyhow::anyhow!("root cause").context("Failed to parse ONNX model");
        assert_eq!(
            ScoreError::load(err),
            ScoreError::ArtifactLoad("Failed to parse ONNX model: root cause".into())
        );
    }
}
