//! Core data models for the scorer

use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Predicted class label; its type is whatever the model emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl Label {
    /// True when the label denotes the positive class (`1`)
    pub fn is_positive(&self) -> bool {
        match self {
            Label::Int(v) => *v == 1,
            Label::Text(s) => s.trim() == "1",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(v) => write!(f, "{}", v),
            Label::Text(s) => f.write_str(s),
        }
    }
}

/// Raw caller input, resolved once at the start of normalization
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreInput {
    /// JSON text still to be parsed
    Text(String),
    /// Already-structured data
    Records(Value),
}

impl ScoreInput {
    /// Build input from an HTTP body: valid JSON is used as structured data,
    /// anything else is kept as text so parsing reports the failure.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from(value),
            Err(_) => ScoreInput::Text(body.to_string()),
        }
    }

    /// Resolve into a JSON value, parsing text input
    pub fn into_value(self) -> Result<Value, ScoreError> {
        match self {
            ScoreInput::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ScoreError::InvalidInput(e.to_string()))
            }
            ScoreInput::Records(value) => Ok(value),
        }
    }
}

impl From<Value> for ScoreInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ScoreInput::Text(text),
            other => ScoreInput::Records(other),
        }
    }
}

impl From<String> for ScoreInput {
    fn from(text: String) -> Self {
        ScoreInput::Text(text)
    }
}

impl From<&str> for ScoreInput {
    fn from(text: &str) -> Self {
        ScoreInput::Text(text.to_string())
    }
}

/// Successful scoring output, one entry per input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub predictions: Vec<Label>,
    pub probabilities: Vec<f64>,
}

impl ScoreOutput {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Wire response: either predictions or a single error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreResponse {
    Success(ScoreOutput),
    Error { error: String },
}

impl ScoreResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, ScoreResponse::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ScoreResponse::Error { error } => Some(error),
            ScoreResponse::Success(_) => None,
        }
    }
}

impl From<Result<ScoreOutput, ScoreError>> for ScoreResponse {
    fn from(result: Result<ScoreOutput, ScoreError>) -> Self {
        match result {
            Ok(output) => ScoreResponse::Success(output),
            Err(e) => ScoreResponse::Error { error: e.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_string_becomes_text() {
        let input = ScoreInput::from(json!("[{\"bmi\": 22.0}]"));
        assert_eq!(input, ScoreInput::Text("[{\"bmi\": 22.0}]".to_string()));
    }

    #[test]
    fn test_from_body_keeps_invalid_json_as_text() {
        assert_eq!(ScoreInput::from_body("{not valid json"), ScoreInput::Text("{not valid json".into()));
        assert_eq!(ScoreInput::from_body("[]"), ScoreInput::Records(json!([])));
    }

    #[test]
    fn test_invalid_text_is_invalid_input() {
        let err = ScoreInput::from("{not valid json").into_value().unwrap_err();
        assert!(err.to_string().starts_with("Invalid input format: "));
    }

    #[test]
    fn test_response_serialization() {
        let ok = ScoreResponse::Success(ScoreOutput {
            predictions: vec![Label::Int(1), Label::Int(0)],
            probabilities: vec![0.75, 0.25],
        });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"predictions": [1, 0], "probabilities": [0.75, 0.25]})
        );

        let err = ScoreResponse::from(Err(ScoreError::ArtifactsMissing));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": "Model or feature file not found."})
        );
    }

    #[test]
    fn test_response_deserialization() {
        let resp: ScoreResponse = serde_json::from_value(json!({"error": "boom"})).unwrap();
        assert_eq!(resp.error_message(), Some("boom"));

        let resp: ScoreResponse =
            serde_json::from_value(json!({"predictions": ["yes"], "probabilities": [0.9]})).unwrap();
        assert!(!resp.is_error());
    }

    #[test]
    fn test_label_positive() {
        assert!(Label::Int(1).is_positive());
        assert!(!Label::Int(0).is_positive());
        assert!(Label::Text("1".into()).is_positive());
        assert!(!Label::Text("no".into()).is_positive());
    }
}
