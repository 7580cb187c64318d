//! Score input locally or through the scoring service

use anyhow::{bail, Context, Result};
use colored::Colorize;
use scorer_lib::{
    risk::{GLUCOSE_COLUMN, HBA1C_COLUMN},
    ArtifactPaths, RiskTier, ScoreInput, ScoreOutput, ScoreResponse, Scorer, Table,
};
use std::io::Read;
use std::path::Path;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_probability, color_risk, print_error, print_json, print_warning, OutputFormat,
};

/// Where scoring happens
pub enum Backend<'a> {
    Local(ArtifactPaths),
    Remote(&'a ApiClient),
}

/// Row for the predictions table
#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "Risk")]
    risk: String,
}

/// Read input text from a file, `-` for stdin, or an inline argument
pub fn read_input(input: Option<&Path>, data: Option<String>) -> Result<String> {
    match (input, data) {
        (_, Some(data)) => Ok(data),
        (Some(path), None) if path == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read input from stdin")?;
            Ok(buf)
        }
        (Some(path), None) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        (None, None) => bail!("Provide input with --input <file|-> or --data <json>"),
    }
}

/// Score `text` and print the result
pub async fn score(backend: Backend<'_>, text: String, format: OutputFormat) -> Result<()> {
    let response = match backend {
        Backend::Local(paths) => {
            let input = ScoreInput::from(text.clone());
            tokio::task::spawn_blocking(move || Scorer::from_paths(paths).score(input))
                .await
                .context("Local scoring task failed")?
        }
        Backend::Remote(client) => client.score(text.clone()).await?,
    };

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => match &response {
            ScoreResponse::Success(output) => print_scores(&text, output),
            ScoreResponse::Error { error } => print_error(error),
        },
    }

    if let Some(error) = response.error_message() {
        bail!("Scoring failed: {}", error);
    }
    Ok(())
}

fn print_scores(text: &str, output: &ScoreOutput) {
    // The input already scored, so it parses; a failure only loses risk tiers.
    let table = Table::from_input(ScoreInput::from(text)).ok();

    let rows: Vec<ScoreRow> = output
        .predictions
        .iter()
        .zip(&output.probabilities)
        .enumerate()
        .map(|(i, (prediction, probability))| ScoreRow {
            index: i,
            prediction: prediction.to_string(),
            probability: color_probability(*probability),
            risk: table
                .as_ref()
                .map(|t| color_risk(RiskTier::assess_row(t, i, prediction).tier))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!("{}", "Diabetes Risk Predictions".bold());
    println!("{}", "=".repeat(60));
    let rendered = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", rendered);
    println!("\nTotal: {} rows", output.len());

    let has_markers = table.as_ref().is_some_and(|t| {
        t.column_index(HBA1C_COLUMN).is_some() || t.column_index(GLUCOSE_COLUMN).is_some()
    });
    if !has_markers {
        print_warning(&format!(
            "Input has no {} or {} column; risk tiers use the prediction only",
            HBA1C_COLUMN, GLUCOSE_COLUMN
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_wins() {
        let text = read_input(Some(Path::new("ignored.json")), Some("[]".into())).unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn test_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"[{"bmi": 30}]"#).unwrap();
        assert_eq!(read_input(Some(&path), None).unwrap(), r#"[{"bmi": 30}]"#);
    }

    #[test]
    fn test_requires_some_input() {
        assert!(read_input(None, None).is_err());
    }

    #[tokio::test]
    async fn test_local_missing_artifacts_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = score(
            Backend::Local(ArtifactPaths::in_dir(dir.path())),
            "[]".into(),
            OutputFormat::Json,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Model or feature file not found."));
    }
}
