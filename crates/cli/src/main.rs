//! Diabetes Risk Scorer CLI
//!
//! A command-line tool for scoring patient records with the trained
//! model, either locally from the artifacts or through the scoring service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, schema, score};
use std::path::PathBuf;

/// Diabetes Risk Scorer CLI
#[derive(Parser)]
#[command(name = "dscore")]
#[command(author, version, about = "CLI for the Diabetes Risk Scorer", long_about = None)]
pub struct Cli {
    /// Scoring service URL (can also be set via DSCORE_API_URL env var)
    #[arg(long, env = "DSCORE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score records and print predictions with probabilities
    Score {
        /// JSON input file, or `-` for stdin
        #[arg(long, short, conflicts_with = "data", required_unless_present = "data")]
        input: Option<PathBuf>,

        /// Inline JSON input
        #[arg(long, short)]
        data: Option<String>,

        /// Model artifact (.onnx or .json)
        #[arg(long, env = "DSCORE_MODEL_PATH")]
        model: Option<PathBuf>,

        /// Feature schema (JSON list of column names)
        #[arg(long, env = "DSCORE_FEATURES_PATH")]
        features: Option<PathBuf>,

        /// Send the input to the scoring service instead of scoring locally
        #[arg(long)]
        remote: bool,
    },

    /// Show the feature columns the model expects
    Schema {
        /// Feature schema (JSON list of column names)
        #[arg(long, env = "DSCORE_FEATURES_PATH")]
        features: Option<PathBuf>,
    },

    /// Show scoring service health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    match cli.command {
        Commands::Score {
            input,
            data,
            model,
            features,
            remote,
        } => {
            let text = score::read_input(input.as_deref(), data)?;
            if remote {
                let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
                score::score(score::Backend::Remote(&client), text, cli.format).await?;
            } else {
                let paths = config.artifact_paths(model, features);
                score::score(score::Backend::Local(paths), text, cli.format).await?;
            }
        }
        Commands::Schema { features } => {
            let paths = config.artifact_paths(None, features);
            schema::show_schema(&paths.features, cli.format)?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            health::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
