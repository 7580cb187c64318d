//! Scoring service health

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use scorer_lib::ComponentStatus;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_success, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (http_status, health) = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{}", "Scorer Health".bold());
            println!("{}", "=".repeat(60));

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, c)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&status_name(c.status)),
                    last_check: format_timestamp(c.last_check_timestamp),
                    message: c.message.clone().unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            match health.status {
                ComponentStatus::Healthy => print_success("Scorer is healthy"),
                ComponentStatus::Degraded => print_warning("Scorer is degraded"),
                ComponentStatus::Unhealthy => print_warning("Scorer is unhealthy"),
            }
        }
    }

    if health.status == ComponentStatus::Unhealthy {
        bail!("Scorer is unhealthy (HTTP {})", http_status);
    }
    Ok(())
}

fn status_name(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "unhealthy",
    }
    .to_string()
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
