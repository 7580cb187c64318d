//! Show the feature schema the model expects

use anyhow::Result;
use scorer_lib::FeatureSchema;
use std::path::Path;
use tabled::Tabled;

use crate::output::{print_info, print_json, OutputFormat};

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Column")]
    column: String,
}

pub fn show_schema(features: &Path, format: OutputFormat) -> Result<()> {
    let schema = FeatureSchema::load(features)?;

    match format {
        OutputFormat::Json => print_json(&schema)?,
        OutputFormat::Table => {
            print_info(&format!("Feature schema from {}", features.display()));
            let rows: Vec<ColumnRow> = schema
                .columns()
                .iter()
                .enumerate()
                .map(|(index, column)| ColumnRow {
                    index,
                    column: column.clone(),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} columns", schema.len());
        }
    }

    Ok(())
}
