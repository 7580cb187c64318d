//! Tabular view of caller input
//!
//! Input arrives as records, as an object of columns, or wrapped in the
//! hosted deployment envelope (`input_data` / `fields` / `values`). All of
//! them are normalized into a [`Table`] and then reindexed to the feature
//! schema before inference.

use crate::classifier::FeatureMatrix;
use crate::error::ScoreError;
use crate::models::ScoreInput;
use crate::schema::FeatureSchema;
use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Key of the hosted deployment envelope
pub const ENVELOPE_KEY: &str = "input_data";

/// Named columns with row-major JSON cells; absent cells are `null`
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Resolve caller input and shape it into a table
    pub fn from_input(input: ScoreInput) -> Result<Self, ScoreError> {
        let value = input.into_value()?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ScoreError> {
        let table = match value {
            Value::Null => Ok(Self::new(Vec::new(), Vec::new())),
            Value::Array(items) => Self::from_records(items),
            Value::Object(map) => match map.get(ENVELOPE_KEY) {
                Some(Value::Array(entries)) => Self::from_envelope(entries),
                _ => Self::from_columns(map),
            },
            other => Err(anyhow!(
                "expected a list of records or an object of columns, got {}",
                json_type(&other)
            )),
        };
        table.map_err(|e| ScoreError::InvalidInput(e.to_string()))
    }

    fn from_records(items: Vec<Value>) -> Result<Self> {
        let mut records = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => records.push(map),
                other => bail!("record {} is not a JSON object (got {})", i, json_type(&other)),
            }
        }
        Ok(Self::from_maps(records))
    }

    /// Column set is the union of keys in first-appearance order
    fn from_maps(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for record in &records {
            for key in record.keys() {
                if !index.contains_key(key) {
                    index.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; columns.len()];
                for (key, value) in record {
                    row[index[&key]] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    fn from_columns(map: Map<String, Value>) -> Result<Self> {
        let mut num_rows: Option<usize> = None;
        for (name, value) in &map {
            match value {
                Value::Array(values) => match num_rows {
                    Some(n) if n != values.len() => {
                        bail!("all column arrays must be of the same length (column '{}' has {}, expected {})", name, values.len(), n)
                    }
                    _ => num_rows = Some(values.len()),
                },
                Value::Object(_) => {
                    bail!("column '{}' holds an object; expected an array or a scalar", name)
                }
                _ => {}
            }
        }
        let num_rows = num_rows.ok_or_else(|| {
            anyhow!("all column values are scalars; supply a list of records or arrays of values")
        })?;

        let columns: Vec<String> = map.keys().cloned().collect();
        let mut rows = vec![Vec::with_capacity(columns.len()); num_rows];
        for value in map.into_values() {
            match value {
                Value::Array(values) => {
                    for (row, cell) in rows.iter_mut().zip(values) {
                        row.push(cell);
                    }
                }
                scalar => {
                    for row in rows.iter_mut() {
                        row.push(scalar.clone());
                    }
                }
            }
        }

        Ok(Self { columns, rows })
    }

    fn from_envelope(entries: &[Value]) -> Result<Self> {
        let mut records = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            let fields = entry
                .get("fields")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("{}[{}] is missing a 'fields' array", ENVELOPE_KEY, i))?;
            let fields: Vec<&str> = fields
                .iter()
                .map(|f| {
                    f.as_str()
                        .ok_or_else(|| anyhow!("{}[{}].fields must contain strings", ENVELOPE_KEY, i))
                })
                .collect::<Result<_>>()?;
            let values = entry
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("{}[{}] is missing a 'values' array", ENVELOPE_KEY, i))?;

            for (j, row) in values.iter().enumerate() {
                let row = row
                    .as_array()
                    .ok_or_else(|| anyhow!("{}[{}].values[{}] is not an array", ENVELOPE_KEY, i, j))?;
                if row.len() != fields.len() {
                    bail!(
                        "{}[{}].values[{}] has {} values for {} fields",
                        ENVELOPE_KEY,
                        i,
                        j,
                        row.len(),
                        fields.len()
                    );
                }
                let record: Map<String, Value> = fields
                    .iter()
                    .map(|f| f.to_string())
                    .zip(row.iter().cloned())
                    .collect();
                records.push(record);
            }
        }
        Ok(Self::from_maps(records))
    }

    /// Reindex to exactly the schema columns, in schema order.
    ///
    /// Schema columns absent from the input are filled with `0`; input
    /// columns outside the schema are dropped.
    pub fn align(&self, schema: &FeatureSchema) -> Table {
        let sources: Vec<Option<usize>> = schema
            .columns()
            .iter()
            .map(|name| self.column_index(name))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|source| match source {
                        Some(i) => row[*i].clone(),
                        None => Value::from(0),
                    })
                    .collect()
            })
            .collect();

        Table {
            columns: schema.columns().to_vec(),
            rows,
        }
    }

    /// Convert every cell to `f64` for the model
    pub fn to_matrix(&self) -> Result<FeatureMatrix> {
        let mut data = Vec::with_capacity(self.rows.len() * self.columns.len());
        for row in &self.rows {
            for (cell, column) in row.iter().zip(&self.columns) {
                data.push(cell_to_f64(cell, column)?);
            }
        }
        FeatureMatrix::new(self.columns.clone(), self.rows.len(), data)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in the named column
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Numeric reading of a cell, if it holds one
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.value(row, column)
            .and_then(|v| cell_to_f64(v, column).ok())
            .filter(|v| !v.is_nan())
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                Value::Object(
                    self.columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect(),
                )
            })
            .collect()
    }
}

fn cell_to_f64(value: &Value, column: &str) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("column '{}' holds a number outside f64 range", column)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("could not convert string to float: '{}' (column '{}')", s, column)),
        Value::Array(_) | Value::Object(_) => {
            bail!("column '{}' holds a nested {}; expected a number", column, json_type(value))
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
