//! In-memory tabular datasets and their loaders.
//!
//! A [`Dataset`] is an ordered list of column names plus rows of [`Value`]
//! cells addressed by position, so duplicate or empty column names survive
//! loading untouched. Delimited text and JSON inputs are supported; JSON may
//! be a list of records, an object of column arrays, or a single record.

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result, bail};
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use serde_json::Value as JsonValue;

use crate::{
    data::{Value, is_null_token},
    io_utils::{self, FileFormat},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset, padding short rows with `Null` and dropping surplus cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor from raw text cells.
    pub fn from_text_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| Value::from_raw(cell)).collect())
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Display strings of the non-null cells of a column, in row order.
    pub fn non_null_strings(&self, index: usize) -> impl Iterator<Item = String> + '_ {
        self.column(index)
            .filter(|value| !value.is_null())
            .map(Value::as_display)
    }

    pub fn non_null_count(&self, index: usize) -> usize {
        self.column(index).filter(|value| !value.is_null()).count()
    }

    pub fn distinct_non_null_count(&self, index: usize) -> usize {
        self.non_null_strings(index).collect::<HashSet<_>>().len()
    }

    /// Share of non-null cells, in percent. An empty dataset is 0% complete.
    pub fn completeness(&self) -> f64 {
        let cells = self.row_count() * self.column_count();
        if cells == 0 {
            return 0.0;
        }
        let filled = self
            .rows
            .iter()
            .flatten()
            .filter(|value| !value.is_null())
            .count();
        filled as f64 / cells as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub format: Option<FileFormat>,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let text = io_utils::read_text(path, options.encoding)?;
    let dataset = match FileFormat::resolve(path, options.format) {
        FileFormat::Csv => {
            let delimiter = io_utils::resolve_delimiter(path, options.delimiter);
            debug!(
                "Reading {:?} as delimited text (delimiter '{}')",
                path,
                io_utils::printable_delimiter(delimiter)
            );
            parse_delimited(&text, delimiter)
        }
        FileFormat::Json => {
            debug!("Reading {path:?} as JSON");
            parse_json(&text)
        }
    }
    .with_context(|| format!("Loading dataset from {path:?}"))?;
    debug!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        dataset.row_count(),
        dataset.column_count(),
        path
    );
    Ok(dataset)
}

pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Dataset> {
    let mut reader = io_utils::csv_reader(text.as_bytes(), delimiter);
    let columns = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        rows.push(record.iter().map(Value::from_raw).collect());
    }
    Ok(Dataset::new(columns, rows))
}

pub fn parse_json(text: &str) -> Result<Dataset> {
    let document: JsonValue = serde_json::from_str(text).context("Parsing JSON document")?;
    match document {
        JsonValue::Array(records) => from_records(records),
        JsonValue::Object(object) if object.values().any(JsonValue::is_array) => {
            let columns = object.keys().cloned().collect::<Vec<_>>();
            let height = object
                .values()
                .map(|value| value.as_array().map_or(1, Vec::len))
                .max()
                .unwrap_or(0);
            let mut rows = vec![Vec::with_capacity(columns.len()); height];
            for value in object.values() {
                for (row_idx, row) in rows.iter_mut().enumerate() {
                    let cell = match value {
                        JsonValue::Array(items) => items.get(row_idx).map(json_cell),
                        scalar => Some(json_cell(scalar)),
                    };
                    row.push(cell.unwrap_or(Value::Null));
                }
            }
            Ok(Dataset::new(columns, rows))
        }
        JsonValue::Object(object) => from_records(vec![JsonValue::Object(object)]),
        _ => bail!("Unsupported JSON structure: expected an array or an object"),
    }
}

fn from_records(records: Vec<JsonValue>) -> Result<Dataset> {
    let mut columns: Vec<String> = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            bail!("Record {} is not a JSON object", idx + 1);
        };
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|object| {
            columns
                .iter()
                .map(|column| object.get(column).map_or(Value::Null, json_cell))
                .collect()
        })
        .collect();
    Ok(Dataset::new(columns, rows))
}

fn json_cell(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => n.as_f64().map_or(Value::Null, Value::Number),
        },
        JsonValue::String(s) if is_null_token(s) => Value::Null,
        JsonValue::String(s) => Value::Text(s.clone()),
        nested => Value::Text(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_text_keeps_duplicate_headers_and_pads_rows() {
        let dataset = parse_delimited("id,name,name\n1,Ann,A\n2,Bob\n", b',').unwrap();
        assert_eq!(dataset.columns(), ["id", "name", "name"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.rows()[1][2], Value::Null);
        assert_eq!(dataset.rows()[0][0], Value::Integer(1));
    }

    #[test]
    fn json_records_union_their_keys() {
        let dataset = parse_json(r#"[{"a": 1, "b": "x"}, {"b": null, "c": true}]"#).unwrap();
        assert_eq!(dataset.columns(), ["a", "b", "c"]);
        assert_eq!(dataset.rows()[1][0], Value::Null);
        assert_eq!(dataset.rows()[1][2], Value::Boolean(true));
    }

    #[test]
    fn json_integers_are_exact() {
        let dataset = parse_json(r#"[{"id": 9007199254740993, "score": 2.5}]"#).unwrap();
        assert_eq!(dataset.rows()[0][0], Value::Integer(9_007_199_254_740_993));
        assert_eq!(dataset.rows()[0][1], Value::Number(2.5));
    }

    #[test]
    fn json_column_object_pads_short_columns() {
        let dataset = parse_json(r#"{"a": [1, 2, 3], "b": ["x"]}"#).unwrap();
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.rows()[2][1], Value::Null);
    }

    #[test]
    fn json_single_record_is_one_row() {
        let dataset = parse_json(r#"{"a": 1, "b": "N/A"}"#).unwrap();
        assert_eq!(dataset.row_count(), 1);
        assert_eq!(dataset.rows()[0][1], Value::Null);
    }

    #[test]
    fn json_scalars_are_rejected() {
        assert!(parse_json("42").is_err());
        assert!(parse_json("[1, 2]").is_err());
    }

    #[test]
    fn completeness_counts_filled_cells() {
        let dataset = Dataset::from_text_rows(&["a", "b"], &[&["1", ""], &["", ""]]);
        assert_eq!(dataset.completeness(), 25.0);
        assert_eq!(Dataset::default().completeness(), 0.0);
    }

    #[test]
    fn distinct_counts_ignore_nulls() {
        let dataset = Dataset::from_text_rows(&["a"], &[&["x"], &["x"], &["y"], &[""]]);
        assert_eq!(dataset.non_null_count(0), 3);
        assert_eq!(dataset.distinct_non_null_count(0), 2);
    }
}
