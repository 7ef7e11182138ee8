//! Applies a mapping to a source dataset and writes the result.
//!
//! Output columns follow the mapping's target order. Each target is coerced
//! according to the value pattern of its template column: numeric targets
//! parse every cell as a number, date targets as a calendar date. A cell that
//! does not coerce becomes `Null`; the rest of the column is unaffected.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::{Map, Number, Value as JsonValue};

use crate::{
    data::{Value, clean_numeric, is_null_token, parse_lenient_date, parse_numeric},
    dataset::Dataset,
    io_utils,
    mapping::Mapping,
    pattern::{ValuePattern, detect_pattern},
};

/// Builds the template-shaped dataset described by `mapping`.
pub fn apply_mapping(
    source: &Dataset,
    template: &Dataset,
    mapping: &Mapping,
    sample_size: usize,
) -> Dataset {
    let columns = mapping
        .entries()
        .iter()
        .map(|entry| entry.target.clone())
        .collect::<Vec<_>>();
    let mut rows = vec![Vec::with_capacity(columns.len()); source.row_count()];

    for entry in mapping.entries() {
        let pattern = template
            .column_index(&entry.target)
            .map_or(ValuePattern::Text, |idx| {
                detect_pattern(template, idx, sample_size)
            });
        let source_idx = entry
            .source
            .as_deref()
            .and_then(|name| source.column_index(name));
        match source_idx {
            Some(idx) => {
                let mut failed = 0usize;
                for (row, value) in rows.iter_mut().zip(source.column(idx)) {
                    let coerced = coerce(value, pattern);
                    if coerced.is_null() && !value.is_null() {
                        failed += 1;
                    }
                    row.push(coerced);
                }
                if failed > 0 {
                    debug!(
                        "{} value(s) in '{}' could not be read as {} and were cleared",
                        failed, entry.target, pattern
                    );
                }
            }
            None => {
                if let Some(missing) = entry.source.as_deref() {
                    debug!("Source column '{missing}' not found; '{}' left empty", entry.target);
                }
                rows.iter_mut().for_each(|row| row.push(Value::Null));
            }
        }
    }
    Dataset::new(columns, rows)
}

fn coerce(value: &Value, pattern: ValuePattern) -> Value {
    match (value, pattern) {
        (Value::Null, _) => Value::Null,
        (Value::Integer(_) | Value::Number(_), ValuePattern::Numeric)
        | (Value::Date(_), ValuePattern::Date) => value.clone(),
        (_, ValuePattern::Numeric) => coerce_numeric(&value.as_display()),
        (_, ValuePattern::Date) => {
            parse_lenient_date(&value.as_display()).map_or(Value::Null, Value::Date)
        }
        (Value::Text(text), _) => {
            let trimmed = text.trim();
            if is_null_token(trimmed) {
                Value::Null
            } else {
                Value::Text(trimmed.to_string())
            }
        }
        (other, _) => other.clone(),
    }
}

fn coerce_numeric(text: &str) -> Value {
    if let Ok(integer) = clean_numeric(text).parse::<i64>() {
        return Value::Integer(integer);
    }
    parse_numeric(text).map_or(Value::Null, Value::Number)
}

pub fn write_csv(dataset: &Dataset, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::csv_writer(io_utils::open_output(path)?, delimiter);
    writer
        .write_record(dataset.columns())
        .with_context(|| format!("Writing header to {path:?}"))?;
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(Value::as_display))
            .with_context(|| format!("Writing row to {path:?}"))?;
    }
    writer.flush().with_context(|| format!("Flushing {path:?}"))?;
    info!("Wrote {} row(s) to {:?}", dataset.row_count(), path);
    Ok(())
}

/// Records-oriented JSON: one object per row, keys in column order.
pub fn to_json_records(dataset: &Dataset) -> JsonValue {
    JsonValue::Array(
        dataset
            .rows()
            .iter()
            .map(|row| {
                JsonValue::Object(
                    dataset
                        .columns()
                        .iter()
                        .cloned()
                        .zip(row.iter().map(json_value))
                        .collect::<Map<_, _>>(),
                )
            })
            .collect(),
    )
}

pub fn write_json(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = io_utils::open_output(path)?;
    serde_json::to_writer_pretty(&mut writer, &to_json_records(dataset))
        .with_context(|| format!("Writing JSON to {path:?}"))?;
    writeln!(writer).with_context(|| format!("Writing JSON to {path:?}"))?;
    writer.flush().with_context(|| format!("Flushing {path:?}"))?;
    info!("Wrote {} record(s) to {:?}", dataset.row_count(), path);
    Ok(())
}

fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => JsonValue::from(*n as i64),
        Value::Number(n) => Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
    }
}
