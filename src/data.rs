use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Tokens treated as missing values when reading or cleaning cells.
const NULL_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none"];

/// A single cell of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Interprets a raw text cell: placeholders become `Null`, whole numbers
    /// that fit in an `i64` `Integer`, other finite numbers `Number`,
    /// `true`/`false` `Boolean`, anything else `Text`.
    ///
    /// Digit runs too long for an `i64` stay `Text` so they are never rounded.
    pub fn from_raw(raw: &str) -> Value {
        let trimmed = raw.trim();
        if is_null_token(trimmed) {
            return Value::Null;
        }
        if let Ok(integer) = trimmed.parse::<i64>() {
            return Value::Integer(integer);
        }
        if is_integer_literal(trimmed) {
            return Value::Text(raw.to_string());
        }
        if let Ok(number) = trimmed.parse::<f64>()
            && number.is_finite()
        {
            return Value::Number(number);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string form used for sampling and comparison.
    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_null_token(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    NULL_TOKENS.contains(&lowered.as_str())
}

/// Removes currency symbols and thousands separators.
pub fn clean_numeric(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !matches!(ch, '$' | '£' | '€' | ','))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn parse_numeric(value: &str) -> Option<f64> {
    clean_numeric(value)
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Best-effort calendar date from common date and timestamp layouts.
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%d %b %Y",
        "%d %B %Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%b %d %Y",
    ];

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}
