//! Value-based column classification.
//!
//! Looks at the first few non-null values of a column (as strings) and picks
//! the most specific pattern they all share. Checks run in a fixed order:
//! email, then numeric, then date, falling back to text. A column of
//! `20240101`-style values is therefore numeric, never date.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::{parse_lenient_date, parse_numeric},
    dataset::Dataset,
};

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuePattern {
    Email,
    Numeric,
    Date,
    Text,
}

impl ValuePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuePattern::Email => "email",
            ValuePattern::Numeric => "numeric",
            ValuePattern::Date => "date",
            ValuePattern::Text => "text",
        }
    }

    /// Text says nothing about a column's meaning.
    pub fn is_informative(&self) -> bool {
        !matches!(self, ValuePattern::Text)
    }
}

impl fmt::Display for ValuePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies already-sampled values. An empty sample is text.
pub fn classify_values<S: AsRef<str>>(sample: &[S]) -> ValuePattern {
    if sample.is_empty() {
        return ValuePattern::Text;
    }
    if sample.iter().all(|value| EMAIL_PATTERN.is_match(value.as_ref())) {
        return ValuePattern::Email;
    }
    if sample
        .iter()
        .all(|value| parse_numeric(value.as_ref()).is_some())
    {
        return ValuePattern::Numeric;
    }
    let dates = sample
        .iter()
        .filter(|value| parse_lenient_date(value.as_ref()).is_some())
        .count();
    if dates * 2 > sample.len() {
        return ValuePattern::Date;
    }
    ValuePattern::Text
}

/// Classifies one dataset column from its first `sample_size` non-null values.
pub fn detect_pattern(dataset: &Dataset, column: usize, sample_size: usize) -> ValuePattern {
    let sample = dataset
        .non_null_strings(column)
        .take(sample_size)
        .collect::<Vec<_>>();
    classify_values(&sample)
}

/// Pattern of every column, in column order.
pub fn detect_patterns(dataset: &Dataset, sample_size: usize) -> Vec<ValuePattern> {
    (0..dataset.column_count())
        .map(|column| detect_pattern(dataset, column, sample_size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_is_text() {
        let empty: [&str; 0] = [];
        assert_eq!(classify_values(&empty), ValuePattern::Text);
    }

    #[test]
    fn email_requires_every_value() {
        assert_eq!(
            classify_values(&["a@example.com", "b.c+d@mail.co.uk"]),
            ValuePattern::Email
        );
        assert_eq!(
            classify_values(&["a@example.com", "not an email"]),
            ValuePattern::Text
        );
    }

    #[test]
    fn currency_values_are_numeric() {
        assert_eq!(
            classify_values(&["$1,200.00", "€35", "17"]),
            ValuePattern::Numeric
        );
    }

    #[test]
    fn numeric_wins_over_date_like_integers() {
        assert_eq!(classify_values(&["20240101", "20240102"]), ValuePattern::Numeric);
    }

    #[test]
    fn date_needs_strict_majority() {
        assert_eq!(
            classify_values(&["2024-01-01", "01/02/2024", "soon"]),
            ValuePattern::Date
        );
        assert_eq!(classify_values(&["2024-01-01", "soon"]), ValuePattern::Text);
    }

    #[test]
    fn detect_pattern_skips_nulls_and_samples_head() {
        let dataset = Dataset::from_text_rows(
            &["when"],
            &[&[""], &["2024-03-01"], &["NA"], &["2024-03-02"]],
        );
        assert_eq!(detect_pattern(&dataset, 0, 10), ValuePattern::Date);
        let blank = Dataset::from_text_rows(&["x"], &[&[""], &[""]]);
        assert_eq!(detect_pattern(&blank, 0, 10), ValuePattern::Text);
    }
}
