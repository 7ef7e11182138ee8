use serde::Serialize;

use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnUniqueness {
    pub column: String,
    /// Distinct non-null values over non-null values; `0.0` for an all-null column.
    pub ratio: f64,
}

pub fn uniqueness_ratio(dataset: &Dataset, column: usize) -> f64 {
    let non_null = dataset.non_null_count(column);
    if non_null == 0 {
        return 0.0;
    }
    dataset.distinct_non_null_count(column) as f64 / non_null as f64
}

pub fn uniqueness_scores(dataset: &Dataset) -> Vec<ColumnUniqueness> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| ColumnUniqueness {
            column: column.clone(),
            ratio: uniqueness_ratio(dataset, idx),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_ignores_nulls() {
        let dataset = Dataset::from_text_rows(
            &["id", "flag", "empty"],
            &[&["1", "y", ""], &["2", "y", "NA"], &["3", "", ""], &["4", "n", ""]],
        );
        let scores = uniqueness_scores(&dataset);
        assert_eq!(scores[0].ratio, 1.0);
        assert!((scores[1].ratio - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(scores[2].ratio, 0.0);
        assert_eq!(scores[2].column, "empty");
    }

    #[test]
    fn integers_beyond_f64_precision_stay_distinct() {
        let dataset = Dataset::from_text_rows(
            &["account"],
            &[&["9007199254740993"], &["9007199254740992"]],
        );
        assert_eq!(uniqueness_ratio(&dataset, 0), 1.0);
    }
}
