//! Cross-column value overlap detection.
//!
//! Each eligible column contributes a bounded random sample of its non-null
//! values (as display strings). Every unordered pair of sampled columns is
//! compared by `|a ∩ b| / min(|a|, |b|)` over the distinct sampled values;
//! pairs above the overlap floor are recorded on both columns.
//!
//! Identifier-like columns, whose distinct count exceeds
//! `identifier_ratio × rows`, are skipped. Sampling is random unless a seed
//! is supplied.

use std::collections::HashSet;

use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

pub const DEFAULT_SAMPLE_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContaminationOptions {
    /// Upper bound on sampled values per column.
    pub sample_cap: usize,
    /// Pairs must overlap strictly more than this fraction to be reported.
    pub min_overlap: f64,
    pub identifier_ratio: f64,
    pub seed: Option<u64>,
    /// Only the first N eligible columns take part in pairwise comparison.
    /// Identifier-like and all-null columns are not eligible.
    pub max_columns: Option<usize>,
}

impl Default for ContaminationOptions {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            min_overlap: 0.1,
            identifier_ratio: 0.9,
            seed: None,
            max_columns: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlap {
    pub column: String,
    /// Whole percent of the smaller sample found in both columns.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnContamination {
    pub column: String,
    pub overlaps: Vec<Overlap>,
}

/// Overlaps per column, in dataset column order. Columns without any
/// reported overlap are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContaminationReport {
    columns: Vec<ColumnContamination>,
}

impl ContaminationReport {
    pub fn columns(&self) -> &[ColumnContamination] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn overlaps_for(&self, column: &str) -> &[Overlap] {
        self.columns
            .iter()
            .find(|entry| entry.column == column)
            .map_or(&[], |entry| entry.overlaps.as_slice())
    }

    /// Each reported pair once, in discovery order.
    pub fn pairs(&self) -> Vec<(&str, &str, u32)> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for entry in &self.columns {
            for overlap in &entry.overlaps {
                let key = if entry.column <= overlap.column {
                    (entry.column.as_str(), overlap.column.as_str())
                } else {
                    (overlap.column.as_str(), entry.column.as_str())
                };
                if seen.insert(key) {
                    pairs.push((key.0, key.1, overlap.percentage));
                }
            }
        }
        pairs
    }
}

pub fn detect_contamination(dataset: &Dataset, options: &ContaminationOptions) -> ContaminationReport {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let identifier_limit = options.identifier_ratio * dataset.row_count() as f64;

    let mut samples: Vec<(usize, HashSet<String>)> = Vec::new();
    for column in 0..dataset.column_count() {
        if options.max_columns.is_some_and(|max| samples.len() >= max) {
            debug!("Column cap reached; remaining columns are not compared");
            break;
        }
        let distinct = dataset.distinct_non_null_count(column);
        if distinct as f64 > identifier_limit {
            debug!(
                "Skipping identifier-like column '{}' ({} distinct of {} rows)",
                dataset.columns()[column],
                distinct,
                dataset.row_count()
            );
            continue;
        }
        let values = dataset.non_null_strings(column).collect::<Vec<_>>();
        if values.is_empty() {
            continue;
        }
        let amount = options.sample_cap.min(values.len());
        let sample = values
            .choose_multiple(&mut rng, amount)
            .cloned()
            .collect::<HashSet<_>>();
        samples.push((column, sample));
    }

    let mut found: Vec<Vec<Overlap>> = vec![Vec::new(); dataset.column_count()];
    for (i, (left_idx, left)) in samples.iter().enumerate() {
        for (right_idx, right) in &samples[i + 1..] {
            let Some(ratio) = overlap_ratio(left, right) else {
                continue;
            };
            if ratio <= options.min_overlap {
                continue;
            }
            let percentage = (ratio * 100.0) as u32;
            let left_name = &dataset.columns()[*left_idx];
            let right_name = &dataset.columns()[*right_idx];
            debug!("Columns '{left_name}' and '{right_name}' share {percentage}% of values");
            found[*left_idx].push(Overlap {
                column: right_name.clone(),
                percentage,
            });
            found[*right_idx].push(Overlap {
                column: left_name.clone(),
                percentage,
            });
        }
    }

    let columns = dataset
        .columns()
        .iter()
        .zip(found)
        .filter(|(_, overlaps)| !overlaps.is_empty())
        .map(|(column, overlaps)| ColumnContamination {
            column: column.clone(),
            overlaps,
        })
        .collect();
    ContaminationReport { columns }
}

/// `None` when either side has nothing to compare.
fn overlap_ratio(left: &HashSet<String>, right: &HashSet<String>) -> Option<f64> {
    let smaller = left.len().min(right.len());
    if smaller == 0 {
        return None;
    }
    let shared = left.intersection(right).count();
    Some(shared as f64 / smaller as f64)
}
