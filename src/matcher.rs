//! End-to-end matching pipeline.
//!
//! [`ColumnMatcher`] owns the lexicon built from the settings and runs the
//! name-based assignment followed by the pattern pass. Contamination and
//! uniqueness are computed separately by [`profile_dataset`]; they never
//! touch the mapping.

use log::info;
use serde::Serialize;

use crate::{
    assign::OptimalAssigner,
    contamination::{ContaminationReport, detect_contamination},
    dataset::Dataset,
    enhance::enhance_with_patterns,
    lexicon::Lexicon,
    mapping::Mapping,
    pattern::{ValuePattern, detect_patterns},
    settings::MatcherSettings,
    similarity::HeaderScorer,
    uniqueness::uniqueness_ratio,
};

pub struct ColumnMatcher {
    settings: MatcherSettings,
    lexicon: Lexicon,
}

impl ColumnMatcher {
    pub fn new(settings: MatcherSettings) -> Self {
        let lexicon = settings.lexicon();
        Self { settings, lexicon }
    }

    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    pub fn scorer(&self) -> HeaderScorer<'_> {
        HeaderScorer::new(&self.lexicon)
    }

    /// Name-based assignment only.
    pub fn assign(&self, template: &Dataset, source: &Dataset) -> Mapping {
        OptimalAssigner::new(self.scorer(), self.settings.threshold)
            .assign(template.columns(), source.columns())
    }

    pub fn suggest(&self, template: &Dataset, source: &Dataset) -> Mapping {
        let initial = self.assign(template, source);
        let by_name = initial.mapped_count();
        let mapping = enhance_with_patterns(initial, source, template, &self.settings.patterns);
        info!(
            "Matched {} of {} template column(s) ({} by name, {} by value pattern)",
            mapping.mapped_count(),
            mapping.len(),
            by_name,
            mapping.mapped_count().saturating_sub(by_name)
        );
        mapping
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub pattern: ValuePattern,
    pub non_null: usize,
    pub distinct: usize,
    pub uniqueness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub completeness: f64,
    pub columns: Vec<ColumnProfile>,
    pub contamination: ContaminationReport,
}

/// Per-column descriptive signals plus the contamination report.
pub fn profile_dataset(dataset: &Dataset, settings: &MatcherSettings) -> DatasetProfile {
    let patterns = detect_patterns(dataset, settings.patterns.sample_size);
    let columns = dataset
        .columns()
        .iter()
        .zip(patterns)
        .enumerate()
        .map(|(idx, (column, pattern))| ColumnProfile {
            column: column.clone(),
            pattern,
            non_null: dataset.non_null_count(idx),
            distinct: dataset.distinct_non_null_count(idx),
            uniqueness: uniqueness_ratio(dataset, idx),
        })
        .collect();
    DatasetProfile {
        rows: dataset.row_count(),
        completeness: dataset.completeness(),
        columns,
        contamination: detect_contamination(dataset, &settings.contamination),
    }
}
