//! The target → source field mapping produced by the matcher.
//!
//! A [`Mapping`] is an ordered list of [`FieldMapping`] entries, one per
//! target column in template order. It is passed by value through each
//! refinement step (assignment, pattern enhancement, manual overrides) and is
//! never shared mutably between steps.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

/// Confidence at or above which a mapping is accepted without review.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Why a target column was matched to its source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBasis {
    Exact,
    Synonym,
    WordOverlap,
    Fuzzy,
    Pattern,
    Manual,
    Unmatched,
}

impl MatchBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchBasis::Exact => "exact",
            MatchBasis::Synonym => "synonym",
            MatchBasis::WordOverlap => "word-overlap",
            MatchBasis::Fuzzy => "fuzzy",
            MatchBasis::Pattern => "pattern",
            MatchBasis::Manual => "manual",
            MatchBasis::Unmatched => "unmatched",
        }
    }
}

impl fmt::Display for MatchBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub target: String,
    pub source: Option<String>,
    /// Trust in the match, `0.0..=1.0`. Always `0.0` when `source` is absent.
    pub confidence: f64,
    pub basis: MatchBasis,
}

impl FieldMapping {
    pub fn unmapped(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: None,
            confidence: 0.0,
            basis: MatchBasis::Unmatched,
        }
    }

    pub fn matched(
        target: impl Into<String>,
        source: impl Into<String>,
        confidence: f64,
        basis: MatchBasis,
    ) -> Self {
        Self {
            target: target.into(),
            source: Some(source.into()),
            confidence: confidence.clamp(0.0, 1.0),
            basis,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.source.is_some()
    }

    /// Unmapped, or mapped below `cutoff`.
    pub fn needs_review(&self, cutoff: f64) -> bool {
        self.source.is_none() || self.confidence < cutoff
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    entries: Vec<FieldMapping>,
}

impl Mapping {
    pub fn new(entries: Vec<FieldMapping>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [FieldMapping] {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<FieldMapping> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry for `target`.
    pub fn get(&self, target: &str) -> Option<&FieldMapping> {
        self.entries.iter().find(|entry| entry.target == target)
    }

    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.get(target).and_then(|entry| entry.source.as_deref())
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_mapped()).count()
    }

    pub fn unmapped_count(&self) -> usize {
        self.entries.len() - self.mapped_count()
    }

    pub fn used_sources(&self) -> HashSet<&str> {
        self.entries
            .iter()
            .filter_map(|entry| entry.source.as_deref())
            .collect()
    }

    /// True when no source column backs two targets.
    pub fn is_one_to_one(&self) -> bool {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter_map(|entry| entry.source.as_deref())
            .all(|source| seen.insert(source))
    }

    pub fn needs_review(&self, cutoff: f64) -> impl Iterator<Item = &FieldMapping> {
        self.entries
            .iter()
            .filter(move |entry| entry.needs_review(cutoff))
    }

    pub fn quality(&self) -> MappingQuality {
        MappingQuality::of(self)
    }
}

impl FromIterator<FieldMapping> for Mapping {
    fn from_iter<I: IntoIterator<Item = FieldMapping>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Aggregate statistics stored alongside a saved configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingQuality {
    pub total_mappings: usize,
    pub successful_mappings: usize,
    /// Mapped share of targets, in percent.
    pub completeness: f64,
    /// Mean confidence of mapped targets, `0.0..=1.0`.
    pub average_confidence: f64,
    pub high_confidence_mappings: usize,
}

impl MappingQuality {
    pub fn of(mapping: &Mapping) -> Self {
        let total = mapping.len();
        if total == 0 {
            return Self::default();
        }
        let mapped = mapping
            .entries()
            .iter()
            .filter(|entry| entry.is_mapped())
            .collect::<Vec<_>>();
        let average_confidence = if mapped.is_empty() {
            0.0
        } else {
            mapped.iter().map(|entry| entry.confidence).sum::<f64>() / mapped.len() as f64
        };
        let high_confidence_mappings = mapped
            .iter()
            .filter(|entry| entry.confidence >= HIGH_CONFIDENCE)
            .count();
        Self {
            total_mappings: total,
            successful_mappings: mapped.len(),
            completeness: mapped.len() as f64 / total as f64 * 100.0,
            average_confidence,
            high_confidence_mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mapping {
        Mapping::new(vec![
            FieldMapping::matched("Email", "email", 0.95, MatchBasis::Synonym),
            FieldMapping::matched("Joined", "signup", 0.6, MatchBasis::Pattern),
            FieldMapping::unmapped("Notes"),
        ])
    }

    #[test]
    fn counts_mapped_and_unmapped() {
        let mapping = sample();
        assert_eq!(mapping.mapped_count(), 2);
        assert_eq!(mapping.unmapped_count(), 1);
        assert_eq!(mapping.source_for("Email"), Some("email"));
        assert_eq!(mapping.source_for("Notes"), None);
    }

    #[test]
    fn review_list_covers_unmapped_and_low_confidence() {
        let mapping = sample();
        let targets = mapping
            .needs_review(HIGH_CONFIDENCE)
            .map(|entry| entry.target.as_str())
            .collect::<Vec<_>>();
        assert_eq!(targets, vec!["Joined", "Notes"]);
    }

    #[test]
    fn one_to_one_detects_shared_sources() {
        let mut mapping = sample();
        assert!(mapping.is_one_to_one());
        mapping.entries_mut()[2] = FieldMapping::matched("Notes", "email", 1.0, MatchBasis::Manual);
        assert!(!mapping.is_one_to_one());
    }

    #[test]
    fn quality_reports_completeness_and_confidence() {
        let quality = sample().quality();
        assert_eq!(quality.total_mappings, 3);
        assert_eq!(quality.successful_mappings, 2);
        assert!((quality.completeness - 66.666).abs() < 0.01);
        assert!((quality.average_confidence - 0.775).abs() < 1e-9);
        assert_eq!(quality.high_confidence_mappings, 1);
    }

    #[test]
    fn quality_of_empty_mapping_is_zero() {
        assert_eq!(Mapping::default().quality(), MappingQuality::default());
    }
}
