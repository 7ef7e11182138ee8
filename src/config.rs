//! Saved mapping configurations.
//!
//! A configuration records column names, the chosen mapping and summary
//! statistics, never cell values. Column structure is identified by a
//! fingerprint (SHA-256 over the sorted, `|`-joined names), which lets a
//! later run decide whether a stored mapping can be reused.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    dataset::Dataset,
    mapping::{FieldMapping, HIGH_CONFIDENCE, Mapping, MappingQuality, MatchBasis},
};

pub const CONFIG_VERSION: &str = "1.0";

/// Hex SHA-256 of the sorted column names joined with `|`.
pub fn fingerprint<S: AsRef<str>>(columns: &[S]) -> String {
    let mut names: Vec<&str> = columns.iter().map(|column| column.as_ref()).collect();
    names.sort_unstable();
    hex::encode(Sha256::digest(names.join("|").as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMapping {
    pub target: String,
    pub source_column: Option<String>,
    pub confidence_score: f64,
    pub mapping_type: MappingType,
    #[serde(default = "default_basis")]
    pub basis: MatchBasis,
}

fn default_basis() -> MatchBasis {
    MatchBasis::Manual
}

impl From<&FieldMapping> for SavedMapping {
    fn from(entry: &FieldMapping) -> Self {
        let mapping_type = if entry.confidence >= HIGH_CONFIDENCE {
            MappingType::Automatic
        } else {
            MappingType::Manual
        };
        Self {
            target: entry.target.clone(),
            source_column: entry.source.clone(),
            confidence_score: entry.confidence,
            mapping_type,
            basis: entry.basis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
}

impl DatasetStats {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            columns: dataset.columns().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigStatistics {
    pub source: DatasetStats,
    pub template: DatasetStats,
    pub mapping_quality: MappingQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub source_columns: Vec<String>,
    pub template_columns: Vec<String>,
    pub mapped_count: usize,
    pub unmapped_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConfiguration {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub source_fingerprint: String,
    pub template_fingerprint: String,
    pub mappings: Vec<SavedMapping>,
    pub statistics: ConfigStatistics,
    pub column_info: ColumnInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    ExactMatch,
    TemplateOnly,
    SourceOnly,
    NoMatch,
}

impl Compatibility {
    pub fn recommendation(&self) -> &'static str {
        match self {
            Compatibility::ExactMatch => "Perfect match! You can reuse all mappings.",
            Compatibility::TemplateOnly => {
                "Template matches. You can reuse mappings, but verify source data compatibility."
            }
            Compatibility::SourceOnly => {
                "Source data structure matches, but template is different. New mapping required."
            }
            Compatibility::NoMatch => "Different data structure detected. New mapping recommended.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    pub outcome: Compatibility,
    pub source_matches: bool,
    pub template_matches: bool,
    pub can_reuse_mappings: bool,
    pub recommendation: String,
}

impl SavedConfiguration {
    pub fn create(source: &Dataset, template: &Dataset, mapping: &Mapping) -> Self {
        let now = Utc::now();
        Self {
            version: CONFIG_VERSION.to_string(),
            created_at: now,
            last_updated: now,
            source_fingerprint: fingerprint(source.columns()),
            template_fingerprint: fingerprint(template.columns()),
            mappings: mapping.entries().iter().map(SavedMapping::from).collect(),
            statistics: ConfigStatistics {
                source: DatasetStats::of(source),
                template: DatasetStats::of(template),
                mapping_quality: mapping.quality(),
            },
            column_info: ColumnInfo {
                source_columns: source.columns().to_vec(),
                template_columns: template.columns().to_vec(),
                mapped_count: mapping.mapped_count(),
                unmapped_count: mapping.unmapped_count(),
            },
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing configuration to JSON")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Parsing configuration JSON")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_string()?;
        fs::write(path, json).with_context(|| format!("Writing configuration to {path:?}"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Reading configuration from {path:?}"))?;
        Self::from_json_str(&json).with_context(|| format!("Loading configuration {path:?}"))
    }

    pub fn check_compatibility<S: AsRef<str>>(
        &self,
        source_columns: &[S],
        template_columns: &[S],
    ) -> CompatibilityReport {
        let source_matches = fingerprint(source_columns) == self.source_fingerprint;
        let template_matches = fingerprint(template_columns) == self.template_fingerprint;
        let outcome = match (source_matches, template_matches) {
            (true, true) => Compatibility::ExactMatch,
            (false, true) => Compatibility::TemplateOnly,
            (true, false) => Compatibility::SourceOnly,
            (false, false) => Compatibility::NoMatch,
        };
        CompatibilityReport {
            outcome,
            source_matches,
            template_matches,
            can_reuse_mappings: template_matches,
            recommendation: outcome.recommendation().to_string(),
        }
    }

    /// `(target, source)` for every stored mapping that has a source.
    pub fn reusable_mappings(&self) -> Vec<(&str, &str)> {
        self.mappings
            .iter()
            .filter_map(|saved| {
                saved
                    .source_column
                    .as_deref()
                    .map(|source| (saved.target.as_str(), source))
            })
            .collect()
    }

    /// Rebuilds a mapping for a dataset with the given columns. Stored sources
    /// the dataset no longer has are dropped.
    pub fn restore_mapping<S: AsRef<str>>(&self, source_columns: &[S]) -> Mapping {
        self.mappings
            .iter()
            .map(|saved| match saved.source_column.as_deref() {
                Some(source) if source_columns.iter().any(|c| c.as_ref() == source) => {
                    FieldMapping::matched(
                        saved.target.clone(),
                        source,
                        saved.confidence_score,
                        saved.basis,
                    )
                }
                _ => FieldMapping::unmapped(saved.target.clone()),
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        if self.mappings.is_empty() {
            return "No mappings available.".to_string();
        }
        let quality = &self.statistics.mapping_quality;
        let info = &self.column_info;
        format!(
            "Mapping Summary:\n\
             ================\n\
             Created: {}\n\
             Last Updated: {}\n\
             \n\
             Columns:\n\
             - Source Columns: {}\n\
             - Template Columns: {}\n\
             - Successfully Mapped: {}\n\
             - Unmapped: {}\n\
             \n\
             Quality Metrics:\n\
             - Completeness: {:.1}%\n\
             - Average Confidence: {:.1}%\n\
             - High Confidence Mappings: {}",
            self.created_at.to_rfc3339(),
            self.last_updated.to_rfc3339(),
            info.source_columns.len(),
            info.template_columns.len(),
            info.mapped_count,
            info.unmapped_count,
            quality.completeness,
            quality.average_confidence * 100.0,
            quality.high_confidence_mappings
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SavedConfiguration {
        let source = Dataset::from_text_rows(&["mail", "tel", "misc"], &[&["a@b.co", "1", "x"]]);
        let template = Dataset::from_text_rows(&["Email", "Phone", "City"], &[]);
        let mapping = Mapping::new(vec![
            FieldMapping::matched("Email", "mail", 0.95, MatchBasis::Synonym),
            FieldMapping::matched("Phone", "tel", 0.6, MatchBasis::Pattern),
            FieldMapping::unmapped("City"),
        ]);
        SavedConfiguration::create(&source, &template, &mapping)
    }

    #[test]
    fn fingerprint_ignores_column_order() {
        assert_eq!(fingerprint(&["b", "a"]), fingerprint(&["a", "b"]));
        assert_ne!(fingerprint(&["a", "b"]), fingerprint(&["a", "c"]));
        assert_eq!(fingerprint(&["a"]).len(), 64);
    }

    #[test]
    fn fingerprint_is_lowercase_hex_sha256_of_joined_names() {
        assert_eq!(
            fingerprint(&["b", "a"]),
            "0eab8a0a3380abf4c7d1fb0b43b66aafbb64a4b953e4eb2dccca579461912d0c"
        );
    }

    #[test]
    fn create_records_types_and_counts() {
        let config = sample();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.mappings[0].mapping_type, MappingType::Automatic);
        assert_eq!(config.mappings[1].mapping_type, MappingType::Manual);
        assert_eq!(config.column_info.mapped_count, 2);
        assert_eq!(config.column_info.unmapped_count, 1);
        assert_eq!(config.statistics.mapping_quality.high_confidence_mappings, 1);
        assert_eq!(config.statistics.source.row_count, 1);
    }

    #[test]
    fn json_round_trip_preserves_configuration() {
        let config = sample();
        let restored = SavedConfiguration::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(restored, config);
        assert!(SavedConfiguration::from_json_str("{\"version\": 1}").is_err());
    }

    #[test]
    fn compatibility_outcomes() {
        let config = sample();
        let exact = config.check_compatibility(&["misc", "mail", "tel"], &["City", "Email", "Phone"]);
        assert_eq!(exact.outcome, Compatibility::ExactMatch);
        assert!(exact.can_reuse_mappings);

        let template_only = config.check_compatibility(&["mail"], &["Email", "Phone", "City"]);
        assert_eq!(template_only.outcome, Compatibility::TemplateOnly);
        assert!(template_only.can_reuse_mappings);

        let source_only = config.check_compatibility(&["mail", "tel", "misc"], &["Email"]);
        assert_eq!(source_only.outcome, Compatibility::SourceOnly);
        assert!(!source_only.can_reuse_mappings);
        assert_eq!(
            source_only.recommendation,
            "Source data structure matches, but template is different. New mapping required."
        );

        let none = config.check_compatibility(&["x"], &["y"]);
        assert_eq!(none.outcome, Compatibility::NoMatch);
    }

    #[test]
    fn restore_drops_sources_that_disappeared() {
        let config = sample();
        assert_eq!(
            config.reusable_mappings(),
            vec![("Email", "mail"), ("Phone", "tel")]
        );
        let mapping = config.restore_mapping(&["mail", "other"]);
        assert_eq!(mapping.source_for("Email"), Some("mail"));
        assert_eq!(mapping.get("Email").unwrap().confidence, 0.95);
        assert_eq!(mapping.source_for("Phone"), None);
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn summary_mentions_quality_metrics() {
        let summary = sample().summary();
        assert!(summary.starts_with("Mapping Summary:"));
        assert!(summary.contains("- Successfully Mapped: 2"));
        assert!(summary.contains("- Completeness: 66.7%"));
        assert!(summary.contains("- Average Confidence: 77.5%"));
    }
}
