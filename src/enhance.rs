//! Second matching pass driven by value patterns.
//!
//! Targets that are unmapped or weakly mapped are paired with still-unused
//! source columns whose values show the same informative pattern (anything
//! but text). The pass only ever raises confidence and never hands out a
//! source column that another target already holds.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Dataset,
    mapping::{FieldMapping, HIGH_CONFIDENCE, Mapping, MatchBasis},
    pattern::{self, DEFAULT_SAMPLE_SIZE},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    pub enabled: bool,
    /// Targets below this confidence are candidates for the pass.
    pub review_cutoff: f64,
    /// Only targets below this confidence are actually replaced.
    pub replace_below: f64,
    /// Confidence given to a pattern match.
    pub assigned_confidence: f64,
    pub sample_size: usize,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            review_cutoff: HIGH_CONFIDENCE,
            replace_below: 0.6,
            assigned_confidence: 0.6,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Fills weak targets from unused source columns with a matching value pattern.
///
/// Patterns for targets come from the template's sample rows; a target that
/// is missing from the template dataset is left alone.
pub fn enhance_with_patterns(
    mapping: Mapping,
    source: &Dataset,
    template: &Dataset,
    options: &PatternOptions,
) -> Mapping {
    if !options.enabled {
        return mapping;
    }

    let used = mapping
        .used_sources()
        .into_iter()
        .map(str::to_string)
        .collect::<HashSet<_>>();
    let source_patterns = pattern::detect_patterns(source, options.sample_size);
    let mut unused = source
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !used.contains(name.as_str()))
        .map(|(idx, name)| (name.clone(), source_patterns[idx]))
        .collect::<Vec<_>>();

    let mut entries = mapping.into_entries();
    for entry in entries
        .iter_mut()
        .filter(|entry| entry.needs_review(options.review_cutoff))
    {
        let Some(template_idx) = template.column_index(&entry.target) else {
            continue;
        };
        let target_pattern = pattern::detect_pattern(template, template_idx, options.sample_size);
        if !target_pattern.is_informative() || entry.confidence >= options.replace_below {
            continue;
        }
        let Some(position) = unused
            .iter()
            .position(|(_, source_pattern)| *source_pattern == target_pattern)
        else {
            continue;
        };
        let (source_name, _) = unused.remove(position);
        debug!(
            "Pattern '{}' pairs '{}' with '{}' (was {:.2})",
            target_pattern, entry.target, source_name, entry.confidence
        );
        *entry = FieldMapping::matched(
            entry.target.clone(),
            source_name,
            options.assigned_confidence,
            MatchBasis::Pattern,
        );
    }
    Mapping::new(entries)
}
