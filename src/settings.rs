//! Matcher settings file.
//!
//! Every field is optional in YAML; omitted values fall back to the engine
//! defaults. Command-line flags are applied on top of a loaded file.
//!
//! ```yaml
//! threshold: 75
//! patterns:
//!   enabled: true
//!   sample_size: 20
//! contamination:
//!   sample_cap: 200
//!   seed: 42
//! lexicon:
//!   synonyms:
//!     sku: [sku, item code, article number]
//!   abbreviations:
//!     art: article
//! ```

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    assign::DEFAULT_THRESHOLD, contamination::ContaminationOptions, enhance::PatternOptions,
    lexicon::Lexicon,
};

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("threshold must be between 0 and 100 (got {0})")]
    Threshold(f64),
    #[error("{name} must be between 0 and 1 (got {value})")]
    Ratio { name: &'static str, value: f64 },
    #[error("{0} must be greater than zero")]
    ZeroSize(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconSettings {
    pub synonyms: BTreeMap<String, Vec<String>>,
    pub abbreviations: BTreeMap<String, String>,
}

impl LexiconSettings {
    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty() && self.abbreviations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    /// Minimum header score (0-100) for a name-based match.
    pub threshold: f64,
    pub patterns: PatternOptions,
    pub contamination: ContaminationOptions,
    pub lexicon: LexiconSettings,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            patterns: PatternOptions::default(),
            contamination: ContaminationOptions::default(),
            lexicon: LexiconSettings::default(),
        }
    }
}

impl MatcherSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings: MatcherSettings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings YAML {path:?}"))?;
        settings
            .validate()
            .with_context(|| format!("Validating settings file {path:?}"))?;
        Ok(settings)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: MatcherSettings =
            serde_yaml::from_str(yaml).context("Parsing settings YAML")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(SettingsError::Threshold(self.threshold));
        }
        let ratios = [
            ("patterns.review_cutoff", self.patterns.review_cutoff),
            ("patterns.replace_below", self.patterns.replace_below),
            ("patterns.assigned_confidence", self.patterns.assigned_confidence),
            ("contamination.min_overlap", self.contamination.min_overlap),
            ("contamination.identifier_ratio", self.contamination.identifier_ratio),
        ];
        if let Some((name, value)) = ratios
            .into_iter()
            .find(|(_, value)| !(0.0..=1.0).contains(value))
        {
            return Err(SettingsError::Ratio { name, value });
        }
        if self.patterns.sample_size == 0 {
            return Err(SettingsError::ZeroSize("patterns.sample_size"));
        }
        if self.contamination.sample_cap == 0 {
            return Err(SettingsError::ZeroSize("contamination.sample_cap"));
        }
        if self.contamination.max_columns == Some(0) {
            return Err(SettingsError::ZeroSize("contamination.max_columns"));
        }
        Ok(())
    }

    /// The built-in lexicon, extended when the file adds vocabulary.
    pub fn lexicon(&self) -> Lexicon {
        if self.lexicon.is_empty() {
            Lexicon::builtin().clone()
        } else {
            Lexicon::extended(&self.lexicon.synonyms, &self.lexicon.abbreviations)
        }
    }
}
