//! Manual corrections applied on top of a suggested mapping.

use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use log::{debug, warn};

use crate::mapping::{FieldMapping, Mapping, MatchBasis};

/// A reviewer decision for one target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub target: String,
    /// `None` clears the mapping.
    pub source: Option<String>,
}

impl Override {
    pub fn set(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: Some(source.into()),
        }
    }

    pub fn unset(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: None,
        }
    }
}

impl FromStr for Override {
    type Err = anyhow::Error;

    /// Parses `TARGET=SOURCE`; an empty source means unmapped.
    fn from_str(raw: &str) -> Result<Self> {
        let (target, source) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("Override '{raw}' must look like TARGET=SOURCE"))?;
        let target = target.trim();
        if target.is_empty() {
            bail!("Override '{raw}' has an empty target column");
        }
        let source = source.trim();
        Ok(if source.is_empty() {
            Override::unset(target)
        } else {
            Override::set(target, source)
        })
    }
}

/// Applies overrides in order. Every override must name a target present in
/// the mapping; sources are taken as given.
pub fn apply_overrides(mapping: Mapping, overrides: &[Override]) -> Result<Mapping> {
    let mut mapping = mapping;
    for item in overrides {
        let Some(entry) = mapping
            .entries_mut()
            .iter_mut()
            .find(|entry| entry.target == item.target)
        else {
            bail!("Unknown target column '{}'", item.target);
        };
        *entry = match &item.source {
            None => FieldMapping::unmapped(entry.target.clone()),
            Some(source) if entry.source.as_deref() == Some(source.as_str()) => entry.clone(),
            Some(source) => {
                FieldMapping::matched(entry.target.clone(), source, 1.0, MatchBasis::Manual)
            }
        };
        debug!(
            "Override '{}' -> {}",
            item.target,
            item.source.as_deref().unwrap_or("(unmapped)")
        );
    }
    if !mapping.is_one_to_one() {
        warn!("Manual overrides assign at least one source column to more than one target");
    }
    Ok(mapping)
}
