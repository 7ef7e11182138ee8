//! Pairwise header similarity.
//!
//! Scoring is a priority cascade over the normalized names; the first rule
//! that fires decides the score:
//!
//! 1. identical after normalization → 100
//! 2. both phrases listed in the same synonym group → 95
//! 3. word sets: the smaller set contained in the larger → 95; otherwise a
//!    shared-word share strictly above one half (measured against the larger
//!    set) → `70 + share * 20`
//! 4. mean of the token-sort and token-set ratios when it reaches 70, else 0
//!
//! The one-half cutoff keeps compound names that share a single word
//! ("customer id" / "customer name") out of the 70–90 band.

use std::collections::BTreeSet;

use itertools::Itertools;
use similar::{Algorithm, DiffTag, TextDiff};

use crate::{lexicon::Lexicon, mapping::MatchBasis, normalize::normalize_header_with};

pub const EXACT_SCORE: f64 = 100.0;
pub const SYNONYM_SCORE: f64 = 95.0;
pub const WORD_SUBSET_SCORE: f64 = 95.0;
const WORD_OVERLAP_CUTOFF: f64 = 0.5;
const WORD_OVERLAP_BASE: f64 = 70.0;
const WORD_OVERLAP_SPAN: f64 = 20.0;
const FUZZY_FLOOR: f64 = 70.0;

/// A `0..=100` header score and the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub value: f64,
    pub basis: MatchBasis,
}

impl MatchScore {
    pub const NONE: MatchScore = MatchScore {
        value: 0.0,
        basis: MatchBasis::Unmatched,
    };

    fn new(value: f64, basis: MatchBasis) -> Self {
        Self { value, basis }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeaderScorer<'a> {
    lexicon: &'a Lexicon,
}

impl Default for HeaderScorer<'static> {
    fn default() -> Self {
        Self::new(Lexicon::builtin())
    }
}

impl<'a> HeaderScorer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &'a Lexicon {
        self.lexicon
    }

    pub fn normalize(&self, header: &str) -> String {
        normalize_header_with(header, self.lexicon)
    }

    /// Scores two raw column names.
    pub fn score(&self, left: &str, right: &str) -> MatchScore {
        self.score_normalized(&self.normalize(left), &self.normalize(right))
    }

    /// Scores two names that were already passed through [`Self::normalize`].
    pub fn score_normalized(&self, left: &str, right: &str) -> MatchScore {
        if left == right {
            return MatchScore::new(EXACT_SCORE, MatchBasis::Exact);
        }

        if self.lexicon.shared_group(left, right).is_some() {
            return MatchScore::new(SYNONYM_SCORE, MatchBasis::Synonym);
        }

        let left_words = left.split_whitespace().collect::<BTreeSet<_>>();
        let right_words = right.split_whitespace().collect::<BTreeSet<_>>();
        if left_words.is_empty() || right_words.is_empty() {
            return MatchScore::NONE;
        }

        let (shorter, longer) = if left_words.len() <= right_words.len() {
            (&left_words, &right_words)
        } else {
            (&right_words, &left_words)
        };
        if shorter.is_subset(longer) {
            return MatchScore::new(WORD_SUBSET_SCORE, MatchBasis::WordOverlap);
        }

        let common = left_words.intersection(&right_words).count();
        if common > 0 {
            let overlap = common as f64 / longer.len() as f64;
            if overlap > WORD_OVERLAP_CUTOFF {
                return MatchScore::new(
                    WORD_OVERLAP_BASE + overlap * WORD_OVERLAP_SPAN,
                    MatchBasis::WordOverlap,
                );
            }
        }

        let fuzzy = (token_sort_ratio(left, right) + token_set_ratio(left, right)) / 2.0;
        if fuzzy >= FUZZY_FLOOR {
            MatchScore::new(fuzzy, MatchBasis::Fuzzy)
        } else {
            MatchScore::NONE
        }
    }
}

/// Score of two raw names with the built-in lexicon.
pub fn score_headers(left: &str, right: &str) -> f64 {
    HeaderScorer::default().score(left, right).value
}

/// Indel similarity in percent: `2 * LCS / (len(a) + len(b)) * 100`.
pub fn ratio(left: &str, right: &str) -> f64 {
    let total = left.chars().count() + right.chars().count();
    if total == 0 {
        return 100.0;
    }
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(left, right);
    let matched: usize = diff
        .ops()
        .iter()
        .filter(|op| op.tag() == DiffTag::Equal)
        .map(|op| op.old_range().len())
        .sum();
    200.0 * matched as f64 / total as f64
}

/// [`ratio`] after sorting the whitespace-separated tokens of both inputs.
pub fn token_sort_ratio(left: &str, right: &str) -> f64 {
    let sorted = |s: &str| s.split_whitespace().sorted().join(" ");
    ratio(&sorted(left), &sorted(right))
}

/// Best [`ratio`] between the shared tokens and each side's full token set.
pub fn token_set_ratio(left: &str, right: &str) -> f64 {
    let left_tokens = left.split_whitespace().collect::<BTreeSet<_>>();
    let right_tokens = right.split_whitespace().collect::<BTreeSet<_>>();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }

    let shared = left_tokens.intersection(&right_tokens).join(" ");
    let left_only = left_tokens.difference(&right_tokens).join(" ");
    let right_only = right_tokens.difference(&left_tokens).join(" ");

    if shared.is_empty() {
        return ratio(&left_only, &right_only);
    }
    if left_only.is_empty() || right_only.is_empty() {
        return 100.0;
    }

    let with_left = format!("{shared} {left_only}");
    let with_right = format!("{shared} {right_only}");
    ratio(&with_left, &with_right)
        .max(ratio(&shared, &with_left))
        .max(ratio(&shared, &with_right))
}
