//! One-to-one assignment of source columns to target columns.
//!
//! Every target/source pair is scored once, the scores are turned into costs
//! (`100 - score`) and the minimum-cost assignment is solved with the
//! Kuhn–Munkres algorithm. The solver needs a square matrix, so the shorter
//! side is padded with maximum-cost dummy rows or columns; a dummy adds the
//! same constant to every complete assignment and never changes the optimum.

use log::debug;
use pathfinding::{kuhn_munkres::kuhn_munkres_min, matrix::Matrix};

use crate::{
    mapping::{FieldMapping, Mapping, MatchBasis},
    similarity::{HeaderScorer, MatchScore},
};

pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Fixed-point factor applied to costs; the solver works on integers.
const COST_SCALE: f64 = 1000.0;
const MAX_COST: i64 = (100.0 * COST_SCALE) as i64;

#[derive(Debug, Clone, Copy)]
pub struct OptimalAssigner<'a> {
    scorer: HeaderScorer<'a>,
    threshold: f64,
}

impl Default for OptimalAssigner<'static> {
    fn default() -> Self {
        Self::new(HeaderScorer::default(), DEFAULT_THRESHOLD)
    }
}

impl<'a> OptimalAssigner<'a> {
    pub fn new(scorer: HeaderScorer<'a>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Full `targets x sources` score matrix, row-major by target.
    pub fn score_matrix(&self, targets: &[String], sources: &[String]) -> Vec<Vec<MatchScore>> {
        let normalized_sources = sources
            .iter()
            .map(|source| self.scorer.normalize(source))
            .collect::<Vec<_>>();
        targets
            .iter()
            .map(|target| {
                let normalized_target = self.scorer.normalize(target);
                normalized_sources
                    .iter()
                    .map(|source| self.scorer.score_normalized(&normalized_target, source))
                    .collect()
            })
            .collect()
    }

    /// Maps each target to at most one source, maximizing the summed score.
    ///
    /// Pairs scoring below the threshold, or not scoring at all, are left
    /// unmapped even when the solver paired them. A pair with no matching
    /// rule (`MatchBasis::Unmatched`, score 0) is rejected even at a
    /// threshold of 0.
    pub fn assign(&self, targets: &[String], sources: &[String]) -> Mapping {
        if targets.is_empty() {
            return Mapping::default();
        }
        if sources.is_empty() {
            return targets.iter().map(FieldMapping::unmapped).collect();
        }

        let scores = self.score_matrix(targets, sources);
        let assignment = solve(&scores, targets.len(), sources.len());

        targets
            .iter()
            .enumerate()
            .map(|(row, target)| {
                let Some(column) = assignment[row] else {
                    return FieldMapping::unmapped(target);
                };
                let score = scores[row][column];
                if score.value >= self.threshold && score.basis != MatchBasis::Unmatched {
                    debug!(
                        "'{}' -> '{}' ({:.1}, {})",
                        target, sources[column], score.value, score.basis
                    );
                    FieldMapping::matched(target, &sources[column], score.value / 100.0, score.basis)
                } else {
                    debug!(
                        "'{}' left unmapped: best pairing '{}' scored {:.1} < {:.1}",
                        target, sources[column], score.value, self.threshold
                    );
                    FieldMapping::unmapped(target)
                }
            })
            .collect()
    }
}

/// Column chosen for every row, `None` for rows paired with padding.
fn solve(scores: &[Vec<MatchScore>], rows: usize, columns: usize) -> Vec<Option<usize>> {
    let size = rows.max(columns);
    let mut costs = Matrix::new(size, size, MAX_COST);
    for (row, row_scores) in scores.iter().enumerate() {
        for (column, score) in row_scores.iter().enumerate() {
            costs[(row, column)] = to_cost(score.value);
        }
    }
    let (total, pairing) = kuhn_munkres_min(&costs);
    debug!("Assignment over {rows}x{columns} matrix solved with total cost {total}");
    pairing
        .into_iter()
        .take(rows)
        .map(|column| (column < columns).then_some(column))
        .collect()
}

fn to_cost(score: f64) -> i64 {
    ((100.0 - score.clamp(0.0, 100.0)) * COST_SCALE).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_targets_produce_empty_mapping() {
        let mapping = OptimalAssigner::default().assign(&[], &names(&["email"]));
        assert!(mapping.is_empty());
    }

    #[test]
    fn empty_sources_leave_every_target_unmapped() {
        let mapping = OptimalAssigner::default().assign(&names(&["Email", "Name"]), &[]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.mapped_count(), 0);
    }

    #[test]
    fn global_optimum_beats_greedy_choice() {
        // Greedy would give "name" to "Customer Name" (95) and strand
        // "Full Name"; the optimum pairs "Customer Name" with "customer"
        // instead because both pairings clear the threshold.
        let targets = names(&["Customer Name", "Full Name"]);
        let sources = names(&["name", "customer"]);
        let mapping = OptimalAssigner::default().assign(&targets, &sources);
        assert_eq!(mapping.source_for("Customer Name"), Some("customer"));
        assert_eq!(mapping.source_for("Full Name"), Some("name"));
    }

    #[test]
    fn pairs_below_threshold_are_unmapped() {
        let targets = names(&["Email", "Shoe Size"]);
        let sources = names(&["email", "favourite colour"]);
        let mapping = OptimalAssigner::default().assign(&targets, &sources);
        assert_eq!(mapping.source_for("Email"), Some("email"));
        let shoe = mapping.get("Shoe Size").unwrap();
        assert_eq!(shoe.source, None);
        assert_eq!(shoe.confidence, 0.0);
        assert_eq!(shoe.basis, MatchBasis::Unmatched);
    }

    #[test]
    fn zero_threshold_still_rejects_unscored_pairs() {
        let assigner = OptimalAssigner::new(HeaderScorer::default(), 0.0);
        let mapping = assigner.assign(&names(&["Shoe Size"]), &names(&["favourite colour"]));
        assert_eq!(mapping.source_for("Shoe Size"), None);
    }

    #[test]
    fn more_targets_than_sources() {
        let targets = names(&["Email", "Phone", "City"]);
        let sources = names(&["telephone"]);
        let mapping = OptimalAssigner::default().assign(&targets, &sources);
        assert_eq!(mapping.source_for("Phone"), Some("telephone"));
        assert_eq!(mapping.mapped_count(), 1);
    }

    #[test]
    fn cost_conversion_is_fixed_point() {
        assert_eq!(to_cost(100.0), 0);
        assert_eq!(to_cost(0.0), MAX_COST);
        assert_eq!(to_cost(83.3333), 16_667);
    }
}
