//! Known-infeasible combinations for one resolution pass.

use crate::model::Combination;

/// Combinations proven infeasible at a single resolution.
///
/// If a combination cannot be packed, no superset of it can be packed at the
/// same resolution, so any combination containing a recorded failure is
/// pruned. Only proven infeasibility may be recorded; inconclusive oracle
/// calls never enter the frontier.
#[derive(Debug, Default)]
pub struct FailureFrontier {
    failed: Vec<Combination>,
}

impl FailureFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a recorded failure is a subset of `combo`.
    pub fn should_prune(&self, combo: &Combination) -> bool {
        self.pruned_by(combo).is_some()
    }

    /// The first recorded failure contained in `combo`, if any.
    pub fn pruned_by(&self, combo: &Combination) -> Option<&Combination> {
        self.failed.iter().find(|failed| failed.is_subset_of(combo))
    }

    pub fn record_failure(&mut self, combo: Combination) {
        // A failure already implied by the frontier adds nothing.
        if !self.should_prune(&combo) {
            self.failed.push(combo);
        }
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }
}
