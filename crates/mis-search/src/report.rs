//! Run log artifacts and sweep summaries.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{ContainerId, Dimensions, Position};

/// How a combination's result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Taken from the feasibility cache, no oracle call.
    Reused,
    /// Skipped because a recorded failure is a subset of it.
    Pruned,
    /// Oracle found a placement.
    SolvedFeasible,
    /// Oracle proved no placement exists.
    SolvedInfeasible,
    /// Oracle timed out, was cancelled, or failed.
    Inconclusive,
}

impl Provenance {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Provenance::Reused | Provenance::SolvedFeasible)
    }
}

/// One line of a resolution's run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CombinationResult {
    pub combination: Vec<String>,
    pub provenance: Provenance,
    pub is_feasible: bool,
    pub placement: Option<IndexMap<String, Position>>,
    /// Resolution at which feasibility was first achieved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achieved_resolution: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Container dimensions as written into run logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerDimensions {
    pub length: f64,
    pub width: f64,
}

/// Report of one (container, resolution) pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolutionLog {
    pub instance: String,
    pub container_id: ContainerId,
    pub container: ContainerDimensions,
    pub resolution: u64,
    pub items: IndexMap<String, Dimensions>,
    pub started_at: DateTime<Utc>,
    pub results: Vec<CombinationResult>,
}

/// Companion artifact listing combinations skipped by the frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrunedEntry {
    pub combination: Vec<String>,
    pub pruned_by: Vec<String>,
}

/// Counters for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolutionSummary {
    pub resolution: u64,
    pub reused: usize,
    pub pruned: usize,
    pub feasible: usize,
    pub infeasible: usize,
    pub inconclusive: usize,
    #[serde(with = "duration_seconds")]
    pub oracle_time: Duration,
}

impl ResolutionSummary {
    pub fn new(resolution: u64) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    pub fn record(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::Reused => self.reused += 1,
            Provenance::Pruned => self.pruned += 1,
            Provenance::SolvedFeasible => self.feasible += 1,
            Provenance::SolvedInfeasible => self.infeasible += 1,
            Provenance::Inconclusive => self.inconclusive += 1,
        }
    }

    /// Number of oracle invocations during the pass.
    pub fn oracle_calls(&self) -> usize {
        self.feasible + self.infeasible + self.inconclusive
    }

    pub fn total(&self) -> usize {
        self.reused + self.pruned + self.oracle_calls()
    }
}

/// Outcome of one unit's complete sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SweepSummary {
    pub instance: String,
    pub container_id: ContainerId,
    pub resolutions: Vec<ResolutionSummary>,
    /// Feasible combinations held by the cache after the sweep.
    pub cached_feasible: usize,
}

impl SweepSummary {
    pub fn oracle_calls(&self) -> usize {
        self.resolutions.iter().map(ResolutionSummary::oracle_calls).sum()
    }

    pub fn inconclusive(&self) -> usize {
        self.resolutions.iter().map(|r| r.inconclusive).sum()
    }
}

mod duration_seconds {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
