//! Resolution sweep of one (instance, container) unit.

use chrono::Utc;
use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{FeasibilityCache, FeasibilityRecord};
use crate::enumerate::{Combinations, Strategy};
use crate::error::{Result, SearchError};
use crate::frontier::FailureFrontier;
use crate::instance::Instance;
use crate::layout::{OutputLayout, RunId};
use crate::model::{Combination, Container, Position};
use crate::oracle::{Deadline, OracleFailure, SolveRequest, SolverGateway, Verdict};
use crate::report::{
    CombinationResult, ContainerDimensions, Provenance, PrunedEntry, ResolutionLog, ResolutionSummary,
    SweepSummary,
};
use crate::schedule::schedule;

/// Knobs of a sweep that do not depend on the unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub strategy: Strategy,
    /// Budget of a single oracle call.
    pub timeout: Option<Duration>,
    /// Largest combination considered; unlimited when `None`.
    pub max_combination_size: Option<usize>,
}

/// Drives the resolution sweep of a unit: enumerate, consult the cache and
/// the frontier, call the oracle, record, persist.
///
/// Cloning is cheap; every clone shares the gateway and the cancel flag.
#[derive(Clone)]
pub struct SearchOrchestrator {
    gateway: Arc<dyn SolverGateway>,
    layout: OutputLayout,
    run_id: RunId,
    options: SearchOptions,
    cancel: Arc<AtomicBool>,
}

impl SearchOrchestrator {
    pub fn new(gateway: Arc<dyn SolverGateway>, layout: OutputLayout, run_id: RunId) -> Self {
        Self {
            gateway,
            layout,
            run_id,
            options: SearchOptions::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Share a cancellation flag; setting it stops every sweep using it.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Sweep every resolution of `container`, coarse to fine.
    ///
    /// The cache is flushed after each resolution, including one that ends
    /// in an error, so an abort loses at most that resolution's logs.
    pub fn sweep(&self, instance: &Instance, container: &Container) -> Result<SweepSummary> {
        let resolutions = schedule(container.length, container.width)?;
        info!(
            "Sweeping {}/{} ({}) over resolutions {:?} with {} oracle",
            instance.name,
            container.id,
            container.size_label(),
            resolutions,
            self.gateway.name()
        );

        let cache_path = self.layout.cache_path(&instance.name, &container.id);
        let mut cache = FeasibilityCache::load(&self.layout, &cache_path, container);
        let unit_dir = self.layout.unit_run_dir(&self.run_id, &instance.name, &container.id);
        let keys = instance.keys();

        let mut summaries = Vec::with_capacity(resolutions.len());
        for resolution in resolutions {
            let pass = self.sweep_resolution(instance, container, &keys, resolution, &mut cache, &unit_dir);
            let flushed = cache.flush(&self.layout);
            let summary = pass?;
            flushed?;

            debug!(
                "{}/{} resolution {}: {} reused, {} pruned, {} feasible, {} infeasible, {} inconclusive",
                instance.name,
                container.id,
                resolution,
                summary.reused,
                summary.pruned,
                summary.feasible,
                summary.infeasible,
                summary.inconclusive
            );
            summaries.push(summary);
        }

        cache.flush(&self.layout)?;

        let summary = SweepSummary {
            instance: instance.name.clone(),
            container_id: container.id.clone(),
            resolutions: summaries,
            cached_feasible: cache.len(),
        };
        info!(
            "Finished {}/{}: {} oracle calls, {} feasible combinations cached",
            instance.name,
            container.id,
            summary.oracle_calls(),
            summary.cached_feasible
        );
        Ok(summary)
    }

    fn sweep_resolution(
        &self,
        instance: &Instance,
        container: &Container,
        keys: &[String],
        resolution: u64,
        cache: &mut FeasibilityCache,
        unit_dir: &Path,
    ) -> Result<ResolutionSummary> {
        let started_at = Utc::now();
        let mut frontier = FailureFrontier::new();
        let mut summary = ResolutionSummary::new(resolution);
        let mut results = Vec::new();
        let mut pruned = Vec::new();

        for combo in Combinations::new(keys, self.options.strategy, self.options.max_combination_size) {
            if self.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            let result = if let Some(record) = cache.get(&combo) {
                trace!("{} reused from resolution {}", combo, record.resolution);
                CombinationResult {
                    combination: combo.keys().to_vec(),
                    provenance: Provenance::Reused,
                    is_feasible: true,
                    placement: Some(record.placement.clone()),
                    achieved_resolution: Some(record.resolution),
                    elapsed_seconds: None,
                    pruned_by: None,
                    reason: None,
                }
            } else if let Some(failed) = frontier.pruned_by(&combo) {
                trace!("{} pruned by {}", combo, failed);
                let by = failed.keys().to_vec();
                pruned.push(PrunedEntry {
                    combination: combo.keys().to_vec(),
                    pruned_by: by.clone(),
                });
                CombinationResult {
                    combination: combo.keys().to_vec(),
                    provenance: Provenance::Pruned,
                    is_feasible: false,
                    placement: None,
                    achieved_resolution: None,
                    elapsed_seconds: None,
                    pruned_by: Some(by),
                    reason: None,
                }
            } else {
                let result = self.solve(instance, container, &combo, resolution, &mut summary)?;
                match result.provenance {
                    Provenance::SolvedFeasible => {
                        let placement = result.placement.clone().unwrap_or_default();
                        cache.put(&combo, FeasibilityRecord::new(&combo, placement, resolution));
                    }
                    Provenance::SolvedInfeasible => frontier.record_failure(combo.clone()),
                    _ => {}
                }
                result
            };

            summary.record(result.provenance);
            results.push(result);
        }

        let log = ResolutionLog {
            instance: instance.name.clone(),
            container_id: container.id.clone(),
            container: ContainerDimensions {
                length: container.length,
                width: container.width,
            },
            resolution,
            items: instance.items.clone(),
            started_at,
            results,
        };
        self.layout
            .write_json(&self.layout.resolution_log_path(unit_dir, container, resolution), &log)?;
        self.layout
            .write_json(&self.layout.pruned_log_path(unit_dir, container, resolution), &pruned)?;

        Ok(summary)
    }

    /// One oracle call. Inconclusive outcomes come back as results; only
    /// global cancellation is an error.
    fn solve(
        &self,
        instance: &Instance,
        container: &Container,
        combo: &Combination,
        resolution: u64,
        summary: &mut ResolutionSummary,
    ) -> Result<CombinationResult> {
        let items = instance.dimensions_of(combo);
        let request = SolveRequest {
            length: container.length,
            width: container.width,
            items: &items,
            resolution,
        };
        let deadline = Deadline::new(self.options.timeout, Some(self.cancel.clone()));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.gateway.solve(&request, &deadline)))
            .unwrap_or_else(|payload| Err(OracleFailure::Fault(panic_message(payload.as_ref()))));
        let elapsed = deadline.elapsed();
        summary.oracle_time += elapsed;

        let mut result = CombinationResult {
            combination: combo.keys().to_vec(),
            provenance: Provenance::Inconclusive,
            is_feasible: false,
            placement: None,
            achieved_resolution: None,
            elapsed_seconds: Some(elapsed.as_secs_f64()),
            pruned_by: None,
            reason: None,
        };

        let outcome = match outcome {
            Ok(Verdict::Feasible(positions)) if positions.len() != combo.len() => Err(OracleFailure::Fault(format!(
                "oracle returned {} positions for {} items",
                positions.len(),
                combo.len()
            ))),
            other => other,
        };

        match outcome {
            Ok(Verdict::Feasible(positions)) => {
                trace!("{} feasible at resolution {} in {:?}", combo, resolution, elapsed);
                let placement: IndexMap<String, Position> = combo.keys().iter().cloned().zip(positions).collect();
                result.provenance = Provenance::SolvedFeasible;
                result.is_feasible = true;
                result.placement = Some(placement);
                result.achieved_resolution = Some(resolution);
            }
            Ok(Verdict::Infeasible) => {
                trace!("{} infeasible at resolution {} in {:?}", combo, resolution, elapsed);
                result.provenance = Provenance::SolvedInfeasible;
            }
            Err(OracleFailure::Cancelled) => return Err(SearchError::Cancelled),
            Err(failure) => {
                warn!(
                    "{}/{}: {} inconclusive at resolution {}: {}",
                    instance.name, container.id, combo, resolution, failure
                );
                result.reason = Some(failure.to_string());
            }
        }

        Ok(result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("oracle panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("oracle panicked: {}", s)
    } else {
        "oracle panicked".to_string()
    }
}
