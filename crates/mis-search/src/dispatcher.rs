//! Fan-out of unit sweeps over a fixed-size worker pool.

use futures_util::stream::{self, StreamExt};
use log::{error, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Result, SearchError};
use crate::instance::{instance_name, load_instance, Instance};
use crate::layout::RunId;
use crate::model::{Container, ContainerId};
use crate::orchestrator::SearchOrchestrator;
use crate::report::SweepSummary;

/// One (instance, container) pair, processed to completion by one worker.
#[derive(Debug, Clone)]
pub struct Unit {
    pub instance: Arc<Instance>,
    pub container: Container,
}

impl Unit {
    pub fn label(&self) -> String {
        format!("{}/{}", self.instance.name, self.container.id)
    }
}

/// A unit, or a whole instance, that could not be processed.
#[derive(Debug)]
pub struct UnitFailure {
    pub instance: String,
    /// `None` when the instance itself could not be loaded.
    pub container: Option<ContainerId>,
    pub error: SearchError,
}

/// Outcome of a dispatch: what finished, and what failed in isolation.
#[derive(Debug)]
pub struct DispatchReport {
    pub run_id: RunId,
    pub summaries: Vec<SweepSummary>,
    pub failures: Vec<UnitFailure>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn oracle_calls(&self) -> usize {
        self.summaries.iter().map(SweepSummary::oracle_calls).sum()
    }
}

/// Called as each unit finishes, from the async side of the pool.
pub type UnitCallback = Arc<dyn Fn(&Unit, &Result<SweepSummary>) + Send + Sync>;

/// Runs one sweep per (instance, container) on a bounded pool of blocking
/// workers. Units share nothing but the read-only instance.
#[derive(Clone)]
pub struct ParallelDispatcher {
    orchestrator: SearchOrchestrator,
    workers: usize,
    on_finished: Option<UnitCallback>,
}

impl ParallelDispatcher {
    pub fn new(orchestrator: SearchOrchestrator) -> Self {
        Self {
            orchestrator,
            workers: default_workers(),
            on_finished: None,
        }
    }

    /// Set the pool size; zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn on_finished(mut self, callback: UnitCallback) -> Self {
        self.on_finished = Some(callback);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Load every instance and split it into units.
    ///
    /// An instance that fails to load becomes a failure; the others are
    /// unaffected. Output is scoped by instance name, so a second instance
    /// with an already planned name is rejected rather than sharing caches.
    pub fn plan(&self, paths: &[PathBuf]) -> (Vec<Unit>, Vec<UnitFailure>) {
        let mut units = Vec::new();
        let mut failures = Vec::new();
        let mut planned: HashMap<String, PathBuf> = HashMap::new();

        for path in paths {
            let name = instance_name(path);
            let loaded = match planned.get(&name) {
                Some(first) => Err(SearchError::DuplicateInstance {
                    name: name.clone(),
                    path: path.clone(),
                    first: first.clone(),
                }),
                None => load_instance(path),
            };

            match loaded {
                Ok(instance) => {
                    planned.insert(name, path.clone());
                    let instance = Arc::new(instance);
                    units.extend(instance.containers.iter().map(|container| Unit {
                        instance: instance.clone(),
                        container: container.clone(),
                    }));
                }
                Err(e) => {
                    error!("Skipping {}: {}", path.display(), e);
                    failures.push(UnitFailure {
                        instance: name,
                        container: None,
                        error: e,
                    });
                }
            }
        }

        (units, failures)
    }

    /// Sweep the given units, at most `workers` at a time.
    pub async fn run_units(&self, units: Vec<Unit>) -> DispatchReport {
        info!(
            "Dispatching {} units on {} workers (run {})",
            units.len(),
            self.workers,
            self.orchestrator.run_id()
        );

        let results: Vec<(Unit, Result<SweepSummary>)> = stream::iter(units)
            .map(|unit| {
                let orchestrator = self.orchestrator.clone();
                let on_finished = self.on_finished.clone();
                async move {
                    let result = if orchestrator.is_cancelled() {
                        Err(SearchError::Cancelled)
                    } else {
                        let task = unit.clone();
                        tokio::task::spawn_blocking(move || orchestrator.sweep(&task.instance, &task.container))
                            .await
                            .unwrap_or_else(|e| Err(SearchError::Worker(e.to_string())))
                    };
                    if let Some(callback) = &on_finished {
                        callback(&unit, &result);
                    }
                    (unit, result)
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut report = DispatchReport {
            run_id: self.orchestrator.run_id().clone(),
            summaries: Vec::new(),
            failures: Vec::new(),
        };
        for (unit, result) in results {
            match result {
                Ok(summary) => report.summaries.push(summary),
                Err(e) => {
                    error!("{} failed: {}", unit.label(), e);
                    report.failures.push(UnitFailure {
                        instance: unit.instance.name.clone(),
                        container: Some(unit.container.id.clone()),
                        error: e,
                    });
                }
            }
        }

        // Completion order is arbitrary; report in a stable one.
        report
            .summaries
            .sort_by(|a, b| (&a.instance, &a.container_id).cmp(&(&b.instance, &b.container_id)));
        report
            .failures
            .sort_by(|a, b| (&a.instance, &a.container).cmp(&(&b.instance, &b.container)));
        report
    }

    /// Plan and sweep the given instance files.
    pub async fn run(&self, paths: &[PathBuf]) -> DispatchReport {
        let (units, mut failures) = self.plan(paths);
        let mut report = self.run_units(units).await;
        failures.append(&mut report.failures);
        report.failures = failures;
        report
    }
}

/// Host parallelism, or one if it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
