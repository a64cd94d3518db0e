//! Solve command - sweep every (instance, container) unit.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use log::warn;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use mis_search::instance::discover_instances;
use mis_search::{
    DispatchReport, OutputLayout, ParallelDispatcher, RunId, SearchError, SearchOptions, SearchOrchestrator,
    SolverGateway, SolverKind, Strategy, SweepSummary, Unit,
};

use crate::config::{MisConfig, Overrides, Settings};
use crate::progress::{format_duration, ProgressManager};

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Instance files, or directories of *.json instances
    #[arg(required = true)]
    pub instances: Vec<PathBuf>,

    /// Packing oracle: grid, interval or disjunctive
    #[arg(long)]
    pub solver: Option<SolverKind>,

    /// Combination order: all, bfs or dfs
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Time budget per oracle call, in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Largest combination to test
    #[arg(long)]
    pub max_combination_size: Option<usize>,

    /// Number of units processed in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Root directory for caches and run logs
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Explicit run identifier (default: next free <prefix><n>)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Prefix of allocated run identifiers
    #[arg(long)]
    pub run_prefix: Option<String>,
}

impl SolveArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            solver: self.solver,
            strategy: self.strategy,
            timeout: self.timeout,
            max_combination_size: self.max_combination_size,
            workers: self.workers,
            output_dir: self.output_dir.clone(),
            run_prefix: self.run_prefix.clone(),
        }
    }
}

pub async fn execute(args: SolveArgs, progress: &ProgressManager) -> Result<i32> {
    let config = MisConfig::load_from_cwd()?;
    let settings = Settings::resolve(config.as_ref(), |name| std::env::var(name).ok(), &args.overrides())?;

    let layout = OutputLayout::new(&settings.output_dir);
    let run_id = match &args.run_id {
        Some(id) => RunId::new(id.clone()),
        None => layout
            .next_run_id(&settings.run_prefix)
            .with_context(|| format!("Failed to scan {}", layout.runs_root().display()))?,
    };

    let paths = discover_instances(&args.instances);
    if paths.is_empty() {
        eprintln!("{} No instance files found", style("Error:").red().bold());
        return Ok(1);
    }

    println!(
        "{} Run {} with the {} oracle, {} strategy, {} workers",
        style("Info:").cyan(),
        style(&run_id).bold(),
        settings.solver,
        settings.strategy,
        settings.workers
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current oracle calls");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let gateway: Arc<dyn SolverGateway> = Arc::new(settings.solver.build());
    let orchestrator = SearchOrchestrator::new(gateway, layout, run_id)
        .with_options(SearchOptions {
            strategy: settings.strategy,
            timeout: settings.timeout,
            max_combination_size: settings.max_combination_size,
        })
        .with_cancel_flag(cancel.clone());

    let spinner = progress.create_spinner("Loading instances");
    let dispatcher = ParallelDispatcher::new(orchestrator).with_workers(settings.workers);
    let (units, load_failures) = dispatcher.plan(&paths);
    spinner.finish_and_clear();

    let bar = progress.create_unit_bar(units.len() as u64);
    let unit_bar = bar.clone();
    let dispatcher = dispatcher.on_finished(Arc::new(move |unit: &Unit, result: &mis_search::Result<SweepSummary>| {
        unit_bar.set_message(unit.label());
        if let Err(e) = result {
            unit_bar.println(format!("{} {}: {}", style("Failed:").red(), unit.label(), e));
        }
        unit_bar.inc(1);
    }));

    let started = Instant::now();
    let mut report = dispatcher.run_units(units).await;
    bar.finish_and_clear();

    let mut failures = load_failures;
    failures.append(&mut report.failures);
    report.failures = failures;

    print_report(&report, started.elapsed());

    if cancel.load(Ordering::Relaxed) {
        eprintln!("{} Run was interrupted; rerun to resume from the cache", style("Warning:").yellow());
        return Ok(130);
    }
    Ok(if report.is_success() { 0 } else { 1 })
}

fn print_report(report: &DispatchReport, elapsed: std::time::Duration) {
    for summary in &report.summaries {
        let feasible: usize = summary.resolutions.iter().map(|r| r.feasible + r.reused).sum();
        let pruned: usize = summary.resolutions.iter().map(|r| r.pruned).sum();
        println!(
            "  {}/{}  {} resolutions, {} oracle calls, {} feasible, {} pruned, {} inconclusive",
            style(&summary.instance).bold(),
            summary.container_id,
            summary.resolutions.len(),
            summary.oracle_calls(),
            feasible,
            pruned,
            summary.inconclusive()
        );
    }

    for failure in &report.failures {
        let unit = match &failure.container {
            Some(container) => format!("{}/{}", failure.instance, container),
            None => failure.instance.clone(),
        };
        let label = match failure.error {
            SearchError::Cancelled => style("Cancelled:").yellow(),
            _ => style("Failed:").red(),
        };
        eprintln!("  {} {}: {}", label, unit, failure.error);
    }

    println!(
        "\n{} {} units finished, {} failed, {} oracle calls in {} (run {})",
        if report.is_success() {
            style("Done:").green().bold()
        } else {
            style("Done:").yellow().bold()
        },
        report.summaries.len(),
        report.failures.len(),
        report.oracle_calls(),
        format_duration(elapsed),
        report.run_id
    );
}
