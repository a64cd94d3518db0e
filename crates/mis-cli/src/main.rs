mod clear_cache;
mod config;
mod prepare;
mod progress;
mod solve;
mod tasks;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::process::ExitCode;

use progress::ProgressManager;

#[derive(Parser, Debug)]
#[command(name = "mis")]
#[command(about = "Find which item subsets can be packed into each container")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Do not draw progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sweep resolutions and combinations for every container of the given instances
    Solve(solve::SolveArgs),

    /// Convert legacy text instances into JSON
    Prepare(prepare::PrepareArgs),

    /// Export the combination tasks of each instance without solving them
    Tasks(tasks::TasksArgs),

    /// Remove stored feasibility caches
    ClearCache(clear_cache::ClearCacheArgs),
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run() -> Result<i32> {
    let args = Args::parse();

    // RUST_LOG still wins over the flags.
    let level = log_level(args.verbose, args.quiet);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str())).init();

    let progress = ProgressManager::new(!args.no_progress && !args.quiet && console::user_attended_stderr());

    match args.command {
        Commands::Solve(solve_args) => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;
            rt.block_on(solve::execute(solve_args, &progress))
        }
        Commands::Prepare(prepare_args) => prepare::execute(prepare_args),
        Commands::Tasks(tasks_args) => tasks::execute(tasks_args),
        Commands::ClearCache(clear_args) => clear_cache::execute(clear_args),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
