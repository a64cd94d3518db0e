//! Tasks command - export the combinations a sweep would test.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use mis_search::instance::{discover_instances, export_tasks, load_instance};
use mis_search::{OutputLayout, Strategy};

#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Instance files, or directories of *.json instances
    #[arg(required = true)]
    pub instances: Vec<PathBuf>,

    /// Combination order: all, bfs or dfs
    #[arg(long, default_value = "bfs")]
    pub strategy: Strategy,

    /// Largest combination to export
    #[arg(long)]
    pub max_combination_size: Option<usize>,

    /// Directory receiving <instance>-tasks.json files
    #[arg(short, long, default_value = "exports")]
    pub output: PathBuf,
}

pub fn execute(args: TasksArgs) -> Result<i32> {
    let layout = OutputLayout::new(&args.output);
    let mut failed = 0;

    for path in discover_instances(&args.instances) {
        let instance = match load_instance(&path) {
            Ok(instance) => instance,
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}", style("Skipped:").red(), e);
                continue;
            }
        };

        let list = export_tasks(&instance, args.strategy, args.max_combination_size);
        let dest = args
            .output
            .join(format!("{}-tasks.json", OutputLayout::sanitize_segment(&instance.name)));
        layout
            .write_json(&dest, &list)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        println!("  {} {} tasks to {}", style("Exported").green(), list.tasks.len(), dest.display());
    }

    Ok(if failed == 0 { 0 } else { 1 })
}
