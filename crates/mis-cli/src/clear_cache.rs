//! Clear-cache command - drop stored feasibility caches.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use mis_search::OutputLayout;

use crate::config::{MisConfig, Overrides, Settings};

#[derive(Args, Debug)]
pub struct ClearCacheArgs {
    /// Only clear the caches of this instance
    #[arg(long)]
    pub instance: Option<String>,

    /// Root directory for caches and run logs
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub fn execute(args: ClearCacheArgs) -> Result<i32> {
    let config = MisConfig::load_from_cwd()?;
    let overrides = Overrides {
        output_dir: args.output_dir,
        ..Overrides::default()
    };
    let settings = Settings::resolve(config.as_ref(), |name| std::env::var(name).ok(), &overrides)?;

    let layout = OutputLayout::new(&settings.output_dir);
    let removed = layout
        .clear_caches(args.instance.as_deref())
        .with_context(|| format!("Failed to clear {}", layout.cache_root().display()))?;

    match &args.instance {
        Some(name) => println!(
            "{} Removed {} cache files of {}",
            style("Success:").green().bold(),
            removed,
            name
        ),
        None => println!("{} Removed {} cache files", style("Success:").green().bold(), removed),
    }
    Ok(0)
}
