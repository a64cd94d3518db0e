//! Prepare command - convert legacy text instances to JSON.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use mis_search::instance::{convert_text_file, discover_files};

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Text instances, or directories of *.txt files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the JSON files (default: next to each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn destination(source: &Path, output: Option<&Path>) -> PathBuf {
    let file_name = source.with_extension("json");
    match (output, file_name.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => file_name,
    }
}

pub fn execute(args: PrepareArgs) -> Result<i32> {
    let sources = discover_files(&args.inputs, "txt");
    if sources.is_empty() {
        eprintln!("{} No .txt instances found", style("Error:").red().bold());
        return Ok(1);
    }

    let mut failed = 0;
    for source in &sources {
        let dest = destination(source, args.output.as_deref());
        match convert_text_file(source, &dest) {
            Ok(()) => println!("  {} {}", style("Converted").green(), dest.display()),
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}", style("Skipped:").red(), e);
            }
        }
    }

    println!(
        "\n{} {} converted, {} skipped",
        style("Done:").green().bold(),
        sources.len() - failed,
        failed
    );
    Ok(if failed == 0 { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination() {
        assert_eq!(destination(Path::new("in/a.txt"), None), PathBuf::from("in/a.json"));
        assert_eq!(
            destination(Path::new("in/a.txt"), Some(Path::new("out"))),
            PathBuf::from("out/a.json")
        );
    }
}
