//! Add-topics command - Insert vertices

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::{open_graph, print_json};
use crate::GlobalOptions;

/// Arguments for the add-topics command
#[derive(Args, Debug)]
pub struct AddTopicsArgs {
    /// Topic names
    #[arg(required_unless_present = "file")]
    names: Vec<String>,

    /// Read additional names from a file, one per line
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the add-topics command
pub fn execute(args: AddTopicsArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    let mut names = args.names;
    if let Some(ref path) = args.file {
        names.extend(read_names(path)?);
    }

    let report = graph.add_vertices(&names)?;

    if args.json {
        return print_json(&report);
    }

    println!(
        "Added {} topics ({} existing, {} rejected)",
        report.inserted, report.existing, report.rejected
    );
    Ok(())
}

/// Non-blank lines of a name file, trimmed
pub fn read_names(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_names_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Elephant\n\n  Africa  \n").unwrap();

        let names = read_names(file.path()).unwrap();
        assert_eq!(names, vec!["Elephant", "Africa"]);
    }
}
