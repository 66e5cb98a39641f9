//! Split command - write the per-accountant archive for a file.

use std::path::{Path, PathBuf};

use colored::Colorize;
use ledgersplit::{JoinReason, Splitter};
use tracing::info;

use crate::cli::Tuning;

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    tuning: Tuning,
    no_totals: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate input file exists
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let mut config = super::load_config(&tuning)?;
    if no_totals {
        config = config.with_totals_row(false);
    }

    println!(
        "{} {}",
        "Splitting".cyan().bold(),
        file.display().to_string().white()
    );

    let splitter = Splitter::new(config)?;
    let report = splitter.split_file(&file)?;

    let output = output.unwrap_or_else(|| default_output(&file));
    std::fs::write(&output, &report.archive.bytes)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
    info!(path = %output.display(), bytes = report.archive.bytes.len(), "wrote archive");

    if report.is_empty() {
        println!("{}", "No data rows; the archive holds empty tables only.".yellow());
    }

    println!(
        "Found {} accountants in {} rows ({} spellings, {} merged)",
        report.partition.len().to_string().white().bold(),
        report.summary.input_rows,
        report.summary.distinct_names,
        report.summary.merges.to_string().green()
    );
    if report.summary.manual_rows > 0 {
        println!(
            "Routed {} rows by person override",
            report.summary.manual_rows.to_string().cyan()
        );
    }
    if report.summary.excluded_rows > 0 {
        println!(
            "Excluded {} rows by business name",
            report.summary.excluded_rows.to_string().yellow()
        );
    }

    if verbose {
        println!();
        println!("{}", "Merges:".yellow().bold());
        for assignment in report.clustering.assignments() {
            let Some(canonical) = report.clustering.canonical_of(&assignment.raw) else {
                continue;
            };
            match &assignment.reason {
                JoinReason::Founded | JoinReason::Override => {}
                JoinReason::SameNormalized => {
                    println!("  {} -> {}", assignment.raw, canonical);
                }
                JoinReason::Alias { group } => {
                    println!("  {} -> {} (alias group {})", assignment.raw, canonical, group);
                }
                JoinReason::Similar { score } => {
                    println!("  {} -> {} ({:.3})", assignment.raw, canonical, score);
                }
            }
        }
    }

    println!();
    for summary in &report.summary.accountants {
        println!(
            "  {:40} {:6} {:>6} rows  {:>12.2}",
            summary.canonical, summary.source, summary.rows, summary.totals.amount
        );
    }
    println!();
    println!(
        "{} {}",
        "Saved".green().bold(),
        output.display().to_string().white()
    );

    Ok(())
}

/// `<dir>/<stem>_by_accountant.zip` next to the input.
fn default_output(file: &Path) -> PathBuf {
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    file.with_file_name(format!("{}_by_accountant.zip", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_sits_next_to_input() {
        assert_eq!(
            default_output(Path::new("/data/march payments.csv")),
            PathBuf::from("/data/march payments_by_accountant.zip")
        );
    }
}
