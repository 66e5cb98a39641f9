//! Example: split a payments file by accountant and explain every merge.
//!
//! Usage:
//!   cargo run --example split -- <file_path> [threshold]
//!
//! Example:
//!   cargo run --example split -- payments.csv 0.85

use std::env;
use std::path::Path;

use ledgersplit::{JoinReason, Splitter, SplitterConfig};

fn main() -> ledgersplit::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example split -- <file_path> [threshold]");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example split -- payments.csv 0.85");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let mut config = SplitterConfig::default();
    if let Some(t) = args.get(2).and_then(|t| t.parse().ok()) {
        config = config.with_threshold(t);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Split: {}", path.display());
    println!("{}", separator);
    println!();

    let report = Splitter::new(config)?.split_file(path)?;

    if let Some(source) = &report.source {
        println!("## Source");
        println!("  Format: {}", source.format);
        println!("  Rows: {}", source.row_count);
        println!("  Hash: {}", source.hash);
        println!();
    }

    println!("## Identities ({})", report.clustering.len());
    println!();
    for identity in report.clustering.identities() {
        println!("  {}", identity.canonical);
        for assignment in report
            .clustering
            .assignments()
            .filter(|a| a.identity == identity.id && a.raw != identity.canonical)
        {
            let why = match &assignment.reason {
                JoinReason::SameNormalized => "same normalized form".to_string(),
                JoinReason::Alias { group } => format!("alias group {}", group),
                JoinReason::Similar { score } => format!("similarity {:.3}", score),
                JoinReason::Founded => "founder".to_string(),
                JoinReason::Override => "person override".to_string(),
            };
            println!("    <- {:30} ({})", assignment.raw, why);
        }
    }
    println!();

    println!("## Totals");
    for summary in &report.summary.accountants {
        println!(
            "  {:30} {:6} rows={:<5} amount={:.2}",
            summary.canonical, summary.source, summary.rows, summary.totals.amount
        );
    }
    println!();

    let out = path.with_extension("zip");
    std::fs::write(&out, &report.archive.bytes).map_err(|e| ledgersplit::SplitError::Io {
        path: out.clone(),
        source: e,
    })?;
    println!("Wrote {} ({} entries)", out.display(), report.archive.entries.len());
    println!("{}", separator);

    Ok(())
}
