//! Clusters command - show how names would be grouped.

use std::path::PathBuf;

use colored::Colorize;
use ledgersplit::{JoinReason, Splitter};
use serde::Serialize;

use crate::cli::Tuning;

/// JSON shape of one identity.
#[derive(Serialize)]
struct IdentityView<'a> {
    canonical: &'a str,
    members: Vec<MemberView<'a>>,
}

#[derive(Serialize)]
struct MemberView<'a> {
    raw: &'a str,
    #[serde(flatten)]
    reason: &'a JoinReason,
}

pub fn run(
    file: PathBuf,
    tuning: Tuning,
    json: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let config = super::load_config(&tuning)?;
    let threshold = config.similarity_threshold;
    let preview = Splitter::new(config)?.preview_file(&file)?;
    let clustering = &preview.clustering;

    let views: Vec<IdentityView> = clustering
        .identities()
        .iter()
        .map(|identity| IdentityView {
            canonical: &identity.canonical,
            members: clustering
                .assignments()
                .filter(|a| a.identity == identity.id)
                .map(|a| MemberView {
                    raw: &a.raw,
                    reason: &a.reason,
                })
                .collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    println!(
        "{} identities from {} spellings (threshold {})",
        clustering.len().to_string().white().bold(),
        clustering.name_count(),
        threshold
    );
    println!();

    for view in &views {
        println!("{}", view.canonical.cyan().bold());
        for member in view.members.iter().skip(1) {
            let detail = match member.reason {
                JoinReason::Similar { score } => format!("{:.3}", score),
                JoinReason::Alias { group } => format!("alias {}", group),
                JoinReason::SameNormalized => "same".to_string(),
                JoinReason::Founded => String::new(),
                JoinReason::Override => "override".to_string(),
            };
            println!("  {} {}", member.raw, detail.dimmed());
        }
    }

    if !preview.excluded.is_empty() {
        println!();
        println!(
            "{} rows excluded by business name",
            preview.excluded.len().to_string().yellow()
        );
    }

    Ok(())
}
