//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ledgersplit::{HeaderPreset, SimilarityMetric};

/// ledgersplit: split a payments table into one table per accountant
#[derive(Parser)]
#[command(name = "ledgersplit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a CSV/TSV file into a ZIP of per-accountant tables
    Split {
        /// Path to the payments file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output archive (default: <file stem>_by_accountant.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,

        /// Do not append a totals row to each accountant table
        #[arg(long)]
        no_totals: bool,
    },

    /// Show how accountant names would be grouped, without writing anything
    Clusters {
        /// Path to the payments file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        tuning: Tuning,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the upload server
    Serve {
        /// Port for web server
        #[arg(short, long, default_value = "3141")]
        port: u16,

        /// Splitter configuration file (JSON)
        #[arg(short, long, env = "LEDGERSPLIT_CONFIG")]
        config: Option<PathBuf>,

        /// Largest accepted upload in MiB; the whole file and its archive are
        /// held in memory
        #[arg(long, default_value = "25")]
        max_upload_mb: usize,

        /// Seconds before a request is abandoned
        #[arg(long, default_value = "60")]
        timeout_secs: u64,

        /// Open the upload page in a browser
        #[arg(long)]
        open: bool,
    },
}

/// Options shared by the commands that cluster names.
#[derive(Args, Clone, Debug, Default)]
pub struct Tuning {
    /// Splitter configuration file (JSON)
    #[arg(short, long, env = "LEDGERSPLIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Similarity needed to merge two spellings, strictly between 0 and 1
    #[arg(short, long, env = "LEDGERSPLIT_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Similarity metric (ratio, token_sort_ratio, levenshtein,
    /// damerau_levenshtein, jaro_winkler)
    #[arg(short, long)]
    pub metric: Option<SimilarityMetric>,

    /// Header language of the input and output tables (english, hebrew)
    #[arg(long)]
    pub headers: Option<HeaderPreset>,

    /// Read accountant names from the payment description instead of an
    /// accountant column
    #[arg(long)]
    pub from_description: bool,
}
