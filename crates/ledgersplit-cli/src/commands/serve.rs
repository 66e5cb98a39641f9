//! Serve command - run the upload server.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use ledgersplit::Splitter;

use crate::server::{app, state::AppState, state::Limits};

pub fn run(
    port: u16,
    config: Option<PathBuf>,
    max_upload_mb: usize,
    timeout_secs: u64,
    open_browser: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::read_config(config.as_deref())?;
    let splitter = Splitter::new(config)?;

    let limits = Limits {
        max_body_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        timeout: Duration::from_secs(timeout_secs),
    };
    let state = AppState::new(splitter, limits);

    let url = format!("http://localhost:{}", port);
    println!();
    println!(
        "{} {}",
        "Starting upload server at".cyan().bold(),
        url.white().bold()
    );
    println!();
    println!(
        "  Threshold: {}  Metric: {}",
        state.splitter.config().similarity_threshold,
        state.splitter.config().metric
    );
    println!("  Max upload: {} MiB", max_upload_mb);
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    if open_browser {
        if let Err(e) = open::that(&url) {
            eprintln!("{} Could not open browser: {}", "Warning:".yellow(), e);
        }
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, port))
}
