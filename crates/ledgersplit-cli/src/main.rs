//! ledgersplit CLI - split payments tables by accountant.

mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Split {
            file,
            output,
            tuning,
            no_totals,
        } => commands::split::run(file, output, tuning, no_totals, cli.verbose),

        Commands::Clusters { file, tuning, json } => {
            commands::clusters::run(file, tuning, json, cli.verbose)
        }

        Commands::Serve {
            port,
            config,
            max_upload_mb,
            timeout_secs,
            open,
        } => commands::serve::run(port, config, max_upload_mb, timeout_secs, open, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
/// the defaults.
fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "ledgersplit=debug,ledgersplit_cli=debug,tower_http=debug"
    } else if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
