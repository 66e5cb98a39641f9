//! CLI command implementations.

pub mod clusters;
pub mod serve;
pub mod split;

use std::path::Path;

use ledgersplit::{AccountantSource, SplitterConfig};
use tracing::debug;

use crate::cli::Tuning;

/// Load the config file, if any, then apply command-line overrides.
pub fn load_config(tuning: &Tuning) -> ledgersplit::Result<SplitterConfig> {
    let mut config = read_config(tuning.config.as_deref())?;

    if let Some(threshold) = tuning.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(metric) = tuning.metric {
        config = config.with_metric(metric);
    }
    if let Some(headers) = tuning.headers {
        config = config.with_headers(headers);
    }
    if tuning.from_description {
        config = config.with_accountant_source(AccountantSource::Description);
    }

    config.validate()?;
    debug!(?config, "effective configuration");
    Ok(config)
}

/// Config from a JSON file, or the defaults.
pub fn read_config(path: Option<&Path>) -> ledgersplit::Result<SplitterConfig> {
    match path {
        Some(path) => SplitterConfig::load(path),
        None => Ok(SplitterConfig::default()),
    }
}
