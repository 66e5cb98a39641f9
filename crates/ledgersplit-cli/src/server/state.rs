//! Application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use ledgersplit::Splitter;

/// Shared application state.
///
/// Only immutable configuration lives here; every upload is split with
/// request-scoped clusters and buckets.
#[derive(Clone)]
pub struct AppState {
    /// Configured splitter.
    pub splitter: Arc<Splitter>,
    /// Server limits.
    pub limits: Limits,
}

impl AppState {
    /// Create new application state.
    pub fn new(splitter: Splitter, limits: Limits) -> Self {
        Self {
            splitter: Arc::new(splitter),
            limits,
        }
    }
}

/// Request limits applied by the router.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
    /// Time before a request is abandoned.
    pub timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_body_bytes: 25 * 1024 * 1024,
            timeout: Duration::from_secs(60),
        }
    }
}
