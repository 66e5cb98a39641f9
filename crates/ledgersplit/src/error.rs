//! Error types for the ledgersplit library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ledgersplit operations.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input table lacks one or more required columns.
    #[error("missing columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error writing the output archive.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no header row.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure inside clustering, partitioning or assembly.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`SplitError`], for callers that map errors
/// onto transport-level responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required columns are missing.
    Schema,
    /// The upload is neither delimited text nor a readable workbook.
    UnsupportedInput,
    /// The configuration is invalid.
    Config,
    /// Anything else; surfaced as a generic failure.
    Internal,
}

impl SplitError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitError::MissingColumns { .. } => ErrorKind::Schema,
            SplitError::UnsupportedFormat(_) | SplitError::EmptyData(_) | SplitError::Csv(_) => {
                ErrorKind::UnsupportedInput
            }
            SplitError::Config(_) => ErrorKind::Config,
            SplitError::Io { .. } | SplitError::Zip(_) | SplitError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type alias for ledgersplit operations.
pub type Result<T> = std::result::Result<T, SplitError>;
