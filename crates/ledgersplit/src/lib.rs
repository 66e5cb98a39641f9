//! ledgersplit: split a payments table into one table per accountant.
//!
//! Accountant names are typed by hand and drift: case, spacing, punctuation,
//! titles and the odd typo. ledgersplit clusters the distinct spellings into
//! identities, routes every row to its identity's table and packs the tables,
//! an audit mapping and a summary into one ZIP archive.
//!
//! # Core Principles
//!
//! - **Deterministic**: same input and configuration, same clusters and files
//! - **Lossless**: every row lands in exactly one table or in `excluded.csv`
//! - **Auditable**: `mapping.csv` records where each spelling went, and
//!   `people.csv` which customers a person override routed
//!
//! # Example
//!
//! ```no_run
//! use ledgersplit::{Splitter, SplitterConfig};
//!
//! let splitter = Splitter::new(SplitterConfig::default()).unwrap();
//! let report = splitter.split_file("payments.csv").unwrap();
//!
//! println!("Accountants: {}", report.partition.len());
//! std::fs::write("by_accountant.zip", &report.archive.bytes).unwrap();
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod exclude;
pub mod export;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod partition;
pub mod route;
pub mod schema;
pub mod similarity;
pub mod summary;

mod pipeline;
#[cfg(test)]
mod testing;

pub use crate::pipeline::{Preview, SplitReport, SplitSummary, Splitter};
pub use cluster::{AliasGroup, Clusterer, Clustering, DEFAULT_THRESHOLD, Identity, JoinReason};
pub use config::SplitterConfig;
pub use error::{ErrorKind, Result, SplitError};
pub use export::{Archive, ExportAssembler, ExportOptions};
pub use input::{DataTable, Parser, SourceMetadata};
pub use normalize::{NormalizedName, Normalizer};
pub use partition::{MappingEntry, Partition};
pub use route::{PersonEntry, PersonOverride};
pub use schema::{AccountantSource, Column, HeaderPreset, Row, RowSource};
pub use similarity::{SimilarityMetric, SimilarityScorer};
