//! Grouping rows by canonical accountant.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cluster::Clustering;
use crate::error::{Result, SplitError};
use crate::schema::Row;

/// One line of the audit mapping: a distinct RawName and its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub original: String,
    pub canonical: String,
}

/// Rows grouped by canonical name. Buckets are ordered by the first row
/// that reached them; rows inside a bucket keep input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    buckets: IndexMap<String, Vec<Row>>,
}

impl Partition {
    /// Buckets in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn get(&self, canonical: &str) -> Option<&[Row]> {
        self.buckets.get(canonical).map(Vec::as_slice)
    }

    pub fn canonicals(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total rows across all buckets.
    pub fn row_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Partition result: buckets plus the per-name audit mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionOutput {
    pub partition: Partition,
    /// One entry per distinct RawName, first appearance first.
    pub mapping: Vec<MappingEntry>,
}

/// Route every row to its canonical bucket.
///
/// Rows must already be projected onto the fixed schema. A RawName the
/// clustering does not know is an internal error: no row is ever dropped or
/// guessed into a bucket.
pub fn partition(rows: Vec<Row>, clustering: &Clustering) -> Result<PartitionOutput> {
    partition_routed(rows.into_iter().map(|row| (row, None)), clustering)
}

/// Like [`partition`], for rows that may already carry their identity.
/// Rows with `Some(identity)` go to that identity's bucket and add no
/// mapping entry; the rest are placed by their RawName. Input must be in
/// row order.
pub fn partition_routed(
    rows: impl IntoIterator<Item = (Row, Option<usize>)>,
    clustering: &Clustering,
) -> Result<PartitionOutput> {
    let mut buckets: IndexMap<String, Vec<Row>> = IndexMap::new();
    let mut seen: IndexMap<String, String> = IndexMap::new();

    for (row, target) in rows {
        let canonical = match target {
            Some(id) => clustering
                .identity(id)
                .map(|i| i.canonical.as_str())
                .ok_or_else(|| {
                    SplitError::Internal(format!(
                        "row {} routed to unknown identity {}",
                        row.index, id
                    ))
                })?,
            None => {
                let canonical = clustering.canonical_of(&row.accountant).ok_or_else(|| {
                    SplitError::Internal(format!(
                        "row {} has accountant '{}' with no identity",
                        row.index, row.accountant
                    ))
                })?;
                if !seen.contains_key(&row.accountant) {
                    seen.insert(row.accountant.clone(), canonical.to_string());
                }
                canonical
            }
        };

        match buckets.get_mut(canonical) {
            Some(bucket) => bucket.push(row),
            None => {
                buckets.insert(canonical.to_string(), vec![row]);
            }
        }
    }

    let mapping = seen
        .into_iter()
        .map(|(original, canonical)| MappingEntry { original, canonical })
        .collect();

    Ok(PartitionOutput {
        partition: Partition { buckets },
        mapping,
    })
}
