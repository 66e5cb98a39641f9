//! Rows removed before clustering because their business is out of scope.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::{NormalizedName, Normalizer};
use crate::schema::{Column, Row};

/// Reason recorded for rows dropped by [`BusinessFilter`].
pub const EXCLUDED_BUSINESS_REASON: &str = "excluded business";

/// A row that did not reach the partitioner, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRow {
    pub row: Row,
    pub reason: String,
}

/// Drops rows whose business name matches a configured list, compared in
/// normalized form.
#[derive(Debug, Clone)]
pub struct BusinessFilter {
    normalizer: Normalizer,
    excluded: HashSet<NormalizedName>,
}

impl BusinessFilter {
    pub fn new(normalizer: Normalizer, businesses: &[String]) -> Self {
        let excluded = businesses
            .iter()
            .map(|b| normalizer.normalize(b))
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            normalizer,
            excluded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }

    /// Whether a row's business is on the list.
    pub fn matches(&self, row: &Row) -> bool {
        !self.excluded.is_empty()
            && self
                .excluded
                .contains(&self.normalizer.normalize(row.get(Column::BusinessName)))
    }

    /// Split rows into kept and excluded, both in input order.
    pub fn apply(&self, rows: Vec<Row>) -> (Vec<Row>, Vec<ExcludedRow>) {
        if self.excluded.is_empty() {
            return (rows, Vec::new());
        }

        let mut kept = Vec::with_capacity(rows.len());
        let mut excluded = Vec::new();
        for row in rows {
            if self.matches(&row) {
                warn!(
                    row = row.index,
                    business = row.get(Column::BusinessName),
                    person = %row.person(),
                    "excluded row by business name"
                );
                excluded.push(ExcludedRow {
                    row,
                    reason: EXCLUDED_BUSINESS_REASON.to_string(),
                });
            } else {
                kept.push(row);
            }
        }
        (kept, excluded)
    }
}
