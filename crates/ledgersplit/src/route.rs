//! Routing rows by the customer's name instead of the accountant's.
//!
//! Some customers are known to belong to an accountant no matter what the
//! accountant cell or the payment description says. A [`PersonOverride`]
//! names the customer and the accountant; rows it matches skip clustering
//! and go straight to the identity the accountant name resolves to.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::{NormalizedName, Normalizer};
use crate::schema::Row;

/// One customer to accountant rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonOverride {
    /// Customer name as "first last", or either part alone.
    pub person: String,
    /// Accountant the customer's rows belong to.
    pub accountant: String,
}

impl PersonOverride {
    pub fn new(person: impl Into<String>, accountant: impl Into<String>) -> Self {
        Self {
            person: person.into(),
            accountant: accountant.into(),
        }
    }
}

/// A customer routed by an override, and where their rows went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonEntry {
    /// Customer name as built from the row.
    pub person: String,
    /// The `person` of the override that matched.
    pub rule: String,
    /// Canonical name of the receiving identity.
    pub canonical: String,
}

/// Matches rows against the configured overrides.
///
/// A row matches an override when the normalized customer name and the
/// normalized override person are equal, or when the words of one appear
/// as a contiguous run in the other ("Shayegandrov" matches "Vladimir
/// Shayegandrov"). Overrides are tried in the order listed; the first
/// match wins.
#[derive(Debug, Clone)]
pub struct PersonRouter {
    normalizer: Normalizer,
    rules: Vec<NormalizedName>,
}

impl PersonRouter {
    pub fn new(normalizer: Normalizer, overrides: &[PersonOverride]) -> Self {
        let rules = overrides
            .iter()
            .map(|o| normalizer.normalize(&o.person))
            .collect();
        Self { normalizer, rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.iter().all(NormalizedName::is_empty)
    }

    /// Index of the first override matching the row's customer.
    pub fn route(&self, row: &Row) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let person = self.normalizer.normalize(&row.person());
        self.rules.iter().position(|rule| rule.overlaps(&person))
    }

    /// Split rows into those left to clustering and those an override
    /// claims, each with the override's index. Both keep input order.
    pub fn split(&self, rows: Vec<Row>) -> (Vec<Row>, Vec<(Row, usize)>) {
        if self.is_empty() {
            return (rows, Vec::new());
        }

        let mut auto = Vec::with_capacity(rows.len());
        let mut manual = Vec::new();
        for row in rows {
            match self.route(&row) {
                Some(rule) => {
                    debug!(row = row.index, person = %row.person(), rule, "routed by person");
                    manual.push((row, rule));
                }
                None => auto.push(row),
            }
        }
        (auto, manual)
    }
}
