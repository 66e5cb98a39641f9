//! Money totals per accountant.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::partition::Partition;
use crate::schema::{Column, Row, RowSource};

/// Anything that is not part of a plain decimal number.
static NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static regex"));

/// Parse a money cell leniently: thousands separators, currency symbols and
/// whitespace are ignored, and `(12.50)` reads as negative. Returns `None`
/// for cells that hold no number.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let negative_parens = trimmed.starts_with('(') && trimmed.ends_with(')');
    let cleaned = NOISE.replace_all(trimmed, "");
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative_parens { -value.abs() } else { value })
}

/// Sums of the money columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub amount: f64,
    pub credit_commission: f64,
    pub vat: f64,
    pub amount_to_transfer: f64,
}

impl Totals {
    /// Sum the money columns of `rows`. Blank cells count as nothing;
    /// other cells without a number are skipped with a warning.
    pub fn of<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Self {
        let mut totals = Self::default();
        for row in rows {
            for column in Column::MONEY {
                let cell = row.get(column);
                match parse_amount(cell) {
                    Some(value) => totals.add(column, value),
                    None if cell.trim().is_empty() => {}
                    None => warn!(
                        row = row.index,
                        column = ?column,
                        value = cell,
                        "amount is not a number, left out of totals"
                    ),
                }
            }
        }
        totals
    }

    fn add(&mut self, column: Column, value: f64) {
        match column {
            Column::Amount => self.amount += value,
            Column::CreditCommission => self.credit_commission += value,
            Column::Vat => self.vat += value,
            Column::AmountToTransfer => self.amount_to_transfer += value,
            _ => {}
        }
    }

    /// Column-wise sum of two totals.
    pub fn combine(self, other: Totals) -> Totals {
        Totals {
            amount: self.amount + other.amount,
            credit_commission: self.credit_commission + other.credit_commission,
            vat: self.vat + other.vat,
            amount_to_transfer: self.amount_to_transfer + other.amount_to_transfer,
        }
    }

    /// Value for one of [`Column::MONEY`].
    pub fn get(&self, column: Column) -> Option<f64> {
        match column {
            Column::Amount => Some(self.amount),
            Column::CreditCommission => Some(self.credit_commission),
            Column::Vat => Some(self.vat),
            Column::AmountToTransfer => Some(self.amount_to_transfer),
            _ => None,
        }
    }
}

/// One line of the accountant summary: the rows of one identity that
/// reached it the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountantSummary {
    pub canonical: String,
    pub source: RowSource,
    pub rows: usize,
    pub totals: Totals,
}

/// Summaries in partition order; within an identity, clustered rows come
/// before rows routed by a person override. Sources without rows are left
/// out.
pub fn summarize(partition: &Partition) -> Vec<AccountantSummary> {
    let mut summaries = Vec::with_capacity(partition.len());
    for (canonical, rows) in partition.iter() {
        for source in [RowSource::Auto, RowSource::Manual] {
            let matching: Vec<&Row> = rows.iter().filter(|r| r.source == source).collect();
            if matching.is_empty() {
                continue;
            }
            summaries.push(AccountantSummary {
                canonical: canonical.to_string(),
                source,
                rows: matching.len(),
                totals: Totals::of(matching),
            });
        }
    }
    summaries
}

/// Totals of one identity across sources.
pub fn identity_totals(summaries: &[AccountantSummary], canonical: &str) -> Totals {
    summaries
        .iter()
        .filter(|s| s.canonical == canonical)
        .fold(Totals::default(), |acc, s| acc.combine(s.totals))
}

/// Render a sum without float noise: at most two decimals, no trailing
/// zeros.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
