//! Projection of a parsed table onto the fixed schema.

use serde::{Deserialize, Serialize};

use super::column::{Column, HeaderPreset};
use crate::error::{Result, SplitError};
use crate::extract::accountant_from_description;
use crate::input::DataTable;

/// Where each row's accountant RawName comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountantSource {
    /// A dedicated accountant-name column (required).
    #[default]
    Column,
    /// Extracted from the payment description; no accountant column needed.
    Description,
}

/// How a row's accountant was decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    /// From the row's own accountant name, through clustering.
    #[default]
    Auto,
    /// From a person override matching the customer's name.
    Manual,
}

impl RowSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RowSource::Auto => "auto",
            RowSource::Manual => "manual",
        }
    }
}

impl std::fmt::Display for RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One input record, projected onto the output column order. Field values
/// never change after projection; only `source` is set, by routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    /// Zero-based index of the record among the table's data rows.
    pub index: usize,
    /// Values in [`Column::ALL`] order.
    pub fields: Vec<String>,
    /// The accountant name exactly as recorded (the RawName).
    pub accountant: String,
    #[serde(default)]
    pub source: RowSource,
}

impl Row {
    /// Value of a required column.
    pub fn get(&self, column: Column) -> &str {
        self.fields
            .get(column.position())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The customer's first and last name joined by a space, or whichever
    /// of the two is present.
    pub fn person(&self) -> String {
        let first = self.get(Column::FirstName).trim();
        let last = self.get(Column::LastName).trim();
        match (first.is_empty(), last.is_empty()) {
            (false, false) => format!("{} {}", first, last),
            (false, true) => first.to_string(),
            (true, false) => last.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// The required column set under a header preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredSchema {
    pub headers: HeaderPreset,
    pub accountant_source: AccountantSource,
}

impl RequiredSchema {
    pub fn new(headers: HeaderPreset, accountant_source: AccountantSource) -> Self {
        Self {
            headers,
            accountant_source,
        }
    }

    /// Labels of every column the input must carry, output columns first.
    pub fn required_labels(&self) -> Vec<&'static str> {
        let mut labels = self.headers.headers();
        if self.accountant_source == AccountantSource::Column {
            labels.push(self.headers.accountant_label());
        }
        labels
    }

    /// Check the table carries every required column, reporting all missing
    /// labels at once in schema order.
    pub fn check(&self, table: &DataTable) -> Result<()> {
        let missing: Vec<String> = self
            .required_labels()
            .into_iter()
            .filter(|label| find_header(table, label).is_none())
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SplitError::MissingColumns { missing })
        }
    }

    /// Project every data row onto the fixed output order, whatever the
    /// input column order. Extra input columns are dropped.
    pub fn project(&self, table: &DataTable) -> Result<Vec<Row>> {
        self.check(table)?;

        let positions: Vec<usize> = Column::ALL
            .iter()
            .map(|c| find_header(table, c.label(self.headers)))
            .collect::<Option<_>>()
            .ok_or_else(|| SplitError::Internal("column lookup failed after check".into()))?;

        let accountant_pos = match self.accountant_source {
            AccountantSource::Column => Some(
                find_header(table, self.headers.accountant_label())
                    .ok_or_else(|| SplitError::Internal("accountant column vanished".into()))?,
            ),
            AccountantSource::Description => None,
        };

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let cell = |pos: usize| record.get(pos).cloned().unwrap_or_default();
                let fields: Vec<String> = positions.iter().map(|&p| cell(p)).collect();
                let accountant = match accountant_pos {
                    Some(pos) => cell(pos),
                    None => accountant_from_description(
                        &fields[Column::PaymentDescription.position()],
                    ),
                };
                Row {
                    index,
                    fields,
                    accountant,
                    source: RowSource::Auto,
                }
            })
            .collect();

        Ok(rows)
    }
}

/// Header lookup: exact after trimming, else ASCII case-insensitive.
fn find_header(table: &DataTable, label: &str) -> Option<usize> {
    table.column_index(label).or_else(|| {
        table
            .headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(label))
    })
}
