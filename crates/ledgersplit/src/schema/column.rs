//! Required columns and their header labels.

use serde::{Deserialize, Serialize};

/// One of the required input attributes that survive into per-accountant
/// tables. Declaration order is the output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    BillingMonth,
    BillingDate,
    BusinessName,
    FirstName,
    LastName,
    Email,
    Phone,
    TransactionType,
    PaymentType,
    Amount,
    CreditCommission,
    Vat,
    AmountToTransfer,
    PaymentDescription,
}

impl Column {
    /// Every output column, in output order.
    pub const ALL: [Column; 14] = [
        Column::BillingMonth,
        Column::BillingDate,
        Column::BusinessName,
        Column::FirstName,
        Column::LastName,
        Column::Email,
        Column::Phone,
        Column::TransactionType,
        Column::PaymentType,
        Column::Amount,
        Column::CreditCommission,
        Column::Vat,
        Column::AmountToTransfer,
        Column::PaymentDescription,
    ];

    /// Columns summed in totals rows and the accountant summary.
    pub const MONEY: [Column; 4] = [
        Column::Amount,
        Column::CreditCommission,
        Column::Vat,
        Column::AmountToTransfer,
    ];

    /// Position of this column in output order.
    pub fn position(self) -> usize {
        self as usize
    }

    /// Header label under the given preset.
    pub fn label(self, preset: HeaderPreset) -> &'static str {
        match preset {
            HeaderPreset::English => match self {
                Column::BillingMonth => "Billing Month",
                Column::BillingDate => "Billing Date",
                Column::BusinessName => "Business Name",
                Column::FirstName => "First Name",
                Column::LastName => "Last Name",
                Column::Email => "Email",
                Column::Phone => "Phone",
                Column::TransactionType => "Transaction Type",
                Column::PaymentType => "Payment Type",
                Column::Amount => "Amount",
                Column::CreditCommission => "Credit Commission",
                Column::Vat => "VAT",
                Column::AmountToTransfer => "Amount To Transfer",
                Column::PaymentDescription => "Payment Description",
            },
            HeaderPreset::Hebrew => match self {
                Column::BillingMonth => "חודש חיוב",
                Column::BillingDate => "תאריך חיוב",
                Column::BusinessName => "שם העסק",
                Column::FirstName => "שם",
                Column::LastName => "משפחה",
                Column::Email => "אימייל",
                Column::Phone => "טלפון",
                Column::TransactionType => "סוג עסקה",
                Column::PaymentType => "סוג תשלום",
                Column::Amount => "סכום",
                Column::CreditCommission => "עמלת אשראי",
                Column::Vat => "מע\"מ",
                Column::AmountToTransfer => "להעברה",
                Column::PaymentDescription => "תיאור התשלום",
            },
        }
    }
}

/// Which language the required headers are expected (and written) in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPreset {
    #[default]
    English,
    Hebrew,
}

impl HeaderPreset {
    /// Header of the accountant-name column.
    pub fn accountant_label(self) -> &'static str {
        match self {
            HeaderPreset::English => "Accountant",
            HeaderPreset::Hebrew => "רואה חשבון",
        }
    }

    /// Label written into the totals row.
    pub fn totals_label(self) -> &'static str {
        match self {
            HeaderPreset::English => "Total",
            HeaderPreset::Hebrew => "סה\"כ",
        }
    }

    /// Output header row, in output order.
    pub fn headers(self) -> Vec<&'static str> {
        Column::ALL.iter().map(|c| c.label(self)).collect()
    }
}

impl std::str::FromStr for HeaderPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "english" | "en" => Ok(HeaderPreset::English),
            "hebrew" | "he" => Ok(HeaderPreset::Hebrew),
            _ => Err(format!("Unknown header preset: {}. Use english or hebrew.", s)),
        }
    }
}

impl std::fmt::Display for HeaderPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderPreset::English => write!(f, "english"),
            HeaderPreset::Hebrew => write!(f, "hebrew"),
        }
    }
}
