//! Voucher numbering: sequence rows, default prefixes, formatting.
//!
//! The read-modify-write on a sequence row lives in the storage adapters; this module
//! only knows what a row looks like and how a number renders.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use booksmith_core::FiscalYear;

/// Default zero-padding width for voucher numbers.
pub const DEFAULT_PADDING: u32 = 4;

/// Document type a number is issued for (`"invoice"`, `"journal"`, ...).
///
/// Stored lower-case so `"Invoice"` and `"invoice"` share one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoucherType(String);

impl VoucherType {
    pub const INVOICE: &'static str = "invoice";
    pub const BILL: &'static str = "bill";
    pub const PAYMENT: &'static str = "payment";
    pub const PAYMENT_MADE: &'static str = "payment_made";
    pub const JOURNAL: &'static str = "journal";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    pub fn journal() -> Self {
        Self::new(Self::JOURNAL)
    }

    pub fn invoice() -> Self {
        Self::new(Self::INVOICE)
    }

    pub fn bill() -> Self {
        Self::new(Self::BILL)
    }

    pub fn payment() -> Self {
        Self::new(Self::PAYMENT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoucherType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of one sequence row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceKey {
    pub voucher_type: VoucherType,
    pub fiscal_year: FiscalYear,
}

impl SequenceKey {
    pub fn new(voucher_type: VoucherType, fiscal_year: FiscalYear) -> Self {
        Self {
            voucher_type,
            fiscal_year,
        }
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.voucher_type, self.fiscal_year)
    }
}

/// Prefix and padding used when a sequence row is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSettings {
    pub prefix: String,
    #[serde(default = "default_padding")]
    pub padding: u32,
}

fn default_padding() -> u32 {
    DEFAULT_PADDING
}

impl SequenceSettings {
    pub fn new(prefix: impl Into<String>, padding: u32) -> Self {
        Self {
            prefix: prefix.into(),
            padding,
        }
    }
}

/// Static per-type defaults, overridable from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceDefaults {
    overrides: HashMap<String, SequenceSettings>,
}

impl SequenceDefaults {
    pub fn with_override(mut self, voucher_type: &str, settings: SequenceSettings) -> Self {
        self.overrides
            .insert(VoucherType::new(voucher_type).as_str().to_string(), settings);
        self
    }

    pub fn settings_for(&self, voucher_type: &VoucherType) -> SequenceSettings {
        if let Some(settings) = self.overrides.get(voucher_type.as_str()) {
            return settings.clone();
        }
        let prefix = match voucher_type.as_str() {
            VoucherType::INVOICE => "INV",
            VoucherType::BILL => "BILL",
            VoucherType::PAYMENT => "RCV",
            VoucherType::PAYMENT_MADE => "PAY",
            VoucherType::JOURNAL => "JV",
            "quotation" => "QT",
            "credit_note" => "CN",
            "debit_note" => "DN",
            "purchase_order" => "PO",
            other => return SequenceSettings::new(other.to_uppercase(), DEFAULT_PADDING),
        };
        SequenceSettings::new(prefix, DEFAULT_PADDING)
    }
}

/// One sequence row: the next number to hand out for a `(type, fiscal year)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherSequence {
    pub voucher_type: VoucherType,
    pub fiscal_year: FiscalYear,
    pub prefix: String,
    pub next_number: u64,
    pub padding: u32,
}

impl VoucherSequence {
    /// Fresh row, numbering from 1.
    pub fn seeded(key: &SequenceKey, settings: &SequenceSettings) -> Self {
        Self {
            voucher_type: key.voucher_type.clone(),
            fiscal_year: key.fiscal_year,
            prefix: settings.prefix.clone(),
            next_number: 1,
            padding: settings.padding,
        }
    }

    pub fn key(&self) -> SequenceKey {
        SequenceKey::new(self.voucher_type.clone(), self.fiscal_year)
    }

    pub fn format(&self, number: u64) -> String {
        format_voucher_number(&self.prefix, self.fiscal_year, number, self.padding)
    }
}

/// A number handed out by a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedNumber {
    pub key: SequenceKey,
    pub sequence: u64,
    pub formatted: String,
}

/// `prefix/fiscalYear/zero-padded(n)`, e.g. `INV/2025-26/0001`.
///
/// Numbers wider than the padding are printed in full, never truncated.
pub fn format_voucher_number(prefix: &str, fiscal_year: FiscalYear, number: u64, padding: u32) -> String {
    format!(
        "{prefix}/{fiscal_year}/{number:0width$}",
        width = padding as usize
    )
}
