use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{AccountIndex, AccountType};
use crate::error::LedgerResult;
use crate::journal::JournalEntry;

use super::accumulate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: Decimal,
    pub credit: Decimal,
    /// `debit - credit`.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub totals: TrialBalanceTotals,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.totals.debit == self.totals.credit
    }
}

/// Per-account debit/credit totals of all posted entries dated on or before `as_of`,
/// one row per touched account, sorted by code.
pub fn trial_balance(
    entries: &[JournalEntry],
    accounts: &AccountIndex,
    as_of: NaiveDate,
) -> LedgerResult<TrialBalance> {
    let activity = accumulate(entries, accounts, |date| date <= as_of)?;

    let mut totals = TrialBalanceTotals::default();
    let rows: Vec<TrialBalanceRow> = activity
        .into_values()
        .map(|a| {
            totals.debit += a.debit;
            totals.credit += a.credit;
            TrialBalanceRow {
                code: a.account.code,
                name: a.account.name,
                account_type: a.account.account_type,
                debit: a.debit,
                credit: a.credit,
                balance: a.debit - a.credit,
            }
        })
        .collect();

    let report = TrialBalance { as_of, rows, totals };
    if !report.is_balanced() {
        // Every stored entry balances, so this points at corrupted storage.
        tracing::warn!(
            as_of = %as_of,
            debit = %report.totals.debit,
            credit = %report.totals.credit,
            "trial balance does not close"
        );
    }
    Ok(report)
}
