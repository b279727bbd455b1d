//! Financial statements aggregated from posted journal entries and finalized documents.
//!
//! Every function here is pure: callers load entries/documents from storage and hand
//! them over. Draft entries are ignored.

pub mod account_ledger;
pub mod aging;
pub mod balance_sheet;
pub mod cash_flow;
pub mod profit_loss;
pub mod tax;
pub mod trial_balance;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::account::{Account, AccountIndex};
use crate::error::{LedgerError, LedgerResult};
use crate::journal::JournalEntry;

pub use account_ledger::{AccountLedger, AccountLedgerLine, account_ledger};
pub use aging::{AgingBucket, AgingBuckets, AgingLine, AgingOptions, AgingReport, BucketKind, aging_report};
pub use balance_sheet::{BalanceSheet, BalanceSheetLine, BalanceSheetSection, balance_sheet};
pub use cash_flow::{CashFlow, cash_flow};
pub use profit_loss::{PnlLine, PnlSection, ProfitAndLoss, profit_and_loss};
pub use tax::{TaxSide, TaxSummary, tax_summary};
pub use trial_balance::{TrialBalance, TrialBalanceRow, TrialBalanceTotals, trial_balance};

/// Reject windows whose start is after their end.
pub(crate) fn ensure_window(start: NaiveDate, end: NaiveDate) -> LedgerResult<()> {
    if start > end {
        return Err(LedgerError::validation(format!(
            "report window start {start} is after end {end}"
        )));
    }
    Ok(())
}

/// Debit/credit activity of one account.
#[derive(Debug, Clone)]
pub(crate) struct Activity {
    pub account: Account,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Sum posted activity per account code, for entries whose date passes `in_window`.
pub(crate) fn accumulate(
    entries: &[JournalEntry],
    accounts: &AccountIndex,
    in_window: impl Fn(NaiveDate) -> bool,
) -> LedgerResult<BTreeMap<String, Activity>> {
    let mut activity: BTreeMap<String, Activity> = BTreeMap::new();

    for entry in entries
        .iter()
        .filter(|e| e.is_posted() && in_window(e.entry_date))
    {
        for line in &entry.lines {
            let account = accounts
                .get(&line.account_id)
                .or_else(|| accounts.by_code(&line.account_code))
                .ok_or_else(|| LedgerError::account_not_found(&line.account_code))?;
            let row = activity
                .entry(account.code.clone())
                .or_insert_with(|| Activity {
                    account: account.clone(),
                    debit: Decimal::ZERO,
                    credit: Decimal::ZERO,
                });
            row.debit += line.debit();
            row.credit += line.credit();
        }
    }

    Ok(activity)
}
