use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::error::LedgerResult;
use crate::journal::JournalEntry;

use super::ensure_window;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedgerLine {
    pub entry_date: NaiveDate,
    pub journal_number: String,
    pub reference: String,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Running balance after this line, in the account's normal-balance sign.
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedger {
    pub code: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub opening_balance: Decimal,
    pub lines: Vec<AccountLedgerLine>,
    pub closing_balance: Decimal,
}

/// Statement of one account: opening balance from posted activity before `start`,
/// every posted line in the window in date order, and the closing balance.
pub fn account_ledger(
    entries: &[JournalEntry],
    account: &Account,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerResult<AccountLedger> {
    ensure_window(start, end)?;
    let kind = account.account_type;

    let mut posted: Vec<&JournalEntry> = entries
        .iter()
        .filter(|e| e.is_posted() && e.entry_date <= end)
        .collect();
    posted.sort_by(|a, b| {
        a.entry_date
            .cmp(&b.entry_date)
            .then_with(|| a.journal_number.cmp(&b.journal_number))
    });

    let mut opening_balance = Decimal::ZERO;
    let mut balance = Decimal::ZERO;
    let mut lines = Vec::new();
    for entry in posted {
        for line in entry.lines.iter().filter(|l| l.account_id == account.id) {
            let delta = kind.signed_balance(line.debit(), line.credit());
            if entry.entry_date < start {
                opening_balance += delta;
                balance = opening_balance;
                continue;
            }
            balance += delta;
            lines.push(AccountLedgerLine {
                entry_date: entry.entry_date,
                journal_number: entry.journal_number.clone(),
                reference: entry.reference.clone(),
                description: if line.description.is_empty() {
                    entry.description.clone()
                } else {
                    line.description.clone()
                },
                debit: line.debit(),
                credit: line.credit(),
                balance,
            });
        }
    }

    Ok(AccountLedger {
        code: account.code.clone(),
        name: account.name.clone(),
        start,
        end,
        opening_balance,
        lines,
        closing_balance: balance,
    })
}
