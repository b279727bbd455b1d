use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booksmith_core::BALANCE_TOLERANCE;

use crate::account::AccountType;

use super::trial_balance::TrialBalance;

/// Code used for the synthetic unclosed-earnings equity line.
pub const CURRENT_EARNINGS_CODE: &str = "current-earnings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetLine {
    pub code: String,
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSheetSection {
    pub accounts: Vec<BalanceSheetLine>,
    pub total: Decimal,
}

impl BalanceSheetSection {
    fn push(&mut self, code: impl Into<String>, name: impl Into<String>, amount: Decimal) {
        self.total += amount;
        self.accounts.push(BalanceSheetLine {
            code: code.into(),
            name: name.into(),
            amount,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: BalanceSheetSection,
    pub liabilities: BalanceSheetSection,
    pub equity: BalanceSheetSection,
    pub is_balanced: bool,
}

/// Partition a trial balance into assets, liabilities and equity.
///
/// Asset rows keep the debit-positive balance; liability and equity rows are negated so
/// credit balances read positive. Income and expense accounts are not closed into
/// retained earnings by any entry, so their net is carried as a "Current Earnings"
/// equity line.
pub fn balance_sheet(trial: &TrialBalance) -> BalanceSheet {
    let mut assets = BalanceSheetSection::default();
    let mut liabilities = BalanceSheetSection::default();
    let mut equity = BalanceSheetSection::default();
    let mut earnings = Decimal::ZERO;

    for row in &trial.rows {
        match row.account_type {
            AccountType::Asset => assets.push(&row.code, &row.name, row.balance),
            AccountType::Liability => liabilities.push(&row.code, &row.name, -row.balance),
            AccountType::Equity => equity.push(&row.code, &row.name, -row.balance),
            AccountType::Income | AccountType::Expense => earnings -= row.balance,
        }
    }
    if !earnings.is_zero() {
        equity.push(CURRENT_EARNINGS_CODE, "Current Earnings", earnings);
    }

    let is_balanced =
        (assets.total - (liabilities.total + equity.total)).abs() < BALANCE_TOLERANCE;

    BalanceSheet {
        as_of: trial.as_of,
        assets,
        liabilities,
        equity,
        is_balanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::PostingLine;
    use crate::reports::fixtures::*;
    use crate::reports::trial_balance::trial_balance;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn liabilities_and_equity_read_positive() {
        let accounts = chart_accounts();
        let entries = vec![
            simple(&accounts, "JV/1", date(2025, 4, 1), "1100", "3000", dec!(5000)),
            simple(&accounts, "JV/2", date(2025, 4, 2), "1300", "2000", dec!(1200)),
            simple(&accounts, "JV/3", date(2025, 4, 3), "1200", "4000", dec!(800)),
            simple(&accounts, "JV/4", date(2025, 4, 4), "6000", "1100", dec!(300)),
        ];
        let tb = trial_balance(&entries, &index(&accounts), date(2025, 4, 30)).unwrap();
        let bs = balance_sheet(&tb);

        assert_eq!(bs.assets.total, dec!(6700));
        assert_eq!(bs.liabilities.total, dec!(1200));
        assert_eq!(bs.equity.total, dec!(5500));
        let earnings = bs.equity.accounts.last().unwrap();
        assert_eq!(earnings.code, CURRENT_EARNINGS_CODE);
        assert_eq!(earnings.amount, dec!(500));
        assert!(bs.is_balanced);
    }

    #[test]
    fn empty_ledger_is_balanced() {
        let tb = trial_balance(&[], &index(&chart_accounts()), date(2025, 4, 30)).unwrap();
        let bs = balance_sheet(&tb);
        assert!(bs.is_balanced);
        assert!(bs.equity.accounts.is_empty());
    }

    proptest! {
        #[test]
        fn accounting_identity_holds(postings in proptest::collection::vec((0usize..15, 0usize..15, 1i64..5_000_000), 1..40)) {
            let accounts = chart_accounts();
            let entries: Vec<_> = postings
                .iter()
                .enumerate()
                .filter(|(_, (d, c, _))| d != c)
                .map(|(i, (d, c, cents))| {
                    posted(
                        &accounts,
                        &format!("JV/{i}"),
                        date(2025, 4, 1),
                        vec![
                            PostingLine::debit(&accounts[*d].code, Decimal::new(*cents, 2), ""),
                            PostingLine::credit(&accounts[*c].code, Decimal::new(*cents, 2), ""),
                        ],
                    )
                })
                .collect();
            let tb = trial_balance(&entries, &index(&accounts), date(2025, 4, 1)).unwrap();
            prop_assert!(balance_sheet(&tb).is_balanced);
        }
    }
}
