use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booksmith_core::round_currency;

use crate::account::{AccountIndex, AccountType};
use crate::error::LedgerResult;
use crate::journal::JournalEntry;

use super::{accumulate, ensure_window};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlLine {
    pub code: String,
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PnlSection {
    /// Sorted by descending amount.
    pub accounts: Vec<PnlLine>,
    pub total: Decimal,
}

impl PnlSection {
    fn push(&mut self, line: PnlLine) {
        self.total += line.amount;
        self.accounts.push(line);
    }

    fn sort(&mut self) {
        self.accounts
            .sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.code.cmp(&b.code)));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: PnlSection,
    pub expenses: PnlSection,
    pub net_profit: Decimal,
    /// Percentage of income, two decimals; zero when there is no income.
    pub net_profit_margin: Decimal,
}

/// Income and expense activity of posted entries with `start <= date <= end`.
pub fn profit_and_loss(
    entries: &[JournalEntry],
    accounts: &AccountIndex,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerResult<ProfitAndLoss> {
    ensure_window(start, end)?;
    let activity = accumulate(entries, accounts, |date| start <= date && date <= end)?;

    let mut income = PnlSection::default();
    let mut expenses = PnlSection::default();
    for a in activity.into_values() {
        let section = match a.account.account_type {
            AccountType::Income => &mut income,
            AccountType::Expense => &mut expenses,
            _ => continue,
        };
        section.push(PnlLine {
            amount: a.account.account_type.signed_balance(a.debit, a.credit),
            code: a.account.code,
            name: a.account.name,
        });
    }
    income.sort();
    expenses.sort();

    let net_profit = income.total - expenses.total;
    let net_profit_margin = if income.total.is_zero() {
        Decimal::ZERO
    } else {
        round_currency(net_profit / income.total * Decimal::ONE_HUNDRED)
    };

    Ok(ProfitAndLoss {
        start,
        end,
        income,
        expenses,
        net_profit,
        net_profit_margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::reports::fixtures::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signs_follow_account_type() {
        let accounts = chart_accounts();
        let entries = vec![
            simple(&accounts, "JV/1", date(2025, 4, 5), "1200", "4000", dec!(1000)),
            simple(&accounts, "JV/2", date(2025, 4, 6), "5100", "2000", dec!(300)),
            simple(&accounts, "JV/3", date(2025, 4, 7), "6000", "1100", dec!(450)),
            // a sales return reduces income
            simple(&accounts, "JV/4", date(2025, 4, 8), "4000", "1200", dec!(100)),
        ];
        let pnl = profit_and_loss(&entries, &index(&accounts), date(2025, 4, 1), date(2025, 4, 30))
            .unwrap();

        assert_eq!(pnl.income.total, dec!(900));
        assert_eq!(pnl.expenses.total, dec!(750));
        assert_eq!(pnl.net_profit, dec!(150));
        assert_eq!(pnl.net_profit_margin, dec!(16.67));
        let expense_codes: Vec<_> = pnl.expenses.accounts.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(expense_codes, vec!["6000", "5100"]);
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let accounts = chart_accounts();
        let entries = vec![
            simple(&accounts, "JV/1", date(2025, 3, 31), "1000", "4000", dec!(1)),
            simple(&accounts, "JV/2", date(2025, 4, 1), "1000", "4000", dec!(10)),
            simple(&accounts, "JV/3", date(2025, 4, 30), "1000", "4000", dec!(100)),
            simple(&accounts, "JV/4", date(2025, 5, 1), "1000", "4000", dec!(1000)),
        ];
        let pnl = profit_and_loss(&entries, &index(&accounts), date(2025, 4, 1), date(2025, 4, 30))
            .unwrap();
        assert_eq!(pnl.income.total, dec!(110));
    }

    #[test]
    fn no_income_means_zero_margin() {
        let accounts = chart_accounts();
        let entries = vec![simple(&accounts, "JV/1", date(2025, 4, 5), "6000", "1000", dec!(20))];
        let pnl = profit_and_loss(&entries, &index(&accounts), date(2025, 4, 1), date(2025, 4, 30))
            .unwrap();
        assert_eq!(pnl.net_profit, dec!(-20));
        assert_eq!(pnl.net_profit_margin, Decimal::ZERO);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = profit_and_loss(&[], &AccountIndex::default(), date(2025, 5, 1), date(2025, 4, 1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
