//! Canonical account codes used by the event translators.
//!
//! The mapping is configuration, not code: each ledger supplies its own
//! `ChartOfAccounts` and the translators never hard-code a number.

use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountType};

/// Which account code plays each role in the standard postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOfAccounts {
    pub cash: String,
    pub bank: String,
    pub receivables: String,
    pub inventory: String,
    pub tax_input: String,
    pub payables: String,
    pub tax_output: String,
    pub salary_payable: String,
    pub deductions_payable: String,
    pub sales: String,
    pub cost_of_goods_sold: String,
    pub purchases: String,
    pub stock_adjustment: String,
    pub salary_expense: String,
    /// Absorbs sub-cent residues; empty means every entry must balance exactly.
    pub rounding: String,
}

impl Default for ChartOfAccounts {
    fn default() -> Self {
        Self {
            cash: "1000".to_string(),
            bank: "1100".to_string(),
            receivables: "1200".to_string(),
            inventory: "1300".to_string(),
            tax_input: "1400".to_string(),
            payables: "2000".to_string(),
            tax_output: "2100".to_string(),
            salary_payable: "2200".to_string(),
            deductions_payable: "2300".to_string(),
            sales: "4000".to_string(),
            cost_of_goods_sold: "5000".to_string(),
            purchases: "5100".to_string(),
            stock_adjustment: "5200".to_string(),
            salary_expense: "6000".to_string(),
            rounding: "6900".to_string(),
        }
    }
}

impl ChartOfAccounts {
    pub fn rounding_account(&self) -> Option<&str> {
        let code = self.rounding.trim();
        if code.is_empty() { None } else { Some(code) }
    }

    /// Seed chart matching the default codes, plus owner's capital.
    pub fn standard_accounts(&self) -> Vec<Account> {
        let mut accounts = vec![
            Account::new(&self.cash, "Cash", AccountType::Asset),
            Account::new(&self.bank, "Bank", AccountType::Asset),
            Account::new(&self.receivables, "Accounts Receivable", AccountType::Asset),
            Account::new(&self.inventory, "Inventory", AccountType::Asset),
            Account::new(&self.tax_input, "Tax Input", AccountType::Asset),
            Account::new(&self.payables, "Accounts Payable", AccountType::Liability),
            Account::new(&self.tax_output, "Tax Output", AccountType::Liability),
            Account::new(&self.salary_payable, "Salary Payable", AccountType::Liability),
            Account::new(&self.deductions_payable, "Payroll Deductions Payable", AccountType::Liability),
            Account::new("3000", "Owner's Capital", AccountType::Equity),
            Account::new(&self.sales, "Sales Revenue", AccountType::Income),
            Account::new(&self.cost_of_goods_sold, "Cost of Goods Sold", AccountType::Expense),
            Account::new(&self.purchases, "Purchase Expense", AccountType::Expense),
            Account::new(&self.stock_adjustment, "Inventory Adjustments", AccountType::Expense),
            Account::new(&self.salary_expense, "Salary Expense", AccountType::Expense),
        ];
        if let Some(code) = self.rounding_account() {
            accounts.push(Account::new(code, "Rounding Differences", AccountType::Expense));
        }
        accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_accounts_have_unique_codes() {
        let accounts = ChartOfAccounts::default().standard_accounts();
        let mut codes: Vec<_> = accounts.iter().map(|a| a.code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), accounts.len());
    }

    #[test]
    fn blank_rounding_code_disables_rounding() {
        let chart = ChartOfAccounts {
            rounding: "  ".to_string(),
            ..ChartOfAccounts::default()
        };
        assert_eq!(chart.rounding_account(), None);
        assert!(chart.standard_accounts().iter().all(|a| a.name != "Rounding Differences"));
    }
}
