//! Journal entries and the balance check every posting goes through.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booksmith_core::{AccountId, BALANCE_TOLERANCE, Entity, EntryId, UserId, round_currency};

use crate::account::{Account, Side};
use crate::error::{LedgerError, LedgerResult};

/// Journal entry lifecycle. Only drafts may become posted; nothing goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Posted,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Posted => "posted",
        }
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EntryStatus::Draft),
            "posted" => Ok(EntryStatus::Posted),
            other => Err(format!("unknown entry status: {other}")),
        }
    }
}

/// One single-sided posting inside an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub account_code: String,
    pub side: Side,
    /// Always positive, two decimal places.
    pub amount: Decimal,
    pub description: String,
}

impl JournalLine {
    pub fn debit(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => Decimal::ZERO,
        }
    }

    pub fn credit(&self) -> Decimal {
        match self.side {
            Side::Debit => Decimal::ZERO,
            Side::Credit => self.amount,
        }
    }
}

/// A persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub journal_number: String,
    pub entry_date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub status: EntryStatus,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub lines: Vec<JournalLine>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    /// Journal number of the entry this one reverses.
    pub reversal_of: Option<String>,
}

impl JournalEntry {
    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }
}

impl Entity for JournalEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A requested posting line, addressed by account code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    pub account_code: String,
    pub side: Side,
    pub amount: Decimal,
    pub description: String,
}

impl PostingLine {
    pub fn new(
        account_code: impl Into<String>,
        side: Side,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            side,
            amount,
            description: description.into(),
        }
    }

    pub fn debit(account_code: impl Into<String>, amount: Decimal, description: impl Into<String>) -> Self {
        Self::new(account_code, Side::Debit, amount, description)
    }

    pub fn credit(account_code: impl Into<String>, amount: Decimal, description: impl Into<String>) -> Self {
        Self::new(account_code, Side::Credit, amount, description)
    }
}

/// Input to the posting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRequest {
    pub entry_date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub lines: Vec<PostingLine>,
    pub author: UserId,
    #[serde(default)]
    pub reversal_of: Option<String>,
}

impl PostingRequest {
    pub fn new(
        entry_date: NaiveDate,
        reference: impl Into<String>,
        description: impl Into<String>,
        author: UserId,
    ) -> Self {
        Self {
            entry_date,
            reference: reference.into(),
            description: description.into(),
            lines: Vec::new(),
            author,
            reversal_of: None,
        }
    }

    pub fn line(mut self, line: PostingLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Distinct account codes referenced by the request, in first-seen order.
    pub fn account_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !codes.contains(&line.account_code.as_str()) {
                codes.push(&line.account_code);
            }
        }
        codes
    }
}

/// How the balance check treats residues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePolicy {
    pub tolerance: Decimal,
    /// Account that absorbs a non-zero residue within tolerance. `None` demands an
    /// exact balance.
    pub rounding_account_code: Option<String>,
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            tolerance: BALANCE_TOLERANCE,
            rounding_account_code: None,
        }
    }
}

/// Validated, account-resolved, balanced lines that have not been numbered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEntry {
    pub entry_date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub lines: Vec<JournalLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub created_by: UserId,
    pub reversal_of: Option<String>,
}

impl PreparedEntry {
    pub fn into_entry(
        self,
        journal_number: String,
        status: EntryStatus,
        created_at: DateTime<Utc>,
    ) -> JournalEntry {
        JournalEntry {
            id: EntryId::new(),
            journal_number,
            entry_date: self.entry_date,
            reference: self.reference,
            description: self.description,
            status,
            total_debit: self.total_debit,
            total_credit: self.total_credit,
            lines: self.lines,
            created_by: self.created_by,
            created_at,
            reversal_of: self.reversal_of,
        }
    }
}

/// Check a request's shape, before any account lookups.
pub fn validate_request(request: &PostingRequest) -> LedgerResult<()> {
    if request.lines.is_empty() {
        return Err(LedgerError::validation("journal entry must have lines"));
    }
    for (idx, line) in request.lines.iter().enumerate() {
        if round_currency(line.amount) <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "line {idx} ({}) amount must be positive, got {}",
                line.account_code, line.amount
            )));
        }
    }
    Ok(())
}

/// Debit and credit totals of a set of lines.
pub fn totals<'a>(lines: impl IntoIterator<Item = &'a JournalLine>) -> (Decimal, Decimal) {
    lines
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), line| {
            (d + line.debit(), c + line.credit())
        })
}

/// Resolve, round and balance-check a request.
///
/// `accounts` maps every code the request references (and the rounding account, when
/// the policy names one and the chart has it) to its stored record. A missing code is
/// `AccountNotFound`; a residue beyond tolerance is `Unbalanced`. Nothing here has
/// side effects, so a failure leaves no trace.
pub fn prepare_entry(
    request: &PostingRequest,
    accounts: &HashMap<String, Account>,
    policy: &BalancePolicy,
) -> LedgerResult<PreparedEntry> {
    validate_request(request)?;

    let mut lines = Vec::with_capacity(request.lines.len() + 1);
    for line in &request.lines {
        let account = accounts
            .get(&line.account_code)
            .ok_or_else(|| LedgerError::account_not_found(&line.account_code))?;
        lines.push(JournalLine {
            account_id: account.id,
            account_code: account.code.clone(),
            side: line.side,
            amount: round_currency(line.amount),
            description: line.description.clone(),
        });
    }

    let (total_debit, total_credit) = totals(&lines);
    let residue = total_debit - total_credit;
    if residue.abs() > policy.tolerance {
        return Err(LedgerError::Unbalanced {
            total_debit,
            total_credit,
        });
    }

    if !residue.is_zero() {
        // Without a rounding account there is nowhere to book the residue.
        let Some(code) = &policy.rounding_account_code else {
            return Err(LedgerError::Unbalanced {
                total_debit,
                total_credit,
            });
        };
        let account = accounts
            .get(code)
            .ok_or_else(|| LedgerError::account_not_found(code))?;
        lines.push(JournalLine {
            account_id: account.id,
            account_code: account.code.clone(),
            side: if residue > Decimal::ZERO { Side::Credit } else { Side::Debit },
            amount: residue.abs(),
            description: "Rounding difference".to_string(),
        });
    }

    let (total_debit, total_credit) = totals(&lines);
    Ok(PreparedEntry {
        entry_date: request.entry_date,
        reference: request.reference.clone(),
        description: request.description.clone(),
        lines,
        total_debit,
        total_credit,
        created_by: request.author,
        reversal_of: request.reversal_of.clone(),
    })
}

/// Build the request that undoes `original`: same accounts and amounts, sides swapped.
pub fn reversal_request(
    original: &JournalEntry,
    reversal_date: NaiveDate,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    if original.reversal_of.is_some() {
        return Err(LedgerError::invalid_state(format!(
            "{} is itself a reversal",
            original.journal_number
        )));
    }
    if reversal_date < original.entry_date {
        return Err(LedgerError::validation(format!(
            "reversal date {reversal_date} precedes entry date {}",
            original.entry_date
        )));
    }

    let mut request = PostingRequest::new(
        reversal_date,
        format!("REV/{}", original.journal_number),
        format!("Reversal of {}: {}", original.journal_number, original.description),
        author,
    );
    request.reversal_of = Some(original.journal_number.clone());
    for line in &original.lines {
        request.lines.push(PostingLine::new(
            line.account_code.clone(),
            line.side.opposite(),
            line.amount,
            line.description.clone(),
        ));
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn chart() -> HashMap<String, Account> {
        [
            Account::new("1000", "Cash", AccountType::Asset),
            Account::new("2000", "Accounts Payable", AccountType::Liability),
            Account::new("4000", "Sales", AccountType::Income),
            Account::new("6900", "Rounding", AccountType::Expense),
        ]
        .into_iter()
        .map(|a| (a.code.clone(), a))
        .collect()
    }

    fn request(lines: Vec<PostingLine>) -> PostingRequest {
        let mut req = PostingRequest::new(day(), "REF-1", "test", UserId::new());
        req.lines = lines;
        req
    }

    fn rounding_policy() -> BalancePolicy {
        BalancePolicy {
            tolerance: BALANCE_TOLERANCE,
            rounding_account_code: Some("6900".to_string()),
        }
    }

    #[test]
    fn balanced_request_is_prepared_with_totals() {
        let req = request(vec![
            PostingLine::debit("1000", dec!(100), "cash in"),
            PostingLine::credit("4000", dec!(100), "sale"),
        ]);
        let prepared = prepare_entry(&req, &chart(), &BalancePolicy::default()).unwrap();
        assert_eq!(prepared.total_debit, dec!(100));
        assert_eq!(prepared.total_credit, dec!(100));
        assert_eq!(prepared.lines.len(), 2);
    }

    #[test]
    fn unbalanced_request_reports_both_totals() {
        let req = request(vec![
            PostingLine::debit("1000", dec!(100), ""),
            PostingLine::credit("4000", dec!(90), ""),
        ]);
        let err = prepare_entry(&req, &chart(), &BalancePolicy::default()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unbalanced {
                total_debit: dec!(100),
                total_credit: dec!(90)
            }
        );
    }

    #[test]
    fn unknown_code_is_account_not_found() {
        let req = request(vec![PostingLine::debit("9999", dec!(10), "")]);
        let err = prepare_entry(&req, &chart(), &BalancePolicy::default()).unwrap_err();
        assert_eq!(err, LedgerError::account_not_found("9999"));
    }

    #[test]
    fn empty_and_non_positive_lines_are_rejected() {
        let empty = request(vec![]);
        assert!(matches!(
            prepare_entry(&empty, &chart(), &BalancePolicy::default()),
            Err(LedgerError::Validation(_))
        ));

        let negative = request(vec![
            PostingLine::debit("1000", dec!(-5), ""),
            PostingLine::credit("4000", dec!(-5), ""),
        ]);
        assert!(matches!(
            prepare_entry(&negative, &chart(), &BalancePolicy::default()),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn residue_within_tolerance_goes_to_rounding_account() {
        let req = request(vec![
            PostingLine::debit("1000", dec!(100.00), ""),
            PostingLine::credit("4000", dec!(99.99), ""),
        ]);
        let prepared = prepare_entry(&req, &chart(), &rounding_policy()).unwrap();
        assert_eq!(prepared.total_debit, prepared.total_credit);
        let rounding = prepared.lines.last().unwrap();
        assert_eq!(rounding.account_code, "6900");
        assert_eq!(rounding.side, Side::Credit);
        assert_eq!(rounding.amount, dec!(0.01));
    }

    #[test]
    fn residue_without_rounding_account_is_unbalanced() {
        let req = request(vec![
            PostingLine::debit("1000", dec!(100.00), ""),
            PostingLine::credit("4000", dec!(99.99), ""),
        ]);
        let err = prepare_entry(&req, &chart(), &BalancePolicy::default()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unbalanced {
                total_debit: dec!(100.00),
                total_credit: dec!(99.99)
            }
        );
    }

    #[test]
    fn reversal_swaps_sides_and_links_back() {
        let req = request(vec![
            PostingLine::debit("1000", dec!(50), ""),
            PostingLine::credit("4000", dec!(50), ""),
        ]);
        let entry = prepare_entry(&req, &chart(), &BalancePolicy::default())
            .unwrap()
            .into_entry("JV/2025-26/0001".to_string(), EntryStatus::Posted, Utc::now());

        let rev = reversal_request(&entry, day(), UserId::new()).unwrap();
        assert_eq!(rev.reversal_of.as_deref(), Some("JV/2025-26/0001"));
        assert_eq!(rev.lines[0].side, Side::Credit);
        assert_eq!(rev.lines[1].side, Side::Debit);

        let rev_entry = prepare_entry(&rev, &chart(), &BalancePolicy::default())
            .unwrap()
            .into_entry("JV/2025-26/0002".to_string(), EntryStatus::Draft, Utc::now());
        assert!(matches!(
            reversal_request(&rev_entry, day(), UserId::new()),
            Err(LedgerError::InvalidState(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Any accepted entry balances exactly once a rounding account is configured.
        #[test]
        fn prepared_entries_balance_exactly(
            cents in prop::collection::vec(100i64..10_000_000i64, 1..6),
            nudge in -1i64..=1i64,
        ) {
            let mut lines: Vec<PostingLine> = cents
                .iter()
                .map(|c| PostingLine::credit("4000", Decimal::new(*c, 2), ""))
                .collect();
            let total: i64 = cents.iter().sum();
            lines.push(PostingLine::debit("1000", Decimal::new(total + nudge, 2), ""));

            let prepared = prepare_entry(&request(lines), &chart(), &rounding_policy()).unwrap();
            let (d, c) = totals(&prepared.lines);
            prop_assert_eq!(d, c);
            prop_assert_eq!(prepared.total_debit, d);
        }
    }
}
