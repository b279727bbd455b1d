//! `booksmith-accounting`: double-entry ledger domain.
//!
//! Pure domain logic only (accounts, journal entries, voucher numbering rules,
//! event translators, report aggregation). No IO, no persistence concerns.

pub mod account;
pub mod chart;
pub mod documents;
pub mod error;
pub mod events;
pub mod journal;
pub mod reports;
pub mod translate;
pub mod voucher;

pub use account::{Account, AccountIndex, AccountType, Side};
pub use chart::ChartOfAccounts;
pub use documents::{
    BusinessEvent, DocumentStatus, Payment, PaymentDirection, PaymentMode, PaymentStatus,
    PayrollRun, PurchaseBill, SalesInvoice, StockAdjustment, StockDirection, TradeDocument,
};
pub use error::{LedgerError, LedgerResult};
pub use events::{JournalApproved, JournalRecorded, LedgerEvent};
pub use journal::{
    BalancePolicy, EntryStatus, JournalEntry, JournalLine, PostingLine, PostingRequest,
    PreparedEntry, prepare_entry, reversal_request,
};
pub use voucher::{
    IssuedNumber, SequenceDefaults, SequenceKey, SequenceSettings, VoucherSequence, VoucherType,
    format_voucher_number,
};
