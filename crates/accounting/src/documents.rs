//! Finalized business documents handed to the ledger by collaborators.
//!
//! The ledger never creates or edits these; it reads them to build postings and
//! the document-based reports (tax summary, aging, cash flow).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booksmith_core::DocumentId;

/// Lifecycle of an invoice or bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Unpaid,
    PartiallyPaid,
    Paid,
    Void,
}

impl DocumentStatus {
    /// Issued and still counting (not a draft, not voided).
    pub fn is_finalized(self) -> bool {
        !matches!(self, DocumentStatus::Draft | DocumentStatus::Void)
    }

    /// Money is still owed on it.
    pub fn is_outstanding(self) -> bool {
        matches!(self, DocumentStatus::Unpaid | DocumentStatus::PartiallyPaid)
    }
}

/// Customer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesInvoice {
    pub id: DocumentId,
    pub number: String,
    pub party: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub status: DocumentStatus,
}

/// Vendor bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseBill {
    pub id: DocumentId,
    pub number: String,
    pub party: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub status: DocumentStatus,
}

/// Common view of invoices and bills used by the tax and aging reports.
pub trait TradeDocument {
    fn number(&self) -> &str;
    fn party(&self) -> &str;
    fn document_date(&self) -> NaiveDate;
    fn due_date(&self) -> NaiveDate;
    fn subtotal(&self) -> Decimal;
    fn tax(&self) -> Decimal;
    fn total(&self) -> Decimal;
    fn amount_paid(&self) -> Decimal;
    fn status(&self) -> DocumentStatus;

    fn outstanding(&self) -> Decimal {
        (self.total() - self.amount_paid()).max(Decimal::ZERO)
    }
}

macro_rules! impl_trade_document {
    ($t:ty, $date:ident) => {
        impl TradeDocument for $t {
            fn number(&self) -> &str {
                &self.number
            }
            fn party(&self) -> &str {
                &self.party
            }
            fn document_date(&self) -> NaiveDate {
                self.$date
            }
            fn due_date(&self) -> NaiveDate {
                self.due_date
            }
            fn subtotal(&self) -> Decimal {
                self.subtotal
            }
            fn tax(&self) -> Decimal {
                self.tax
            }
            fn total(&self) -> Decimal {
                self.total
            }
            fn amount_paid(&self) -> Decimal {
                self.amount_paid
            }
            fn status(&self) -> DocumentStatus {
                self.status
            }
        }
    };
}

impl_trade_document!(SalesInvoice, issue_date);
impl_trade_document!(PurchaseBill, bill_date);

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    BankTransfer,
    Cheque,
    Card,
    Upi,
}

impl PaymentMode {
    /// Cash payments hit the cash account; every other mode goes through the bank.
    pub fn is_cash(self) -> bool {
        matches!(self, PaymentMode::Cash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    Received,
    Made,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Void,
}

/// A receipt from a customer or a payment to a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: DocumentId,
    pub number: String,
    pub date: NaiveDate,
    pub party: String,
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub direction: PaymentDirection,
    pub status: PaymentStatus,
    /// Invoice/bill number the payment settles, if any.
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    Increase,
    Decrease,
}

/// Valued stock correction (count differences, write-offs, found stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: DocumentId,
    pub date: NaiveDate,
    pub reference: String,
    pub direction: StockDirection,
    pub value: Decimal,
    pub reason: String,
}

/// A completed payroll run. `gross_total - net_total` is withheld deductions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    pub id: DocumentId,
    pub period_end: NaiveDate,
    pub reference: String,
    pub gross_total: Decimal,
    pub net_total: Decimal,
}

/// Any business event that produces a ledger posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusinessEvent {
    InvoiceIssued(SalesInvoice),
    BillPosted(PurchaseBill),
    PaymentReceived(Payment),
    PaymentMade(Payment),
    StockAdjusted(StockAdjustment),
    PayrollRun(PayrollRun),
}

impl BusinessEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            BusinessEvent::InvoiceIssued(_) => "invoice_issued",
            BusinessEvent::BillPosted(_) => "bill_posted",
            BusinessEvent::PaymentReceived(_) => "payment_received",
            BusinessEvent::PaymentMade(_) => "payment_made",
            BusinessEvent::StockAdjusted(_) => "stock_adjusted",
            BusinessEvent::PayrollRun(_) => "payroll_run",
        }
    }

    /// Document number or reference, for logs and outbox listings.
    pub fn reference(&self) -> &str {
        match self {
            BusinessEvent::InvoiceIssued(d) => &d.number,
            BusinessEvent::BillPosted(d) => &d.number,
            BusinessEvent::PaymentReceived(p) | BusinessEvent::PaymentMade(p) => &p.number,
            BusinessEvent::StockAdjusted(s) => &s.reference,
            BusinessEvent::PayrollRun(r) => &r.reference,
        }
    }
}
