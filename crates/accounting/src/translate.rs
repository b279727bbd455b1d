//! Business event -> posting request.
//!
//! Each translator is a pure mapping from a finalized document to balanced lines,
//! using the account roles of the injected [`ChartOfAccounts`]. Balance and account
//! checks happen later, in the posting engine.

use rust_decimal::Decimal;

use booksmith_core::UserId;

use crate::chart::ChartOfAccounts;
use crate::documents::{
    BusinessEvent, Payment, PaymentDirection, PaymentStatus, PayrollRun, PurchaseBill,
    SalesInvoice, StockAdjustment, StockDirection, TradeDocument,
};
use crate::error::{LedgerError, LedgerResult};
use crate::journal::{PostingLine, PostingRequest};

fn ensure_finalized<D: TradeDocument>(doc: &D, what: &str) -> LedgerResult<()> {
    if doc.status().is_finalized() {
        Ok(())
    } else {
        Err(LedgerError::validation(format!(
            "{what} {} is {:?}; only finalized documents are posted",
            doc.number(),
            doc.status()
        )))
    }
}

fn ensure_positive(amount: Decimal, what: &str, number: &str) -> LedgerResult<()> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(LedgerError::validation(format!(
            "{what} {number} has non-positive amount {amount}"
        )))
    }
}

/// Appends a line only when it carries an amount.
fn with_line(request: PostingRequest, line: PostingLine) -> PostingRequest {
    if line.amount > Decimal::ZERO {
        request.line(line)
    } else {
        request
    }
}

fn settlement_account<'a>(chart: &'a ChartOfAccounts, payment: &Payment) -> &'a str {
    if payment.mode.is_cash() {
        &chart.cash
    } else {
        &chart.bank
    }
}

fn ensure_payment(payment: &Payment, expected: PaymentDirection) -> LedgerResult<()> {
    if payment.direction != expected {
        return Err(LedgerError::validation(format!(
            "payment {} has direction {:?}, expected {:?}",
            payment.number, payment.direction, expected
        )));
    }
    if payment.status == PaymentStatus::Void {
        return Err(LedgerError::validation(format!(
            "payment {} is void",
            payment.number
        )));
    }
    ensure_positive(payment.amount, "payment", &payment.number)
}

/// Invoice issued: Dr receivables (total); Cr sales (subtotal), Cr tax output (tax).
/// Zero-amount credits are left out.
pub fn invoice_issued(
    chart: &ChartOfAccounts,
    invoice: &SalesInvoice,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    ensure_finalized(invoice, "invoice")?;
    ensure_positive(invoice.total, "invoice", &invoice.number)?;
    let narration = format!("Invoice {} to {}", invoice.number, invoice.party);

    let request = PostingRequest::new(invoice.issue_date, &invoice.number, &narration, author)
        .line(PostingLine::debit(&chart.receivables, invoice.total, &narration));
    let request = with_line(request, PostingLine::credit(&chart.sales, invoice.subtotal, "Sales"));
    Ok(with_line(
        request,
        PostingLine::credit(&chart.tax_output, invoice.tax, "Output tax"),
    ))
}

/// Bill posted: Dr purchases (subtotal), Dr tax input (tax); Cr payables (total).
/// Zero-amount debits are left out.
pub fn bill_posted(
    chart: &ChartOfAccounts,
    bill: &PurchaseBill,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    ensure_finalized(bill, "bill")?;
    ensure_positive(bill.total, "bill", &bill.number)?;
    let narration = format!("Bill {} from {}", bill.number, bill.party);

    let request = PostingRequest::new(bill.bill_date, &bill.number, &narration, author);
    let request = with_line(request, PostingLine::debit(&chart.purchases, bill.subtotal, "Purchases"));
    let request = with_line(request, PostingLine::debit(&chart.tax_input, bill.tax, "Input tax"));
    Ok(request.line(PostingLine::credit(&chart.payables, bill.total, &narration)))
}

/// Payment received: Dr cash or bank; Cr receivables.
pub fn payment_received(
    chart: &ChartOfAccounts,
    payment: &Payment,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    ensure_payment(payment, PaymentDirection::Received)?;
    let narration = format!("Receipt {} from {}", payment.number, payment.party);

    Ok(
        PostingRequest::new(payment.date, &payment.number, &narration, author)
            .line(PostingLine::debit(
                settlement_account(chart, payment),
                payment.amount,
                &narration,
            ))
            .line(PostingLine::credit(&chart.receivables, payment.amount, &narration)),
    )
}

/// Payment made: Dr payables; Cr cash or bank.
pub fn payment_made(
    chart: &ChartOfAccounts,
    payment: &Payment,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    ensure_payment(payment, PaymentDirection::Made)?;
    let narration = format!("Payment {} to {}", payment.number, payment.party);

    Ok(
        PostingRequest::new(payment.date, &payment.number, &narration, author)
            .line(PostingLine::debit(&chart.payables, payment.amount, &narration))
            .line(PostingLine::credit(
                settlement_account(chart, payment),
                payment.amount,
                &narration,
            )),
    )
}

/// Stock increase: Dr inventory; Cr adjustment. Decrease is the mirror image.
pub fn stock_adjusted(
    chart: &ChartOfAccounts,
    adjustment: &StockAdjustment,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    ensure_positive(adjustment.value, "stock adjustment", &adjustment.reference)?;
    let narration = format!("Stock adjustment {}: {}", adjustment.reference, adjustment.reason);
    let (debit, credit) = match adjustment.direction {
        StockDirection::Increase => (&chart.inventory, &chart.stock_adjustment),
        StockDirection::Decrease => (&chart.stock_adjustment, &chart.inventory),
    };

    Ok(
        PostingRequest::new(adjustment.date, &adjustment.reference, &narration, author)
            .line(PostingLine::debit(debit, adjustment.value, &narration))
            .line(PostingLine::credit(credit, adjustment.value, &narration)),
    )
}

/// Payroll: Dr salary expense (gross); Cr salary payable (net), Cr deductions payable
/// (gross - net). A fully withheld run has no salary payable line.
pub fn payroll_run(
    chart: &ChartOfAccounts,
    run: &PayrollRun,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    ensure_positive(run.gross_total, "payroll", &run.reference)?;
    if run.net_total < Decimal::ZERO || run.net_total > run.gross_total {
        return Err(LedgerError::validation(format!(
            "payroll {} net {} is outside 0..={}",
            run.reference, run.net_total, run.gross_total
        )));
    }
    let narration = format!("Payroll {}", run.reference);
    let deductions = run.gross_total - run.net_total;

    let request = PostingRequest::new(run.period_end, &run.reference, &narration, author)
        .line(PostingLine::debit(&chart.salary_expense, run.gross_total, "Gross salaries"));
    let request = with_line(
        request,
        PostingLine::credit(&chart.salary_payable, run.net_total, "Net salaries payable"),
    );
    Ok(with_line(
        request,
        PostingLine::credit(&chart.deductions_payable, deductions, "Payroll deductions withheld"),
    ))
}

/// Route any business event to its translator.
pub fn translate(
    chart: &ChartOfAccounts,
    event: &BusinessEvent,
    author: UserId,
) -> LedgerResult<PostingRequest> {
    match event {
        BusinessEvent::InvoiceIssued(invoice) => invoice_issued(chart, invoice, author),
        BusinessEvent::BillPosted(bill) => bill_posted(chart, bill, author),
        BusinessEvent::PaymentReceived(payment) => payment_received(chart, payment, author),
        BusinessEvent::PaymentMade(payment) => payment_made(chart, payment, author),
        BusinessEvent::StockAdjusted(adjustment) => stock_adjusted(chart, adjustment, author),
        BusinessEvent::PayrollRun(run) => payroll_run(chart, run, author),
    }
}
