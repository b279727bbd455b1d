use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::documents::{PurchaseBill, SalesInvoice, TradeDocument};
use crate::error::LedgerResult;

use super::ensure_window;

/// Tax collected (sales) or paid (purchases) over a period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxSide {
    /// Sum of pre-tax subtotals.
    pub taxable: Decimal,
    pub tax: Decimal,
    pub documents: usize,
}

impl TaxSide {
    fn collect<'a, D: TradeDocument + 'a>(
        docs: impl IntoIterator<Item = &'a D>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        docs.into_iter()
            .filter(|d| d.status().is_finalized())
            .filter(|d| (start..=end).contains(&d.document_date()))
            .fold(TaxSide::default(), |mut side, d| {
                side.taxable += d.subtotal();
                side.tax += d.tax();
                side.documents += 1;
                side
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub output: TaxSide,
    pub input: TaxSide,
    /// `output.tax - input.tax`.
    pub net_payable: Decimal,
    pub is_refund: bool,
}

/// Output tax from finalized invoices minus input tax from finalized bills, by
/// document date. Reads documents, not the journal.
pub fn tax_summary(
    invoices: &[SalesInvoice],
    bills: &[PurchaseBill],
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerResult<TaxSummary> {
    ensure_window(start, end)?;
    let output = TaxSide::collect(invoices, start, end);
    let input = TaxSide::collect(bills, start, end);
    let net_payable = output.tax - input.tax;

    Ok(TaxSummary {
        start,
        end,
        output,
        input,
        net_payable,
        is_refund: net_payable < Decimal::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentStatus;
    use crate::reports::fixtures::date;
    use booksmith_core::DocumentId;
    use rust_decimal_macros::dec;

    fn invoice(day: NaiveDate, subtotal: Decimal, tax: Decimal, status: DocumentStatus) -> SalesInvoice {
        SalesInvoice {
            id: DocumentId::new(),
            number: format!("INV-{day}"),
            party: "Acme".into(),
            issue_date: day,
            due_date: day,
            subtotal,
            tax,
            total: subtotal + tax,
            amount_paid: Decimal::ZERO,
            status,
        }
    }

    fn bill(day: NaiveDate, subtotal: Decimal, tax: Decimal) -> PurchaseBill {
        PurchaseBill {
            id: DocumentId::new(),
            number: format!("BILL-{day}"),
            party: "Supplier".into(),
            bill_date: day,
            due_date: day,
            subtotal,
            tax,
            total: subtotal + tax,
            amount_paid: Decimal::ZERO,
            status: DocumentStatus::Paid,
        }
    }

    #[test]
    fn nets_output_against_input() {
        let invoices = vec![
            invoice(date(2025, 4, 2), dec!(1000), dec!(180), DocumentStatus::Unpaid),
            invoice(date(2025, 4, 3), dec!(500), dec!(90), DocumentStatus::Paid),
            invoice(date(2025, 4, 4), dec!(999), dec!(99), DocumentStatus::Draft),
            invoice(date(2025, 4, 5), dec!(999), dec!(99), DocumentStatus::Void),
            invoice(date(2025, 5, 1), dec!(999), dec!(99), DocumentStatus::Unpaid),
        ];
        let bills = vec![bill(date(2025, 4, 10), dec!(400), dec!(72))];
        let summary = tax_summary(&invoices, &bills, date(2025, 4, 1), date(2025, 4, 30)).unwrap();

        assert_eq!(summary.output.tax, dec!(270));
        assert_eq!(summary.output.taxable, dec!(1500));
        assert_eq!(summary.output.documents, 2);
        assert_eq!(summary.input.tax, dec!(72));
        assert_eq!(summary.net_payable, dec!(198));
        assert!(!summary.is_refund);
    }

    #[test]
    fn excess_input_is_a_refund() {
        let bills = vec![bill(date(2025, 4, 10), dec!(400), dec!(72))];
        let summary = tax_summary(&[], &bills, date(2025, 4, 1), date(2025, 4, 30)).unwrap();
        assert_eq!(summary.net_payable, dec!(-72));
        assert!(summary.is_refund);
    }
}
