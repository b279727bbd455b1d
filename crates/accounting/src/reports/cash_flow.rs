use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::documents::{Payment, PaymentDirection, PaymentStatus};
use crate::error::LedgerResult;

use super::ensure_window;

/// Operating cash movement over a period. No investing/financing split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub receipts: usize,
    pub payments: usize,
}

pub fn cash_flow(payments: &[Payment], start: NaiveDate, end: NaiveDate) -> LedgerResult<CashFlow> {
    ensure_window(start, end)?;

    let mut flow = CashFlow {
        start,
        end,
        inflow: Decimal::ZERO,
        outflow: Decimal::ZERO,
        net: Decimal::ZERO,
        receipts: 0,
        payments: 0,
    };
    for p in payments
        .iter()
        .filter(|p| p.status != PaymentStatus::Void && (start..=end).contains(&p.date))
    {
        match p.direction {
            PaymentDirection::Received => {
                flow.inflow += p.amount;
                flow.receipts += 1;
            }
            PaymentDirection::Made => {
                flow.outflow += p.amount;
                flow.payments += 1;
            }
        }
    }
    flow.net = flow.inflow - flow.outflow;
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::PaymentMode;
    use crate::reports::fixtures::date;
    use booksmith_core::DocumentId;
    use rust_decimal_macros::dec;

    fn payment(day: NaiveDate, amount: Decimal, direction: PaymentDirection, status: PaymentStatus) -> Payment {
        Payment {
            id: DocumentId::new(),
            number: format!("P-{day}"),
            date: day,
            party: "X".into(),
            amount,
            mode: PaymentMode::BankTransfer,
            direction,
            status,
            reference: None,
        }
    }

    #[test]
    fn sums_non_void_payments_in_window() {
        let payments = vec![
            payment(date(2025, 4, 1), dec!(1000), PaymentDirection::Received, PaymentStatus::Completed),
            payment(date(2025, 4, 2), dec!(250), PaymentDirection::Received, PaymentStatus::Pending),
            payment(date(2025, 4, 3), dec!(400), PaymentDirection::Made, PaymentStatus::Completed),
            payment(date(2025, 4, 4), dec!(900), PaymentDirection::Made, PaymentStatus::Void),
            payment(date(2025, 5, 1), dec!(77), PaymentDirection::Received, PaymentStatus::Completed),
        ];
        let flow = cash_flow(&payments, date(2025, 4, 1), date(2025, 4, 30)).unwrap();
        assert_eq!(flow.inflow, dec!(1250));
        assert_eq!(flow.outflow, dec!(400));
        assert_eq!(flow.net, dec!(850));
        assert_eq!((flow.receipts, flow.payments), (2, 1));
    }
}
