use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::documents::TradeDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl BucketKind {
    /// `current` for anything not yet overdue, `over90` strictly beyond 90 days.
    pub fn classify(days_overdue: i64) -> Self {
        match days_overdue {
            i64::MIN..=0 => BucketKind::Current,
            1..=30 => BucketKind::Days1To30,
            31..=60 => BucketKind::Days31To60,
            61..=90 => BucketKind::Days61To90,
            _ => BucketKind::Over90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgingBucket {
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgingBuckets {
    pub current: AgingBucket,
    pub days_1_to_30: AgingBucket,
    pub days_31_to_60: AgingBucket,
    pub days_61_to_90: AgingBucket,
    pub over_90: AgingBucket,
}

impl AgingBuckets {
    pub fn get(&self, kind: BucketKind) -> &AgingBucket {
        match kind {
            BucketKind::Current => &self.current,
            BucketKind::Days1To30 => &self.days_1_to_30,
            BucketKind::Days31To60 => &self.days_31_to_60,
            BucketKind::Days61To90 => &self.days_61_to_90,
            BucketKind::Over90 => &self.over_90,
        }
    }

    fn get_mut(&mut self, kind: BucketKind) -> &mut AgingBucket {
        match kind {
            BucketKind::Current => &mut self.current,
            BucketKind::Days1To30 => &mut self.days_1_to_30,
            BucketKind::Days31To60 => &mut self.days_31_to_60,
            BucketKind::Days61To90 => &mut self.days_61_to_90,
            BucketKind::Over90 => &mut self.over_90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingOptions {
    /// Also count outstanding documents that are not yet due (in `current`).
    pub include_not_yet_due: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingLine {
    pub number: String,
    pub party: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub outstanding: Decimal,
    pub bucket: BucketKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub buckets: AgingBuckets,
    /// Oldest first.
    pub lines: Vec<AgingLine>,
    pub total_outstanding: Decimal,
}

/// Bucket outstanding (unpaid or partially paid) documents by days past due.
///
/// The same routine serves receivables (invoices) and payables (bills).
pub fn aging_report<D: TradeDocument>(
    documents: &[D],
    as_of: NaiveDate,
    options: AgingOptions,
) -> AgingReport {
    let mut buckets = AgingBuckets::default();
    let mut lines = Vec::new();

    for doc in documents.iter().filter(|d| d.status().is_outstanding()) {
        if doc.due_date() > as_of && !options.include_not_yet_due {
            continue;
        }
        let days_overdue = (as_of - doc.due_date()).num_days();
        let bucket = BucketKind::classify(days_overdue);
        let outstanding = doc.outstanding();

        let slot = buckets.get_mut(bucket);
        slot.count += 1;
        slot.amount += outstanding;

        lines.push(AgingLine {
            number: doc.number().to_string(),
            party: doc.party().to_string(),
            due_date: doc.due_date(),
            days_overdue,
            outstanding,
            bucket,
        });
    }
    lines.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue).then_with(|| a.number.cmp(&b.number)));

    let total_outstanding = [
        buckets.current,
        buckets.days_1_to_30,
        buckets.days_31_to_60,
        buckets.days_61_to_90,
        buckets.over_90,
    ]
    .iter()
    .map(|b| b.amount)
    .sum();

    AgingReport {
        as_of,
        buckets,
        lines,
        total_outstanding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentStatus, SalesInvoice};
    use crate::reports::fixtures::date;
    use booksmith_core::DocumentId;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn due(as_of: NaiveDate, days_ago: i64, total: Decimal, paid: Decimal, status: DocumentStatus) -> SalesInvoice {
        let due_date = if days_ago >= 0 {
            as_of - Days::new(days_ago as u64)
        } else {
            as_of + Days::new(days_ago.unsigned_abs())
        };
        SalesInvoice {
            id: DocumentId::new(),
            number: format!("INV-{days_ago}"),
            party: "Acme".into(),
            issue_date: due_date,
            due_date,
            subtotal: total,
            tax: Decimal::ZERO,
            total,
            amount_paid: paid,
            status,
        }
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(BucketKind::classify(0), BucketKind::Current);
        assert_eq!(BucketKind::classify(1), BucketKind::Days1To30);
        assert_eq!(BucketKind::classify(30), BucketKind::Days1To30);
        assert_eq!(BucketKind::classify(31), BucketKind::Days31To60);
        assert_eq!(BucketKind::classify(60), BucketKind::Days31To60);
        assert_eq!(BucketKind::classify(61), BucketKind::Days61To90);
        assert_eq!(BucketKind::classify(90), BucketKind::Days61To90);
        assert_eq!(BucketKind::classify(91), BucketKind::Over90);
    }

    #[test]
    fn documents_land_in_their_buckets() {
        let as_of = date(2025, 9, 30);
        let docs = vec![
            due(as_of, 0, dec!(100), Decimal::ZERO, DocumentStatus::Unpaid),
            due(as_of, 30, dec!(200), Decimal::ZERO, DocumentStatus::Unpaid),
            due(as_of, 31, dec!(300), dec!(100), DocumentStatus::PartiallyPaid),
            due(as_of, 120, dec!(400), Decimal::ZERO, DocumentStatus::Unpaid),
            due(as_of, 45, dec!(999), dec!(999), DocumentStatus::Paid),
            due(as_of, -5, dec!(50), Decimal::ZERO, DocumentStatus::Unpaid),
        ];
        let report = aging_report(&docs, as_of, AgingOptions::default());

        assert_eq!(report.buckets.current, AgingBucket { count: 1, amount: dec!(100) });
        assert_eq!(report.buckets.days_1_to_30, AgingBucket { count: 1, amount: dec!(200) });
        assert_eq!(report.buckets.days_31_to_60, AgingBucket { count: 1, amount: dec!(200) });
        assert_eq!(report.buckets.days_61_to_90, AgingBucket::default());
        assert_eq!(report.buckets.over_90, AgingBucket { count: 1, amount: dec!(400) });
        assert_eq!(report.total_outstanding, dec!(900));
        assert_eq!(report.lines[0].days_overdue, 120);
    }

    #[test]
    fn not_yet_due_documents_are_optional() {
        let as_of = date(2025, 9, 30);
        let docs = vec![due(as_of, -5, dec!(50), Decimal::ZERO, DocumentStatus::Unpaid)];

        let strict = aging_report(&docs, as_of, AgingOptions::default());
        assert_eq!(strict.total_outstanding, Decimal::ZERO);

        let wide = aging_report(&docs, as_of, AgingOptions { include_not_yet_due: true });
        assert_eq!(wide.buckets.current, AgingBucket { count: 1, amount: dec!(50) });
        assert_eq!(wide.lines[0].days_overdue, -5);
    }
}
