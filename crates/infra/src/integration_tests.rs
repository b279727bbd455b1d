//! End-to-end tests across the engine, stores and reporting service.
//!
//! Business event → translator → posting engine → journal store → reports.
//!
//! Verifies:
//! - Translated postings land with the expected lines and numbers
//! - Concurrent posting never duplicates or skips a journal number
//! - Rejected postings leave no trace
//! - Reports agree with what was posted

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use booksmith_accounting::reports::AgingOptions;
    use booksmith_accounting::{
        BusinessEvent, DocumentStatus, EntryStatus, LedgerError, Payment, PaymentDirection,
        PaymentMode, PaymentStatus, PostingLine, PostingRequest, PurchaseBill, SalesInvoice,
        Side, VoucherType,
    };
    use booksmith_core::{DocumentId, FiscalYear, UserId};

    use crate::documents::InMemoryDocumentSource;
    use crate::engine::{EngineSettings, InMemoryLedgerEngine};
    use crate::journal::{InMemoryJournalStore, JournalQuery};
    use crate::registry::InMemoryAccountRegistry;
    use crate::reporting::ReportingService;

    type Reports = ReportingService<
        Arc<InMemoryAccountRegistry>,
        Arc<InMemoryJournalStore>,
        Arc<InMemoryDocumentSource>,
    >;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(settings: EngineSettings) -> (Arc<InMemoryLedgerEngine>, Reports, Arc<InMemoryDocumentSource>) {
        let engine = Arc::new(InMemoryLedgerEngine::in_memory(settings));
        let documents = Arc::new(InMemoryDocumentSource::new());
        let reports = ReportingService::new(
            engine.registry().clone(),
            engine.journal().clone(),
            documents.clone(),
        );
        (engine, reports, documents)
    }

    fn invoice(number: &str, issued: NaiveDate, due: NaiveDate, subtotal: Decimal, tax: Decimal) -> SalesInvoice {
        SalesInvoice {
            id: DocumentId::new(),
            number: number.to_string(),
            party: "Acme Traders".to_string(),
            issue_date: issued,
            due_date: due,
            subtotal,
            tax,
            total: subtotal + tax,
            amount_paid: Decimal::ZERO,
            status: DocumentStatus::Unpaid,
        }
    }

    fn bill(number: &str, dated: NaiveDate, subtotal: Decimal, tax: Decimal) -> PurchaseBill {
        PurchaseBill {
            id: DocumentId::new(),
            number: number.to_string(),
            party: "Steel Supply Co".to_string(),
            bill_date: dated,
            due_date: dated,
            subtotal,
            tax,
            total: subtotal + tax,
            amount_paid: Decimal::ZERO,
            status: DocumentStatus::Unpaid,
        }
    }

    fn receipt(number: &str, dated: NaiveDate, amount: Decimal, mode: PaymentMode) -> Payment {
        Payment {
            id: DocumentId::new(),
            number: number.to_string(),
            date: dated,
            party: "Acme Traders".to_string(),
            amount,
            mode,
            direction: PaymentDirection::Received,
            status: PaymentStatus::Completed,
            reference: None,
        }
    }

    #[tokio::test]
    async fn invoice_flows_through_to_profit_and_loss() {
        crate::config::LedgerConfig::default().init_logging();
        let (engine, reports, _) = setup(EngineSettings::default());
        let author = UserId::new();
        let inv = invoice("INV/2025-26/0001", date(2025, 6, 10), date(2025, 7, 10), dec!(1000), dec!(180));

        let entry = engine.post_invoice(&inv, author).await.unwrap();
        assert_eq!(entry.journal_number, "JV/2025-26/0001");
        assert_eq!(entry.status, EntryStatus::Draft);
        let lines: Vec<_> = entry
            .lines
            .iter()
            .map(|l| (l.account_code.as_str(), l.side, l.amount))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("1200", Side::Debit, dec!(1180)),
                ("4000", Side::Credit, dec!(1000)),
                ("2100", Side::Credit, dec!(180)),
            ]
        );

        // drafts stay out of reports until approved
        let pnl = reports.profit_and_loss(date(2025, 4, 1), date(2026, 3, 31)).await.unwrap();
        assert_eq!(pnl.income.total, Decimal::ZERO);

        engine.approve(&entry.journal_number).await.unwrap();
        let pnl = reports.profit_and_loss(date(2025, 4, 1), date(2026, 3, 31)).await.unwrap();
        assert_eq!(pnl.income.total, dec!(1000));
        assert_eq!(pnl.net_profit, dec!(1000));
        assert_eq!(pnl.net_profit_margin, dec!(100));

        let trial = reports.trial_balance(date(2026, 3, 31)).await.unwrap();
        assert!(trial.is_balanced());
        assert_eq!(trial.totals.debit, dec!(1180));

        let sheet = reports.balance_sheet(date(2026, 3, 31)).await.unwrap();
        assert!(sheet.is_balanced);
        assert_eq!(sheet.assets.total, dec!(1180));
        assert_eq!(sheet.liabilities.total, dec!(180));
        assert_eq!(sheet.equity.total, dec!(1000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_posts_get_distinct_gapless_numbers() {
        let (engine, _, _) = setup(EngineSettings::default());
        let author = UserId::new();

        let mut handles = Vec::new();
        for i in 0..50u32 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let amount = Decimal::from(i + 1);
                let request = PostingRequest::new(date(2025, 9, 1), format!("CS-{i}"), "cash sale", author)
                    .line(PostingLine::debit("1000", amount, ""))
                    .line(PostingLine::credit("4000", amount, ""));
                engine.post(request).await.unwrap().journal_number
            }));
        }

        let mut numbers = BTreeSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap());
        }
        let expected: BTreeSet<_> = (1..=50).map(|n| format!("JV/2025-26/{n:04}")).collect();
        assert_eq!(numbers, expected);
        assert_eq!(engine.journal().len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_standalone_numbers_are_unique() {
        let (engine, _, _) = setup(EngineSettings::default());
        let mut handles = Vec::new();
        for _ in 0..40 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .issue_number_for(&VoucherType::invoice(), date(2025, 11, 5))
                    .await
                    .unwrap()
                    .formatted
            }));
        }
        let mut numbers = BTreeSet::new();
        for handle in handles {
            assert!(numbers.insert(handle.await.unwrap()));
        }
        assert_eq!(numbers.len(), 40);
        assert!(numbers.contains("INV/2025-26/0040"));
    }

    #[tokio::test]
    async fn rejected_postings_leave_no_trace() {
        let (engine, reports, _) = setup(EngineSettings::default());
        let author = UserId::new();

        let unbalanced = PostingRequest::new(date(2025, 5, 1), "X-1", "typo", author)
            .line(PostingLine::debit("1000", dec!(500), ""))
            .line(PostingLine::credit("4000", dec!(50), ""));
        assert!(matches!(
            engine.post(unbalanced).await,
            Err(LedgerError::Unbalanced { .. })
        ));

        let mut draft = invoice("INV/2025-26/0009", date(2025, 5, 1), date(2025, 5, 1), dec!(10), dec!(0));
        draft.status = DocumentStatus::Draft;
        assert!(matches!(
            engine.post_event(&BusinessEvent::InvoiceIssued(draft), author).await,
            Err(LedgerError::Validation(_))
        ));

        assert!(engine.journal().is_empty());
        assert!(engine.entries(&JournalQuery::all()).await.unwrap().is_empty());
        let trial = reports.trial_balance(date(2025, 12, 31)).await.unwrap();
        assert!(trial.rows.is_empty());

        // the next good posting still gets the first number
        let inv = invoice("INV/2025-26/0010", date(2025, 5, 2), date(2025, 5, 2), dec!(10), dec!(0));
        let entry = engine.post_invoice(&inv, author).await.unwrap();
        assert_eq!(entry.journal_number, "JV/2025-26/0001");
    }

    #[tokio::test]
    async fn document_reports_read_from_the_source() {
        let (_, reports, documents) = setup(EngineSettings::default());

        documents
            .record_invoice(invoice("INV/1", date(2025, 4, 5), date(2025, 4, 20), dec!(1000), dec!(180)))
            .unwrap();
        documents
            .record_invoice(invoice("INV/2", date(2025, 6, 1), date(2025, 6, 15), dec!(500), dec!(90)))
            .unwrap();
        documents
            .record_bill(bill("BILL/1", date(2025, 5, 3), dec!(400), dec!(72)))
            .unwrap();
        documents
            .record_payment(receipt("RCPT/1", date(2025, 6, 20), dec!(300), PaymentMode::Upi))
            .unwrap();

        let tax = reports.tax_summary(date(2025, 4, 1), date(2025, 6, 30)).await.unwrap();
        assert_eq!(tax.output.tax, dec!(270));
        assert_eq!(tax.input.tax, dec!(72));
        assert_eq!(tax.net_payable, dec!(198));
        assert!(!tax.is_refund);

        let aging = reports.ar_aging(date(2025, 7, 1), AgingOptions::default()).await.unwrap();
        assert_eq!(aging.total_outstanding, dec!(1770));
        assert_eq!(aging.lines[0].number, "INV/1");
        assert_eq!(aging.buckets.days_61_to_90.amount, dec!(1180));
        assert_eq!(aging.buckets.days_1_to_30.amount, dec!(590));

        let flow = reports.cash_flow(date(2025, 6, 1), date(2025, 6, 30)).await.unwrap();
        assert_eq!((flow.inflow, flow.outflow, flow.net), (dec!(300), dec!(0), dec!(300)));

        assert!(matches!(
            reports.cash_flow(date(2025, 7, 1), date(2025, 6, 1)).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn account_ledger_tracks_running_balance() {
        let settings = EngineSettings {
            initial_status: EntryStatus::Posted,
            ..EngineSettings::default()
        };
        let (engine, reports, _) = setup(settings);
        let author = UserId::new();

        engine
            .post_invoice(&invoice("INV/A", date(2025, 4, 10), date(2025, 5, 10), dec!(100), dec!(0)), author)
            .await
            .unwrap();
        engine
            .post_payment_received(&receipt("RCPT/A", date(2025, 5, 2), dec!(60), PaymentMode::Cash), author)
            .await
            .unwrap();
        engine
            .post_invoice(&invoice("INV/B", date(2025, 5, 20), date(2025, 6, 20), dec!(40), dec!(0)), author)
            .await
            .unwrap();

        let ledger = reports
            .account_ledger("1200", date(2025, 5, 1), date(2025, 5, 31))
            .await
            .unwrap();
        assert_eq!(ledger.opening_balance, dec!(100));
        let balances: Vec<_> = ledger.lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![dec!(40), dec!(80)]);
        assert_eq!(ledger.closing_balance, dec!(80));

        let cash = reports
            .account_ledger("1000", date(2025, 4, 1), date(2026, 3, 31))
            .await
            .unwrap();
        assert_eq!(cash.closing_balance, dec!(60));

        assert_eq!(
            reports
                .account_ledger("7777", date(2025, 4, 1), date(2025, 4, 30))
                .await
                .unwrap_err(),
            LedgerError::account_not_found("7777")
        );
    }

    #[tokio::test]
    async fn reversal_nets_reports_to_zero() {
        let settings = EngineSettings {
            initial_status: EntryStatus::Posted,
            ..EngineSettings::default()
        };
        let (engine, reports, _) = setup(settings);
        let author = UserId::new();
        let entry = engine
            .post_invoice(&invoice("INV/R", date(2025, 8, 1), date(2025, 8, 1), dec!(250), dec!(45)), author)
            .await
            .unwrap();

        let reversal = engine
            .reverse(&entry.journal_number, date(2025, 8, 2), author)
            .await
            .unwrap();
        assert_eq!(reversal.reversal_of.as_deref(), Some(entry.journal_number.as_str()));

        let pnl = reports.profit_and_loss(date(2025, 4, 1), date(2026, 3, 31)).await.unwrap();
        assert_eq!(pnl.net_profit, Decimal::ZERO);
        let trial = reports.trial_balance(date(2026, 3, 31)).await.unwrap();
        assert!(trial.rows.iter().all(|r| r.balance.is_zero()));
    }

    /// Requires a reachable Postgres in `DATABASE_URL`.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore]
    async fn postgres_numbering_under_concurrency() {
        use crate::config::{DatabaseConfig, SequencesConfig};
        use crate::engine::LedgerEngine;
        use crate::error::StoreError;
        use crate::postgres::PgLedgerStore;
        use crate::registry::AccountRegistry;

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let database = DatabaseConfig {
            url: Some(url),
            max_connections: 10,
        };
        let store = PgLedgerStore::connect(&database, &SequencesConfig::default())
            .await
            .unwrap();
        store.ensure_schema().await.unwrap();

        let settings = EngineSettings::default();
        for account in settings.chart.standard_accounts() {
            match store.register(account).await {
                Ok(_) | Err(StoreError::Conflict(_)) => {}
                Err(e) => panic!("seeding accounts failed: {e}"),
            }
        }

        let engine = Arc::new(LedgerEngine::new(store.clone(), store.clone(), store.clone(), settings));
        // far-future fiscal year so reruns against the same database stay independent
        let fy = FiscalYear::starting(3000 + (rand_suffix() % 900) as i32);
        let day = fy.first_day().unwrap();

        let mut handles = Vec::new();
        for i in 0..20u32 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let request = PostingRequest::new(day, format!("PG-{i}"), "pg concurrency", UserId::new())
                    .line(PostingLine::debit("1000", dec!(1), ""))
                    .line(PostingLine::credit("4000", dec!(1), ""));
                engine.post(request).await
            }));
        }

        let mut numbers = BTreeSet::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(entry) => assert!(numbers.insert(entry.journal_number)),
                Err(LedgerError::SequenceContention(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(!numbers.is_empty());
        let max = numbers.len();
        let expected: BTreeSet<_> = (1..=max)
            .map(|n| format!("JV/{fy}/{n:04}"))
            .collect();
        assert_eq!(numbers, expected);
    }

    fn rand_suffix() -> u32 {
        uuid::Uuid::now_v7().as_u128() as u32
    }
}
