//! Read access to collaborator-owned business documents.
//!
//! Tax summary, aging and cash flow read documents directly instead of the journal.

use std::sync::RwLock;

use booksmith_accounting::{Payment, PurchaseBill, SalesInvoice};

use crate::error::{StoreError, StoreResult};

#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn sales_invoices(&self) -> StoreResult<Vec<SalesInvoice>>;

    async fn purchase_bills(&self) -> StoreResult<Vec<PurchaseBill>>;

    async fn payments(&self) -> StoreResult<Vec<Payment>>;
}

#[async_trait::async_trait]
impl<T> DocumentSource for std::sync::Arc<T>
where
    T: DocumentSource + ?Sized,
{
    async fn sales_invoices(&self) -> StoreResult<Vec<SalesInvoice>> {
        (**self).sales_invoices().await
    }

    async fn purchase_bills(&self) -> StoreResult<Vec<PurchaseBill>> {
        (**self).purchase_bills().await
    }

    async fn payments(&self) -> StoreResult<Vec<Payment>> {
        (**self).payments().await
    }
}

/// Documents held in memory, replaced by id on re-record. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
    invoices: RwLock<Vec<SalesInvoice>>,
    bills: RwLock<Vec<PurchaseBill>>,
    payments: RwLock<Vec<Payment>>,
}

impl InMemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_invoice(&self, invoice: SalesInvoice) -> StoreResult<()> {
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| StoreError::poisoned("invoices"))?;
        invoices.retain(|i| i.id != invoice.id);
        invoices.push(invoice);
        Ok(())
    }

    pub fn record_bill(&self, bill: PurchaseBill) -> StoreResult<()> {
        let mut bills = self
            .bills
            .write()
            .map_err(|_| StoreError::poisoned("bills"))?;
        bills.retain(|b| b.id != bill.id);
        bills.push(bill);
        Ok(())
    }

    pub fn record_payment(&self, payment: Payment) -> StoreResult<()> {
        let mut payments = self
            .payments
            .write()
            .map_err(|_| StoreError::poisoned("payments"))?;
        payments.retain(|p| p.id != payment.id);
        payments.push(payment);
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn sales_invoices(&self) -> StoreResult<Vec<SalesInvoice>> {
        Ok(self
            .invoices
            .read()
            .map_err(|_| StoreError::poisoned("invoices"))?
            .clone())
    }

    async fn purchase_bills(&self) -> StoreResult<Vec<PurchaseBill>> {
        Ok(self
            .bills
            .read()
            .map_err(|_| StoreError::poisoned("bills"))?
            .clone())
    }

    async fn payments(&self) -> StoreResult<Vec<Payment>> {
        Ok(self
            .payments
            .read()
            .map_err(|_| StoreError::poisoned("payments"))?
            .clone())
    }
}
