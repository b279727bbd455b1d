//! Voucher sequence storage.
//!
//! Issuing a number is one atomic unit per `(voucher type, fiscal year)`:
//! fetch-or-create the row, read `next_number`, store `next_number + 1`. Two callers
//! never see the same number, and a failed call consumes nothing.

mod in_memory;
pub(crate) mod postgres;

use booksmith_accounting::{IssuedNumber, SequenceKey, SequenceSettings, VoucherSequence};

use crate::error::StoreResult;

pub use in_memory::InMemorySequenceStore;

#[async_trait::async_trait]
pub trait SequenceStore: Send + Sync {
    /// Issue the next number, creating the row from `settings` on first use.
    async fn next_value(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<IssuedNumber>;

    /// Current row, without consuming a number.
    async fn peek(&self, key: &SequenceKey) -> StoreResult<Option<VoucherSequence>>;

    /// Restart numbering at 1. A row that does not exist yet is left alone.
    async fn reset(&self, key: &SequenceKey) -> StoreResult<()>;

    /// Upsert prefix and padding, keeping `next_number`.
    async fn configure(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<VoucherSequence>;
}

#[async_trait::async_trait]
impl<T> SequenceStore for std::sync::Arc<T>
where
    T: SequenceStore + ?Sized,
{
    async fn next_value(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<IssuedNumber> {
        (**self).next_value(key, settings).await
    }

    async fn peek(&self, key: &SequenceKey) -> StoreResult<Option<VoucherSequence>> {
        (**self).peek(key).await
    }

    async fn reset(&self, key: &SequenceKey) -> StoreResult<()> {
        (**self).reset(key).await
    }

    async fn configure(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<VoucherSequence> {
        (**self).configure(key, settings).await
    }
}
