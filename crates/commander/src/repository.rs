//! Persistence contracts.

use async_trait::async_trait;

use crate::aggregate::AggregateRef;
use crate::error::BoxError;
use crate::record::EventRecord;

/// Persists aggregate state.
///
/// Any optimistic locking or other cross-request concurrency control belongs
/// to the implementation.
#[async_trait]
pub trait AggregateRepository<A>: Send + Sync
where
    A: Send + Sync + 'static,
{
    async fn save(&self, aggregate: &AggregateRef<A>) -> Result<(), BoxError>;
}

/// Persists event records.
#[async_trait]
pub trait EventRecordRepository<A>: Send + Sync
where
    A: Send + Sync + 'static,
{
    async fn save(&self, record: &EventRecord<A>) -> Result<(), BoxError>;

    /// Returns a copy of `record` whose payload went through the same
    /// encoding the repository uses when saving.
    ///
    /// Payloads that would not survive storage fail here, before anything
    /// is applied or persisted.
    fn prepare_data(&self, record: &EventRecord<A>) -> Result<EventRecord<A>, BoxError>;
}
