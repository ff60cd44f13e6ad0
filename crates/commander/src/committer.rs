//! Applies event records to their aggregates and persists both atomically.

use std::collections::HashSet;
use std::time::Instant;

use async_trait::async_trait;

use crate::aggregate::AggregateRef;
use crate::error::{BoxError, CommandError, Result};
use crate::event::{Event, EventFactory};
use crate::record::EventRecord;
use crate::repository::{AggregateRepository, EventRecordRepository};
use crate::transaction::{TransactionService, UnitOfWork};

/// Commits the event records produced by a command.
#[async_trait]
pub trait EventCommitter<A>: Send + Sync
where
    A: Send + Sync + 'static,
{
    async fn commit_events(&self, event_records: &[EventRecord<A>]) -> Result<()>;
}

/// The default [`EventCommitter`].
///
/// Commits in two strictly sequential phases:
///
/// 1. Apply, record by record in batch order: prepare the payload through the
///    record repository, build the event from the prepared payload, check it,
///    and apply it to its aggregate. The first invalid event aborts the commit
///    before any transaction is opened.
/// 2. Persist, inside one transaction: save every distinct aggregate once, in
///    the order it first appears, then save every record in batch order.
///
/// Aggregate mutations from phase 1 are not undone when a later event in the
/// batch is rejected. Callers should discard the aggregate handles on error.
pub struct EventsCommitter<'a, EF, TS, AR, RR> {
    event_factory: &'a EF,
    transaction_service: &'a TS,
    aggregate_repository: &'a AR,
    event_record_repository: &'a RR,
}

impl<'a, EF, TS, AR, RR> EventsCommitter<'a, EF, TS, AR, RR> {
    pub fn new(
        event_factory: &'a EF,
        transaction_service: &'a TS,
        aggregate_repository: &'a AR,
        event_record_repository: &'a RR,
    ) -> Self {
        Self {
            event_factory,
            transaction_service,
            aggregate_repository,
            event_record_repository,
        }
    }

    fn apply_event<A>(&self, record: &EventRecord<A>) -> Result<()>
    where
        A: Send + Sync + 'static,
        EF: EventFactory<A>,
        RR: EventRecordRepository<A>,
    {
        let prepared = self.event_record_repository.prepare_data(record)?;
        let event = self
            .event_factory
            .new_event(record.name(), prepared.data().clone())?;

        if !event.is_valid() {
            metrics::counter!("events_rejected_total").increment(1);
            tracing::warn!(event = record.name(), record_id = %record.id(), "event rejected");
            return Err(CommandError::InvalidEvent {
                name: record.name().to_string(),
                details: format!("{event:?}"),
            });
        }

        event.apply(&prepared);
        tracing::debug!(event = record.name(), record_id = %record.id(), "event applied");
        Ok(())
    }
}

#[async_trait]
impl<'c, A, EF, TS, AR, RR> EventCommitter<A> for EventsCommitter<'c, EF, TS, AR, RR>
where
    A: Send + Sync + 'static,
    EF: EventFactory<A>,
    TS: TransactionService,
    AR: AggregateRepository<A>,
    RR: EventRecordRepository<A>,
{
    #[tracing::instrument(skip_all, fields(records = event_records.len()))]
    async fn commit_events(&self, event_records: &[EventRecord<A>]) -> Result<()> {
        for record in event_records {
            self.apply_event(record)?;
        }

        let aggregates = distinct_aggregates(event_records);
        let aggregate_count = aggregates.len();
        let aggregate_repository = self.aggregate_repository;
        let event_record_repository = self.event_record_repository;

        let work: UnitOfWork<'_> = Box::pin(async move {
            for aggregate in aggregates {
                aggregate_repository.save(aggregate).await?;
            }
            for record in event_records {
                event_record_repository.save(record).await?;
            }
            metrics::counter!("aggregates_saved_total").increment(aggregate_count as u64);
            metrics::counter!("events_committed_total").increment(event_records.len() as u64);
            Ok::<(), BoxError>(())
        });

        let started = Instant::now();
        self.transaction_service.transaction(work).await?;
        metrics::histogram!("commit_duration_seconds").record(started.elapsed().as_secs_f64());

        tracing::info!(
            records = event_records.len(),
            aggregates = aggregate_count,
            "events committed"
        );
        Ok(())
    }
}

/// Aggregates referenced by `records`, each once, in first-occurrence order.
fn distinct_aggregates<A>(records: &[EventRecord<A>]) -> Vec<&AggregateRef<A>> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(EventRecord::aggregate)
        .filter(|aggregate| seen.insert(aggregate.identity()))
        .collect()
}
