use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commander::{
    AggregateRef, AggregateRepository, BoxError, EventRecord, EventRecordRepository,
    TransactionService, UnitOfWork,
};
use serde_json::Value;

use crate::aggregate::{AggregateId, StoredAggregate};
use crate::config::StoreConfig;
use crate::encoding;
use crate::error::{Result, StoreError};
use crate::record::StoredRecord;

tokio::task_local! {
    static ACTIVE_TRANSACTION: TransactionId;
}

/// Transaction ids are unique across stores, since the task-local is shared.
static NEXT_TRANSACTION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TransactionId(u64);

fn current_transaction() -> Option<TransactionId> {
    ACTIVE_TRANSACTION.try_with(|id| *id).ok()
}

/// Where [`InMemoryStore::fail_next`] injects a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    AggregateSave,
    RecordSave,
}

#[derive(Debug, Clone)]
struct AggregateRow {
    id: AggregateId,
    aggregate_type: &'static str,
    version: u64,
    state: Value,
    saved_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Change {
    Aggregate(AggregateRow),
    Record(StoredRecord),
}

#[derive(Debug, Default)]
struct State {
    aggregates: HashMap<AggregateId, AggregateRow>,
    records: Vec<StoredRecord>,
    open: HashMap<TransactionId, Vec<Change>>,
    pending_failure: Option<FailurePoint>,
}

impl State {
    fn check_failure(&mut self, point: FailurePoint) -> Result<()> {
        if self.pending_failure == Some(point) {
            self.pending_failure = None;
            return Err(StoreError::InjectedFailure(point));
        }
        Ok(())
    }

    fn committed_version(&self, id: AggregateId) -> u64 {
        self.aggregates.get(&id).map_or(0, |row| row.version)
    }

    /// Latest version of `id` as seen from the current task: staged in its
    /// open transaction if there is one, committed otherwise.
    fn visible_version(&self, id: AggregateId) -> u64 {
        let staged = current_transaction()
            .and_then(|tx| self.open.get(&tx))
            .and_then(|changes| {
                changes.iter().rev().find_map(|change| match change {
                    Change::Aggregate(row) if row.id == id => Some(row.version),
                    _ => None,
                })
            });
        staged.unwrap_or_else(|| self.committed_version(id))
    }

    fn record(&mut self, change: Change) {
        let open = current_transaction().and_then(|id| self.open.get_mut(&id));
        match open {
            Some(changes) => changes.push(change),
            None => self.apply(change),
        }
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::Aggregate(row) => {
                self.aggregates.insert(row.id, row);
            }
            Change::Record(mut record) => {
                record.sequence = self.records.len() as u64 + 1;
                self.records.push(record);
            }
        }
    }
}

/// In-memory implementation of the pipeline's persistence collaborators.
///
/// One store serves as the aggregate repository, the event record repository
/// and the transaction service. Saves made inside [`TransactionService::transaction`]
/// are staged and become visible together when the unit of work succeeds;
/// they are discarded when it fails. Saves made outside a transaction are
/// visible immediately. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    config: StoreConfig,
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next save at `point` fail with [`StoreError::InjectedFailure`].
    pub fn fail_next(&self, point: FailurePoint) {
        self.state_mut().pending_failure = Some(point);
    }

    /// Loads the committed state of an aggregate, stamped with its version.
    pub fn load<A: StoredAggregate>(&self, id: AggregateId) -> Result<Option<A>> {
        let state = self.state();
        let Some(row) = state.aggregates.get(&id) else {
            return Ok(None);
        };
        if row.aggregate_type != A::aggregate_type() {
            return Err(StoreError::AggregateTypeMismatch {
                id,
                expected: A::aggregate_type(),
                found: row.aggregate_type.to_string(),
            });
        }
        let mut aggregate: A = serde_json::from_value(row.state.clone())?;
        aggregate.set_version(row.version);
        Ok(Some(aggregate))
    }

    /// Returns when an aggregate was last saved.
    pub fn saved_at(&self, id: AggregateId) -> Option<DateTime<Utc>> {
        self.state().aggregates.get(&id).map(|row| row.saved_at)
    }

    /// Returns the committed records of an aggregate in commit order.
    pub fn records_for(&self, id: AggregateId) -> Vec<StoredRecord> {
        self.state()
            .records
            .iter()
            .filter(|r| r.aggregate_id == id)
            .cloned()
            .collect()
    }

    /// Returns all committed records in commit order.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.state().records.clone()
    }

    pub fn record_count(&self) -> usize {
        self.state().records.len()
    }

    pub fn aggregate_count(&self) -> usize {
        self.state().aggregates.len()
    }
}

#[async_trait]
impl<A: StoredAggregate> AggregateRepository<A> for InMemoryStore {
    async fn save(&self, aggregate: &AggregateRef<A>) -> std::result::Result<(), BoxError> {
        let row = {
            let aggregate = aggregate.read();
            AggregateRow {
                id: aggregate.aggregate_id(),
                aggregate_type: A::aggregate_type(),
                version: aggregate.version() + 1,
                state: serde_json::to_value(&*aggregate).map_err(StoreError::from)?,
                saved_at: Utc::now(),
            }
        };
        let (id, version) = (row.id, row.version);

        {
            let mut state = self.state_mut();
            state.check_failure(FailurePoint::AggregateSave)?;
            let actual = state.visible_version(id);
            if actual != version - 1 {
                return Err(StoreError::ConcurrencyConflict {
                    id,
                    expected: version - 1,
                    actual,
                }
                .into());
            }
            tracing::trace!(aggregate_id = %id, version, "saving aggregate");
            state.record(Change::Aggregate(row));
        }

        aggregate.update(|a| a.set_version(version));
        Ok(())
    }
}

#[async_trait]
impl<A: StoredAggregate> EventRecordRepository<A> for InMemoryStore {
    async fn save(&self, record: &EventRecord<A>) -> std::result::Result<(), BoxError> {
        let stored = StoredRecord {
            sequence: 0,
            record_id: record.id(),
            aggregate_id: record.aggregate().read().aggregate_id(),
            aggregate_type: A::aggregate_type().to_string(),
            name: record.name().to_string(),
            data: record.data().clone(),
            recorded_at: record.recorded_at(),
        };

        let mut state = self.state_mut();
        state.check_failure(FailurePoint::RecordSave)?;
        tracing::trace!(record_id = %stored.record_id, name = %stored.name, "saving record");
        state.record(Change::Record(stored));
        Ok(())
    }

    fn prepare_data(
        &self,
        record: &EventRecord<A>,
    ) -> std::result::Result<EventRecord<A>, BoxError> {
        let data = encoding::round_trip(record.data(), &self.config)?;
        Ok(record.with_data(data))
    }
}

/// Discards the staged changes of a transaction whose unit of work never
/// finished, for example because the caller dropped the future.
struct OpenTransaction<'s> {
    store: &'s InMemoryStore,
    id: TransactionId,
}

impl OpenTransaction<'_> {
    fn begin(store: &InMemoryStore) -> OpenTransaction<'_> {
        let id = TransactionId(NEXT_TRANSACTION.fetch_add(1, Ordering::Relaxed));
        store.state_mut().open.insert(id, Vec::new());
        OpenTransaction { store, id }
    }

    /// Applies the staged changes, unless another transaction committed a
    /// newer version of one of the staged aggregates first.
    fn commit(self) -> Result<usize> {
        let mut state = self.store.state_mut();
        let changes = state.open.remove(&self.id).unwrap_or_default();
        let mut staged: HashMap<AggregateId, u64> = HashMap::new();
        for change in &changes {
            if let Change::Aggregate(row) = change {
                let actual = staged
                    .get(&row.id)
                    .copied()
                    .unwrap_or_else(|| state.committed_version(row.id));
                if actual != row.version - 1 {
                    return Err(StoreError::ConcurrencyConflict {
                        id: row.id,
                        expected: row.version - 1,
                        actual,
                    });
                }
                staged.insert(row.id, row.version);
            }
        }
        let count = changes.len();
        for change in changes {
            state.apply(change);
        }
        Ok(count)
    }
}

impl Drop for OpenTransaction<'_> {
    fn drop(&mut self) {
        self.store.state_mut().open.remove(&self.id);
    }
}

#[async_trait]
impl TransactionService for InMemoryStore {
    async fn transaction<'a>(&self, work: UnitOfWork<'a>) -> std::result::Result<(), BoxError> {
        let nested = current_transaction().is_some_and(|id| self.state().open.contains_key(&id));
        if nested {
            return work.await;
        }

        let transaction = OpenTransaction::begin(self);
        let id = transaction.id;
        match ACTIVE_TRANSACTION.scope(id, work).await {
            Ok(()) => {
                let changes = transaction.commit()?;
                tracing::debug!(transaction = id.0, changes, "transaction committed");
                Ok(())
            }
            Err(err) => {
                drop(transaction);
                tracing::debug!(transaction = id.0, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}
