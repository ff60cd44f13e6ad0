//! Event records: the persisted shape of a domain event.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::aggregate::AggregateRef;

/// Unique identifier for an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// An event record produced by a command.
///
/// Pairs a handle to the aggregate the event concerns with the event name and
/// its untyped payload. The record does not own the aggregate; it only keeps
/// a handle so the event can be applied to it.
pub struct EventRecord<A> {
    id: RecordId,
    aggregate: AggregateRef<A>,
    name: String,
    data: Value,
    recorded_at: DateTime<Utc>,
}

impl<A> EventRecord<A> {
    /// Creates a new record for `aggregate`.
    pub fn new(aggregate: &AggregateRef<A>, name: impl Into<String>, data: Value) -> Self {
        Self {
            id: RecordId::new(),
            aggregate: aggregate.clone(),
            name: name.into(),
            data,
            recorded_at: Utc::now(),
        }
    }

    /// Returns a copy of this record carrying `data` instead of the current
    /// payload. Identity, aggregate, name and timestamp are kept.
    pub fn with_data(&self, data: Value) -> Self {
        Self {
            id: self.id,
            aggregate: self.aggregate.clone(),
            name: self.name.clone(),
            data,
            recorded_at: self.recorded_at,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn aggregate(&self) -> &AggregateRef<A> {
        &self.aggregate
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

impl<A> Clone for EventRecord<A> {
    fn clone(&self) -> Self {
        self.with_data(self.data.clone())
    }
}

impl<A> fmt::Debug for EventRecord<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecord")
            .field("id", &self.id)
            .field("aggregate", &self.aggregate)
            .field("name", &self.name)
            .field("data", &self.data)
            .field("recorded_at", &self.recorded_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_data_keeps_identity() {
        let aggregate = AggregateRef::new(0_u32);
        let record = EventRecord::new(&aggregate, "counter/incremented", json!({"by": 1}));
        let prepared = record.with_data(json!({"by": 2}));

        assert_eq!(prepared.id(), record.id());
        assert_eq!(prepared.name(), "counter/incremented");
        assert_eq!(prepared.recorded_at(), record.recorded_at());
        assert!(AggregateRef::ptr_eq(prepared.aggregate(), &aggregate));
        assert_eq!(prepared.data(), &json!({"by": 2}));
        assert_eq!(record.data(), &json!({"by": 1}));
    }

    #[test]
    fn new_records_get_distinct_ids() {
        let aggregate = AggregateRef::new(());
        let a = EventRecord::new(&aggregate, "x", Value::Null);
        let b = EventRecord::new(&aggregate, "x", Value::Null);
        assert_ne!(a.id(), b.id());
    }
}
