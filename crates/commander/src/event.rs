//! Event contracts.

use std::fmt;

use serde_json::Value;

use crate::error::BoxError;
use crate::record::EventRecord;

/// A typed event, built from a record's name and prepared payload.
///
/// Events are transient: they exist only while being applied. The record is
/// what gets persisted.
pub trait Event<A>: fmt::Debug + Send + Sync {
    /// Returns whether the event is well-formed. Must be free of side effects.
    fn is_valid(&self) -> bool;

    /// Mutates the aggregate referenced by `record`.
    fn apply(&self, record: &EventRecord<A>);
}

/// Builds events from a name and an untyped payload.
pub trait EventFactory<A>: Send + Sync {
    type Event: Event<A>;

    fn new_event(&self, name: &str, data: Value) -> Result<Self::Event, BoxError>;
}

impl<A, E> Event<A> for Box<E>
where
    E: Event<A> + ?Sized,
{
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn apply(&self, record: &EventRecord<A>) {
        (**self).apply(record)
    }
}
