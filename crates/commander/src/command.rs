//! Command contracts.

use std::fmt;

use serde_json::Value;

use crate::aggregate::AggregateRef;
use crate::context::CommandContext;
use crate::error::BoxError;
use crate::record::EventRecord;

/// A unit of domain intent, built from a command name and its payload.
///
/// Commands must not persist anything. Executing one only produces the event
/// records describing what should happen to the aggregate; applying and
/// persisting them is the committer's job.
pub trait Command<A>: fmt::Debug + Send + Sync {
    /// Returns whether the command is well-formed. Must be free of side
    /// effects.
    fn is_valid(&self) -> bool;

    /// Produces the ordered event records for this command.
    fn execute(
        &self,
        aggregate: &AggregateRef<A>,
        context: &CommandContext,
    ) -> Result<Vec<EventRecord<A>>, BoxError>;
}

/// Builds commands from a name and an untyped payload.
pub trait CommandFactory<A>: Send + Sync {
    type Command: Command<A>;

    fn new_command(&self, name: &str, data: Value) -> Result<Self::Command, BoxError>;
}

impl<A, C> Command<A> for Box<C>
where
    C: Command<A> + ?Sized,
{
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn execute(
        &self,
        aggregate: &AggregateRef<A>,
        context: &CommandContext,
    ) -> Result<Vec<EventRecord<A>>, BoxError> {
        (**self).execute(aggregate, context)
    }
}
