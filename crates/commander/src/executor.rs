//! Builds, validates and runs commands.

use serde_json::Value;

use crate::aggregate::AggregateRef;
use crate::command::{Command, CommandFactory};
use crate::committer::EventCommitter;
use crate::context::CommandContext;
use crate::error::{CommandError, Result};
use crate::record::EventRecord;

/// Runs a named command against an aggregate and commits what it produces.
pub struct CommandExecutor<'a, CF, EC> {
    command_factory: &'a CF,
    events_committer: &'a EC,
}

impl<'a, CF, EC> CommandExecutor<'a, CF, EC> {
    pub fn new(command_factory: &'a CF, events_committer: &'a EC) -> Self {
        Self {
            command_factory,
            events_committer,
        }
    }

    /// Executes the command `name` with an empty context.
    ///
    /// Returns the event records the command produced, in the order it
    /// produced them, once they have been committed.
    pub async fn execute<A>(
        &self,
        aggregate: &AggregateRef<A>,
        name: &str,
        data: Value,
    ) -> Result<Vec<EventRecord<A>>>
    where
        A: Send + Sync + 'static,
        CF: CommandFactory<A>,
        EC: EventCommitter<A>,
    {
        self.execute_with_context(aggregate, name, data, CommandContext::default())
            .await
    }

    /// Executes the command `name`, handing `context` to the command.
    #[tracing::instrument(skip(self, aggregate, data, context))]
    pub async fn execute_with_context<A>(
        &self,
        aggregate: &AggregateRef<A>,
        name: &str,
        data: Value,
        context: CommandContext,
    ) -> Result<Vec<EventRecord<A>>>
    where
        A: Send + Sync + 'static,
        CF: CommandFactory<A>,
        EC: EventCommitter<A>,
    {
        let event_records = {
            let command = self.command_factory.new_command(name, data)?;

            if !command.is_valid() {
                metrics::counter!("commands_rejected_total").increment(1);
                tracing::warn!(command = name, "command rejected");
                return Err(CommandError::InvalidCommand {
                    name: name.to_string(),
                    details: format!("{command:?}"),
                });
            }

            command.execute(aggregate, &context)?
        };
        tracing::debug!(records = event_records.len(), "command executed");

        self.events_committer.commit_events(&event_records).await?;

        metrics::counter!("commands_executed_total").increment(1);
        Ok(event_records)
    }
}
