//! Entry point tying the command pipeline to its collaborators.

use serde_json::Value;

use crate::aggregate::AggregateRef;
use crate::command::CommandFactory;
use crate::committer::EventsCommitter;
use crate::context::CommandContext;
use crate::error::Result;
use crate::event::EventFactory;
use crate::executor::CommandExecutor;
use crate::record::EventRecord;
use crate::repository::{AggregateRepository, EventRecordRepository};
use crate::transaction::TransactionService;

/// Executes commands against aggregates and commits the resulting events.
///
/// Holds the five collaborators and nothing else. Each call borrows them into
/// a fresh [`EventsCommitter`] and [`CommandExecutor`], so one `Commander` can
/// serve any number of calls.
///
/// ```ignore
/// let commander = Commander::new(events, commands, store.clone(), store.clone(), store);
/// let records = commander.execute(&account, "account/deposit", json!({"amount": 50})).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Commander<EF, CF, TS, AR, RR> {
    event_factory: EF,
    command_factory: CF,
    transaction_service: TS,
    aggregate_repository: AR,
    event_record_repository: RR,
}

impl<EF, CF, TS, AR, RR> Commander<EF, CF, TS, AR, RR> {
    pub fn new(
        event_factory: EF,
        command_factory: CF,
        transaction_service: TS,
        aggregate_repository: AR,
        event_record_repository: RR,
    ) -> Self {
        Self {
            event_factory,
            command_factory,
            transaction_service,
            aggregate_repository,
            event_record_repository,
        }
    }

    pub fn event_factory(&self) -> &EF {
        &self.event_factory
    }

    pub fn command_factory(&self) -> &CF {
        &self.command_factory
    }

    pub fn transaction_service(&self) -> &TS {
        &self.transaction_service
    }

    pub fn aggregate_repository(&self) -> &AR {
        &self.aggregate_repository
    }

    pub fn event_record_repository(&self) -> &RR {
        &self.event_record_repository
    }

    /// Executes the command `name` against `aggregate` with an empty context.
    pub async fn execute<A>(
        &self,
        aggregate: &AggregateRef<A>,
        name: &str,
        data: Value,
    ) -> Result<Vec<EventRecord<A>>>
    where
        A: Send + Sync + 'static,
        EF: EventFactory<A>,
        CF: CommandFactory<A>,
        TS: TransactionService,
        AR: AggregateRepository<A>,
        RR: EventRecordRepository<A>,
    {
        self.execute_with_context(aggregate, name, data, CommandContext::default())
            .await
    }

    /// Executes the command `name` against `aggregate`, handing it `context`.
    ///
    /// On error the aggregate may already hold mutations from events applied
    /// before the failure; nothing was persisted, so reload it before reuse.
    pub async fn execute_with_context<A>(
        &self,
        aggregate: &AggregateRef<A>,
        name: &str,
        data: Value,
        context: CommandContext,
    ) -> Result<Vec<EventRecord<A>>>
    where
        A: Send + Sync + 'static,
        EF: EventFactory<A>,
        CF: CommandFactory<A>,
        TS: TransactionService,
        AR: AggregateRepository<A>,
        RR: EventRecordRepository<A>,
    {
        let committer = EventsCommitter::new(
            &self.event_factory,
            &self.transaction_service,
            &self.aggregate_repository,
            &self.event_record_repository,
        );
        CommandExecutor::new(&self.command_factory, &committer)
            .execute_with_context(aggregate, name, data, context)
            .await
    }
}
