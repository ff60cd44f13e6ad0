//! Recording collaborators shared by the unit tests.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::aggregate::{AggregateIdentity, AggregateRef};
use crate::command::{Command, CommandFactory};
use crate::context::CommandContext;
use crate::error::BoxError;
use crate::event::{Event, EventFactory};
use crate::record::{EventRecord, RecordId};
use crate::repository::{AggregateRepository, EventRecordRepository};
use crate::transaction::{TransactionService, UnitOfWork};

#[derive(Debug, Default)]
pub struct Counter {
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    NewCommand(String, Value),
    ExecuteCommand(CommandContext),
    PrepareData(RecordId),
    NewEvent(String, Value),
    Apply(RecordId),
    Transaction,
    SaveAggregate(AggregateIdentity),
    SaveRecord(RecordId),
}

#[derive(Debug, Clone, Default)]
pub struct Log(Arc<Mutex<Vec<Call>>>);

impl Log {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn saved_aggregates(&self) -> Vec<AggregateIdentity> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SaveAggregate(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn saved_records(&self) -> Vec<RecordId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SaveRecord(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn saves(&self) -> usize {
        self.count(|c| matches!(c, Call::SaveAggregate(_) | Call::SaveRecord(_)))
    }
}

type Script = Arc<dyn Fn(&AggregateRef<Counter>) -> Vec<EventRecord<Counter>> + Send + Sync>;

pub struct FakeCommand {
    name: String,
    valid: bool,
    script: Script,
    log: Log,
}

impl fmt::Debug for FakeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeCommand")
            .field("name", &self.name)
            .field("valid", &self.valid)
            .finish()
    }
}

impl Command<Counter> for FakeCommand {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn execute(
        &self,
        aggregate: &AggregateRef<Counter>,
        context: &CommandContext,
    ) -> Result<Vec<EventRecord<Counter>>, BoxError> {
        self.log.push(Call::ExecuteCommand(context.clone()));
        Ok((self.script)(aggregate))
    }
}

pub struct FakeCommandFactory {
    pub log: Log,
    pub valid: bool,
    script: Script,
}

impl FakeCommandFactory {
    pub fn new(
        log: &Log,
        script: impl Fn(&AggregateRef<Counter>) -> Vec<EventRecord<Counter>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            log: log.clone(),
            valid: true,
            script: Arc::new(script),
        }
    }

    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }
}

impl CommandFactory<Counter> for FakeCommandFactory {
    type Command = FakeCommand;

    fn new_command(&self, name: &str, data: Value) -> Result<FakeCommand, BoxError> {
        self.log.push(Call::NewCommand(name.to_string(), data));
        Ok(FakeCommand {
            name: name.to_string(),
            valid: self.valid,
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FakeEvent {
    data: Value,
    valid: bool,
    log: Log,
}

impl Event<Counter> for FakeEvent {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn apply(&self, record: &EventRecord<Counter>) {
        self.log.push(Call::Apply(record.id()));
        let by = self.data.get("by").and_then(Value::as_i64).unwrap_or(1);
        record.aggregate().update(|c| c.value += by);
    }
}

pub struct FakeEventFactory {
    pub log: Log,
    pub invalid_names: HashSet<String>,
}

impl FakeEventFactory {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            invalid_names: HashSet::new(),
        }
    }

    pub fn rejecting(mut self, name: &str) -> Self {
        self.invalid_names.insert(name.to_string());
        self
    }
}

impl EventFactory<Counter> for FakeEventFactory {
    type Event = FakeEvent;

    fn new_event(&self, name: &str, data: Value) -> Result<FakeEvent, BoxError> {
        self.log.push(Call::NewEvent(name.to_string(), data.clone()));
        Ok(FakeEvent {
            data,
            valid: !self.invalid_names.contains(name),
            log: self.log.clone(),
        })
    }
}

type Normalizer = fn(&Value) -> Result<Value, BoxError>;

pub struct FakeRepository {
    pub log: Log,
    normalize: Normalizer,
}

impl FakeRepository {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            normalize: |v| Ok(v.clone()),
        }
    }

    pub fn normalizing(mut self, normalize: Normalizer) -> Self {
        self.normalize = normalize;
        self
    }
}

#[async_trait]
impl AggregateRepository<Counter> for FakeRepository {
    async fn save(&self, aggregate: &AggregateRef<Counter>) -> Result<(), BoxError> {
        self.log.push(Call::SaveAggregate(aggregate.identity()));
        Ok(())
    }
}

#[async_trait]
impl EventRecordRepository<Counter> for FakeRepository {
    async fn save(&self, record: &EventRecord<Counter>) -> Result<(), BoxError> {
        self.log.push(Call::SaveRecord(record.id()));
        Ok(())
    }

    fn prepare_data(
        &self,
        record: &EventRecord<Counter>,
    ) -> Result<EventRecord<Counter>, BoxError> {
        self.log.push(Call::PrepareData(record.id()));
        Ok(record.with_data((self.normalize)(record.data())?))
    }
}

pub struct FakeTransactions {
    pub log: Log,
    pub run: bool,
}

impl FakeTransactions {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            run: true,
        }
    }

    pub fn declining(mut self) -> Self {
        self.run = false;
        self
    }
}

#[async_trait]
impl TransactionService for FakeTransactions {
    async fn transaction<'a>(&self, work: UnitOfWork<'a>) -> Result<(), BoxError> {
        self.log.push(Call::Transaction);
        if self.run { work.await } else { Ok(()) }
    }
}

pub fn incremented(aggregate: &AggregateRef<Counter>, by: i64) -> EventRecord<Counter> {
    EventRecord::new(aggregate, "counter/incremented", serde_json::json!({ "by": by }))
}
