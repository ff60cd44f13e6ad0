//! Command execution pipeline for event-sourced services.
//!
//! Given an aggregate, a command name and a payload, the pipeline:
//! - builds and validates the command, then runs it to produce event records
//! - builds, validates and applies one event per record, in order
//! - saves every touched aggregate and every record inside one transaction
//!
//! Commands, events, repositories and the transaction primitive are supplied
//! by the embedding service through the traits in this crate.

pub mod aggregate;
pub mod command;
pub mod commander;
pub mod committer;
pub mod context;
pub mod error;
pub mod event;
pub mod executor;
pub mod record;
pub mod registry;
pub mod repository;
pub mod transaction;

#[cfg(test)]
mod fakes;

pub use aggregate::{AggregateIdentity, AggregateRef};
pub use command::{Command, CommandFactory};
pub use commander::Commander;
pub use committer::{EventCommitter, EventsCommitter};
pub use context::CommandContext;
pub use error::{BoxError, CommandError, ErrorKind, Result};
pub use event::{Event, EventFactory};
pub use executor::CommandExecutor;
pub use record::{EventRecord, RecordId};
pub use registry::{CommandRegistry, EventRegistry, RegistryError};
pub use repository::{AggregateRepository, EventRecordRepository};
pub use transaction::{DryRun, Passthrough, TransactionService, UnitOfWork};
