//! Transaction contract and two trivial implementations.

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::BoxError;

/// A unit of work handed to a [`TransactionService`].
pub type UnitOfWork<'a> = BoxFuture<'a, Result<(), BoxError>>;

/// Runs units of work atomically.
///
/// An implementation polls `work` to completion at most once. When it does,
/// everything persisted by `work` must be committed together, or rolled back
/// if `work` fails. It may also decline to run `work` at all, in which case
/// nothing is persisted. An error from `work` must be returned as is.
#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn transaction<'a>(&self, work: UnitOfWork<'a>) -> Result<(), BoxError>;
}

/// Transaction service that never runs the unit of work.
///
/// Commands still execute and events are still applied in memory, so callers
/// can preview the outcome of a command without persisting it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

#[async_trait]
impl TransactionService for DryRun {
    async fn transaction<'a>(&self, work: UnitOfWork<'a>) -> Result<(), BoxError> {
        drop(work);
        tracing::debug!("dry run, skipping persistence");
        Ok(())
    }
}

/// Transaction service that runs the unit of work directly.
///
/// Provides no atomicity: a failure halfway through leaves earlier saves in
/// place. Only suitable for backends that have no transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl TransactionService for Passthrough {
    async fn transaction<'a>(&self, work: UnitOfWork<'a>) -> Result<(), BoxError> {
        work.await
    }
}
