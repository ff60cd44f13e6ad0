//! In-memory persistence for the command pipeline.
//!
//! [`InMemoryStore`] implements the aggregate repository, the event record
//! repository and the transaction service of the `commander` crate. Saves
//! made inside a transaction are staged and committed together.

pub mod aggregate;
pub mod config;
pub mod encoding;
pub mod error;
pub mod memory;
pub mod record;

pub use aggregate::{AggregateId, StoredAggregate};
pub use config::{DEFAULT_MAX_PAYLOAD_BYTES, StoreConfig};
pub use error::{Result, StoreError};
pub use memory::{FailurePoint, InMemoryStore};
pub use record::StoredRecord;
