//! Aggregate identity as seen by the store.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random aggregate ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for AggregateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An aggregate the in-memory store knows how to persist.
///
/// The store keeps the serialized state of the aggregate keyed by its id.
pub trait StoredAggregate: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable name of the aggregate type, stored with every row.
    fn aggregate_type() -> &'static str;

    fn aggregate_id(&self) -> AggregateId;

    /// Version of the stored state this value was loaded from, 0 if it was
    /// never saved. Saves are rejected when it is stale.
    fn version(&self) -> u64;

    /// Records the version the store assigned on load or save.
    fn set_version(&mut self, version: u64);
}
