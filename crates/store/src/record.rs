use chrono::{DateTime, Utc};
use commander::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::AggregateId;

/// An event record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Position in the store-wide commit order, starting at 1.
    pub sequence: u64,
    pub record_id: RecordId,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,
    /// Event name, e.g. `account/deposited`.
    pub name: String,
    pub data: Value,
    pub recorded_at: DateTime<Utc>,
}
