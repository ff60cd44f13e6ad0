use thiserror::Error;

use crate::AggregateId;
use crate::memory::FailurePoint;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The encoded payload is larger than the configured limit.
    #[error("payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The payload holds a NUL character, which the storage encoding refuses.
    #[error("payload contains a NUL character at {path}")]
    UnsupportedCharacter { path: String },

    /// The stored aggregate has a different type than the one requested.
    #[error("aggregate {id} is stored as {found}, not {expected}")]
    AggregateTypeMismatch {
        id: AggregateId,
        expected: &'static str,
        found: String,
    },

    /// The aggregate was saved from a stale version.
    #[error("aggregate {id} was saved from version {expected}, stored version is {actual}")]
    ConcurrencyConflict {
        id: AggregateId,
        expected: u64,
        actual: u64,
    },

    /// A failure requested through `InMemoryStore::fail_next`.
    #[error("injected failure on {0:?}")]
    InjectedFailure(FailurePoint),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
