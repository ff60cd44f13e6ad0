//! Store configuration.

/// Default limit for an encoded event payload: 1 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Settings for [`InMemoryStore`](crate::InMemoryStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Largest accepted encoded payload, in bytes. `None` disables the check.
    pub max_payload_bytes: Option<usize>,
}

impl StoreConfig {
    /// Configuration with no payload size limit.
    pub fn unbounded() -> Self {
        Self {
            max_payload_bytes: None,
        }
    }

    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: Some(DEFAULT_MAX_PAYLOAD_BYTES),
        }
    }
}
