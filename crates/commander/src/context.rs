//! Execution context handed to commands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed metadata available to a command while it executes, such as
/// a correlation id or the acting user.
///
/// The executor passes an empty context unless the caller supplies one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandContext {
    values: Map<String, Value>,
}

impl CommandContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, returning the updated context.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl From<Map<String, Value>> for CommandContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
