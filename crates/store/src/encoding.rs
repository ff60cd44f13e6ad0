//! Payload encoding round-trip.
//!
//! Mirrors what a JSONB column does to a payload on the way in, so a payload
//! that storage would refuse is caught before any event is applied.

use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Encodes `data` to JSON bytes and decodes it again, enforcing the limits in
/// `config`. Returns the decoded value.
pub fn round_trip(data: &Value, config: &StoreConfig) -> Result<Value> {
    let bytes = serde_json::to_vec(data)?;

    if let Some(limit) = config.max_payload_bytes
        && bytes.len() > limit
    {
        return Err(StoreError::PayloadTooLarge {
            size: bytes.len(),
            limit,
        });
    }

    let decoded: Value = serde_json::from_slice(&bytes)?;
    if let Some(path) = find_nul(&decoded, "$") {
        return Err(StoreError::UnsupportedCharacter { path });
    }
    Ok(decoded)
}

/// Returns the path of the first string or key containing `\0`.
fn find_nul(value: &Value, path: &str) -> Option<String> {
    match value {
        Value::String(s) if s.contains('\0') => Some(path.to_string()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_nul(item, &format!("{path}[{i}]"))),
        Value::Object(map) => map.iter().find_map(|(key, item)| {
            let item_path = format!("{path}.{}", key.escape_default());
            if key.contains('\0') {
                Some(item_path)
            } else {
                find_nul(item, &item_path)
            }
        }),
        _ => None,
    }
}
