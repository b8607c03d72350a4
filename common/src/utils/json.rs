//! JSON rendering helpers.
//!
//! Snapshots and reports are written with sorted keys and four-space
//! indentation so that files diff cleanly between runs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::errors::{AppError, AppResult};

const INDENT: &[u8] = b"    ";

/// Renders a value as pretty JSON with keys sorted at every level.
///
/// # Errors
/// Returns `AppError::Serialization` if the value cannot be represented as JSON.
pub fn to_sorted_json<T: Serialize>(value: &T) -> AppResult<String> {
    // Going through `Value` sorts object keys: its map is a BTreeMap.
    let value =
        serde_json::to_value(value).map_err(|e| AppError::Serialization(e.to_string()))?;

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut ser)
        .map_err(|e| AppError::Serialization(e.to_string()))?;

    String::from_utf8(buf).map_err(|e| AppError::Serialization(e.to_string()))
}

/// Parses JSON text, mapping failures to `AppError::MalformedSnapshot`.
pub fn from_json<T: DeserializeOwned>(text: &str) -> AppResult<T> {
    serde_json::from_str(text).map_err(|e| AppError::MalformedSnapshot(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_keys_are_sorted_and_indented() {
        let mut map = HashMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        let text = to_sorted_json(&map).unwrap();
        assert_eq!(text, "{\n    \"alpha\": 2,\n    \"zeta\": 1\n}");
    }

    #[test]
    fn test_invalid_json_is_malformed_snapshot() {
        let err = from_json::<HashMap<String, u64>>("{ not json").unwrap_err();
        assert!(matches!(err, AppError::MalformedSnapshot(_)));
    }
}
