//! Text encoding for composite song columns
//!
//! Every composite column is written as JSON text, never SQL NULL. On read,
//! NULL, empty and `null` text all decode to the type's default (`[]`, `{}`
//! or `None`), so rows written by older clients load uniformly. Text that is
//! present but not valid JSON for the column is an error.

use louvor_common::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Serialize a composite value for storage
pub fn encode<T: Serialize>(value: &T, column: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", column, e)))
}

/// Decode a stored composite value, substituting the default when absent
pub fn decode<T: DeserializeOwned + Default>(stored: Option<&str>, column: &str) -> Result<T> {
    let text = match stored.map(str::trim) {
        None | Some("") | Some("null") => return Ok(T::default()),
        Some(text) => text,
    };

    serde_json::from_str(text)
        .map_err(|e| Error::Internal(format!("Failed to deserialize {}: {}", column, e)))
}
