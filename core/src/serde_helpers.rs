//! Lenient deserializers for loosely typed server payloads.
//!
//! The remote API is not consistent about identifier and flag types across
//! versions: ids arrive as strings or numbers, flags as booleans, numbers or
//! strings. These helpers normalize at the boundary so the rest of the crate
//! works with one representation.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::Value;

/// Render a scalar JSON value as an identifier string
fn scalar_to_string(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected a string or number, found {other}")),
    }
}

/// Deserialize a required identifier given as a string or a number
///
/// # Errors
///
/// Fails for null, arrays and objects.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("identifier must not be null"))
}

/// Deserialize an optional text field, accepting numbers and treating `""` as absent
///
/// # Errors
///
/// Fails for arrays and objects.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value)
        .map_err(D::Error::custom)?
        .filter(|s| !s.trim().is_empty()))
}

/// Deserialize a flag given as a boolean, a number or a string
///
/// `null`, `0`, `""`, `"false"` and `"0"` are false.
///
/// # Errors
///
/// Fails for arrays and objects.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let s = s.trim();
            Ok(!(s.is_empty() || s.eq_ignore_ascii_case("false") || s == "0"))
        }
        other => Err(D::Error::custom(format!(
            "expected a boolean flag, found {other}"
        ))),
    }
}
