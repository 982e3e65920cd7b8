//! Forgiving deserializers for loosely-typed API fields.
//!
//! The storefront API is not strict about numeric encoding (quantities may
//! arrive as `2`, `2.0` or `"2"`) and occasionally omits or mangles nested
//! lists. These helpers are used with `#[serde(deserialize_with = ...)]` so a
//! single bad field degrades to a neutral value instead of failing the whole
//! response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a non-negative count.
///
/// Returns `None` for anything that is not a number or numeric string.
#[must_use]
pub fn count_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().and_then(count_from_float)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u32>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(count_from_float))
        }
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "range is checked before the cast"
)]
fn count_from_float(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX)).then(|| value as u32)
}

/// Deserialize a count, treating missing or malformed input as zero.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn count_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(count_from_value).unwrap_or(0))
}

/// Deserialize a cart quantity, which is never below one.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn quantity_at_least_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    count_or_zero(deserializer).map(|q| q.max(1))
}

/// Deserialize a list, dropping elements that do not parse and treating a
/// non-array value as empty.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = raw else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Deserialize an optional string, treating blank strings and non-string
/// values as absent.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}
