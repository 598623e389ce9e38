//! Masking of sensitive configuration values before they are persisted.

use serde_json::Value;
use std::collections::BTreeMap;

/// Replacement written in place of a sensitive value.
pub const MASK: &str = "***";

/// Lower-case substrings that mark a configuration key as sensitive.
pub const SENSITIVE_SUBSTRINGS: &[&str] = &["key", "secret", "token", "password", "api"];

/// Return a copy of `config` with every sensitive key's value masked.
///
/// A key is sensitive when its lower-cased text contains any of
/// [`SENSITIVE_SUBSTRINGS`]. Matching is by substring, so `max_tokens_count`
/// is masked too. Only top-level keys are inspected; see [`redact_nested`].
/// The input is never modified.
pub fn redact(config: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    redact_with(config, &[])
}

/// Like [`redact`], with additional sensitive substrings.
pub fn redact_with(
    config: &BTreeMap<String, Value>,
    extra: &[String],
) -> BTreeMap<String, Value> {
    config
        .iter()
        .map(|(key, value)| {
            if is_sensitive(key, extra) {
                (key.clone(), Value::String(MASK.to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Like [`redact_with`], also masking sensitive keys inside nested objects,
/// including objects inside arrays.
///
/// Used for stage input snapshots, where node config may nest parameters
/// (e.g. an intelligence node's `params`).
pub fn redact_nested(
    config: &BTreeMap<String, Value>,
    extra: &[String],
) -> BTreeMap<String, Value> {
    config
        .iter()
        .map(|(key, value)| (key.clone(), redact_entry(key, value, extra)))
        .collect()
}

fn redact_entry(key: &str, value: &Value, extra: &[String]) -> Value {
    if is_sensitive(key, extra) {
        Value::String(MASK.to_string())
    } else {
        redact_value(value, extra)
    }
}

fn redact_value(value: &Value, extra: &[String]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| (key.clone(), redact_entry(key, inner, extra)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| redact_value(item, extra)).collect())
        }
        other => other.clone(),
    }
}

fn is_sensitive(key: &str, extra: &[String]) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_SUBSTRINGS
        .iter()
        .any(|needle| lowered.contains(needle))
        || extra
            .iter()
            .any(|needle| lowered.contains(&needle.to_lowercase()))
}
