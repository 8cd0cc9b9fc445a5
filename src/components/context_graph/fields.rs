//! Ordered fallback resolution over raw trace objects.
//!
//! The upstream debug API has renamed fields across trace versions, so every
//! concept is read through one ordered key list. The first key holding a
//! value of the expected type wins; keys holding the wrong type are skipped
//! rather than treated as errors.

use serde_json::Value;

pub(crate) fn first_str<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a str> {
	keys.iter().find_map(|k| raw.get(k).and_then(Value::as_str))
}

pub(crate) fn first_f64(raw: &Value, keys: &[&str]) -> Option<f64> {
	keys.iter().find_map(|k| raw.get(k).and_then(Value::as_f64))
}

pub(crate) fn first_bool(raw: &Value, keys: &[&str]) -> Option<bool> {
	keys.iter().find_map(|k| raw.get(k).and_then(Value::as_bool))
}
