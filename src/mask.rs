use serde_json::Value;
use std::collections::BTreeMap;

/// Context keys masked by default.
pub const DEFAULT_MASKED_KEYS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "secret_key",
    "api_key",
    "authorization",
];

const MASK_CHAR: char = '*';
const MIN_MASK_LEN: usize = 3;

/// Return a copy of `context` with every sensitive key's value replaced by
/// a run of `*`.
///
/// Keys are compared case-insensitively against `masked_keys`. Nested
/// objects and arrays are walked, so `{"db": {"password": "x"}}` is masked
/// too. The mask length follows the textual length of the hidden value,
/// never shorter than three characters.
pub fn mask_context(
    context: &BTreeMap<String, Value>,
    masked_keys: &[String],
) -> BTreeMap<String, Value> {
    context
        .iter()
        .map(|(key, value)| {
            let value = if is_masked(key, masked_keys) {
                mask_value(value)
            } else {
                mask_nested(value, masked_keys)
            };
            (key.clone(), value)
        })
        .collect()
}

fn is_masked(key: &str, masked_keys: &[String]) -> bool {
    masked_keys.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn mask_nested(value: &Value, masked_keys: &[String]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let inner = if is_masked(key, masked_keys) {
                        mask_value(inner)
                    } else {
                        mask_nested(inner, masked_keys)
                    };
                    (key.clone(), inner)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items.iter().map(|item| mask_nested(item, masked_keys)).collect(),
        ),
        other => other.clone(),
    }
}

fn mask_value(value: &Value) -> Value {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::Null => 0,
        other => other.to_string().chars().count(),
    };
    Value::String(MASK_CHAR.to_string().repeat(len.max(MIN_MASK_LEN)))
}
