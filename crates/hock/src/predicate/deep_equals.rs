//! Deep structural equality over JSON values.
//!
//! Objects are compared as unordered key/value maps, arrays element by element
//! in order. Numbers compare by numeric value, so `1` equals `1.0`.

use serde_json::{Number, Value};

/// Compare two JSON values structurally.
///
/// - Object key order never affects the result.
/// - Arrays are order-sensitive and must have the same length.
/// - Both sides must have exactly the same set of object keys (this is full
///   equality, not containment).
pub fn deep_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && b.iter().all(|(key, expected_val)| {
                    a.get(key)
                        .is_some_and(|actual_val| deep_equals(actual_val, expected_val))
                })
        }
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Convert body text into its structural form.
///
/// A non-empty string is parsed as JSON text. The empty string has no JSON
/// form and is kept as an empty string value.
pub fn to_structural(text: &str) -> Result<Value, serde_json::Error> {
    if text.is_empty() {
        return Ok(Value::String(String::new()));
    }
    serde_json::from_str(text)
}
