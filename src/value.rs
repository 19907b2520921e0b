// Scalar values
// Values are what merge fields resolve to and what the in-memory backend stores in rows

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Variables supplied per compile call, keyed by merge-field name (without the `$`)
pub type VariableMap = HashMap<String, Value>;

/// A single scalar value
///
/// Serialized untagged, so a JSON object like `{"minAge": 18, "name": "Ann"}`
/// deserializes straight into a [`VariableMap`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Canonical text form used when a value is spliced into query text
    ///
    /// Booleans render as `1`/`0`, the same way bare `true`/`false` literals
    /// are rendered by the scanner. NaN and infinities have no SQL literal
    /// and render as `NULL`.
    pub fn canonical_text(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Float(f) if !f.is_finite() => "NULL".to_string(),
            Value::Boolean(true) => "1".to_string(),
            Value::Boolean(false) => "0".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the value, coercing numeric-looking text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    /// Compare two values the way a lenient SQL engine does
    ///
    /// Numbers compare numerically, and text compares numerically against a
    /// number when it parses as one. NULL never compares.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            other => write!(f, "{}", other.canonical_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Parse a JSON object of scalars into a variable map
pub fn variables_from_json(json: &str) -> serde_json::Result<VariableMap> {
    serde_json::from_str(json)
}

/// Parse a single `name=value` assignment as typed on the command line
///
/// The value is typed the same way a bare token is: integers, floats,
/// `true`/`false` and `null` are recognised, anything else is text.
/// Surrounding quotes force text.
pub fn parse_assignment(assignment: &str) -> Option<(String, Value)> {
    let (name, raw) = assignment.split_once('=')?;
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), infer_value(raw.trim())))
}

fn infer_value(raw: &str) -> Value {
    let quoted = raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')));
    if quoted {
        return Value::Text(raw[1..raw.len() - 1].to_string());
    }
    if raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if raw.contains('.') {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Text(raw.to_string())
}
