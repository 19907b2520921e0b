// Variable injection
// Resolves `$name` merge fields against the caller's variables while a clause is emitted

use super::node::{Clause, Comparator};
use super::scanner::is_variable_ref;
use crate::value::{Value, VariableMap};
use std::borrow::Cow;
use tracing::warn;

/// Escape characters that would end or corrupt a quoted SQL literal
///
/// Covers the same set as MySQL's `mysql_real_escape_string`. This is text
/// escaping, not parameter binding.
pub fn escape_special(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// The value text of a clause with its merge field resolved
///
/// Unknown names are left as written, so `$name` reaches the output verbatim.
pub fn resolve<'c>(clause: &'c Clause, variables: &VariableMap) -> Cow<'c, str> {
    if clause.comparator == Comparator::In || !is_variable_ref(&clause.value) {
        return Cow::Borrowed(&clause.value);
    }

    let name = &clause.value[1..];
    let Some(value) = variables.get(name) else {
        warn!(variable = name, column = %clause.column, "unresolved merge field left in output");
        return Cow::Borrowed(&clause.value);
    };

    let escaped = escape_special(&value.canonical_text());
    let rendered = match (value, clause.comparator) {
        (_, Comparator::Like) if escaped.is_empty() => "''".to_string(),
        (_, Comparator::Like) => format!("'%{}%'", escaped),
        (Value::Text(_), _) => format!("'{}'", escaped),
        _ => escaped,
    };
    Cow::Owned(rendered)
}
