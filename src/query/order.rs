// ORDER BY extraction
// Splits "ORDER BY name DESC, id" (the ORDER BY prefix is optional) into directives

use super::builder::{OrderBy, SortDirection};
use crate::error::FacadeError;
use regex::Regex;
use std::sync::LazyLock;

static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*order\s+by\s+").expect("valid ORDER BY prefix regex"));

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*(asc|desc)?\s*$")
        .expect("valid ORDER BY entry regex")
});

/// Parse ORDER BY text into directives; empty text yields none
pub fn parse_order_by(text: &str) -> Result<Vec<OrderBy>, FacadeError> {
    let body = PREFIX.replace(text, "");
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    body.split(',')
        .map(|entry| {
            let caps = ENTRY
                .captures(entry)
                .ok_or_else(|| FacadeError::InvalidOrderBy(entry.trim().to_string()))?;
            let direction = match caps.get(2) {
                Some(d) if d.as_str().eq_ignore_ascii_case("desc") => SortDirection::Desc,
                _ => SortDirection::Asc,
            };
            Ok(OrderBy {
                column: caps[1].to_string(),
                direction,
            })
        })
        .collect()
}
