// Query builder interface
// The facade never talks to storage itself. It hands the WHERE text, selected columns and
// ORDER BY directives to an implementation of this trait.

use super::result::ResultSet;
use crate::value::Value;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column name -> value, as passed to insert and update
pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

/// One ORDER BY directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// The storage-side collaborator of the facade
///
/// `select`, `from`, `where_clause` and `add_order_by` accumulate a pending
/// query; `execute_query` runs it and clears the pending state. Implementations
/// own any retry or connection policy.
pub trait QueryBuilder {
    /// Columns to return; `*` selects every column
    fn select(&mut self, columns: &[String]);

    fn from(&mut self, table: &str);

    /// WHERE text exactly as produced by the compiler (or passed through raw)
    fn where_clause(&mut self, text: &str);

    fn add_order_by(&mut self, column: &str, direction: SortDirection);

    fn execute_query(&mut self) -> Result<ResultSet>;

    /// Insert one row, returning the number of rows written
    fn insert(&mut self, table: &str, data: &Record) -> Result<u64>;

    /// Update the row(s) identified by `identifier`, returning how many changed
    fn update(&mut self, table: &str, data: &Record, identifier: &Value) -> Result<u64>;

    fn table_exists(&self, table: &str) -> Result<bool>;
}
