// In-memory backend
// Holds tables in a HashMap and implements the builder calls the facade makes

use super::filter::Predicate;
use super::{table::Table, Schema};
use crate::query::{OrderBy, QueryBuilder, Record, ResultSet, Row, SortDirection};
use crate::value::Value;
use anyhow::{anyhow, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

/// The query being assembled between `select` and `execute_query`
#[derive(Debug, Default)]
struct PendingQuery {
    columns: Vec<String>,
    table: Option<String>,
    where_text: Option<String>,
    order_by: Vec<OrderBy>,
}

/// The in-memory database
#[derive(Default)]
pub struct MemoryBackend {
    tables: HashMap<String, Table>,
    pending: PendingQuery,
}

impl MemoryBackend {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(anyhow!("Table '{}' already exists", name));
        }
        self.tables
            .insert(name.to_string(), Table::new(name.to_string(), schema));
        Ok(())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| anyhow!("Table '{}' not found", name))
    }
}

impl QueryBuilder for MemoryBackend {
    fn select(&mut self, columns: &[String]) {
        self.pending.columns = columns.to_vec();
    }

    fn from(&mut self, table: &str) {
        self.pending.table = Some(table.to_string());
    }

    fn where_clause(&mut self, text: &str) {
        self.pending.where_text = Some(text.to_string());
    }

    fn add_order_by(&mut self, column: &str, direction: SortDirection) {
        self.pending.order_by.push(OrderBy {
            column: column.to_string(),
            direction,
        });
    }

    fn execute_query(&mut self) -> Result<ResultSet> {
        let pending = std::mem::take(&mut self.pending);
        let table_name = pending
            .table
            .ok_or_else(|| anyhow!("No table specified in SELECT"))?;
        let table = self
            .tables
            .get(&table_name)
            .ok_or_else(|| anyhow!("Table '{}' not found", table_name))?;
        let schema = table.get_schema();

        let predicate = pending
            .where_text
            .as_deref()
            .map(|text| Predicate::parse(&table_name, text))
            .transpose()?;

        let mut rows = Vec::new();
        for row in table.scan() {
            let keep = match &predicate {
                Some(p) => p.matches(schema, row)?,
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        let mut sort_keys = Vec::with_capacity(pending.order_by.len());
        for directive in &pending.order_by {
            let index = schema
                .get_column_index(&directive.column)
                .ok_or_else(|| anyhow!("Column not found: {}", directive.column))?;
            sort_keys.push((index, directive.direction));
        }
        rows.sort_by(|a, b| {
            for &(index, direction) in &sort_keys {
                let ordering = order_values(&a.values[index], &b.values[index]);
                let ordering = match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        let projection: Vec<usize> = if pending.columns.is_empty()
            || pending.columns.iter().any(|c| c == "*")
        {
            (0..schema.columns.len()).collect()
        } else {
            pending
                .columns
                .iter()
                .map(|name| {
                    schema
                        .get_column_index(name)
                        .ok_or_else(|| anyhow!("Column not found: {}", name))
                })
                .collect::<Result<_>>()?
        };

        trace!(table = %table_name, matched = rows.len(), "executed query");

        Ok(ResultSet {
            column_names: projection
                .iter()
                .map(|&i| schema.columns[i].name.clone())
                .collect(),
            rows: rows
                .into_iter()
                .map(|row| Row {
                    values: projection.iter().map(|&i| row.values[i].clone()).collect(),
                })
                .collect(),
        })
    }

    fn insert(&mut self, table: &str, data: &Record) -> Result<u64> {
        self.table_mut(table)?.insert(data)
    }

    fn update(&mut self, table: &str, data: &Record, identifier: &Value) -> Result<u64> {
        self.table_mut(table)?.update(data, identifier)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains_key(table))
    }
}

/// NULLs sort first; values that cannot be compared keep their order
fn order_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.compare(b).unwrap_or(Ordering::Equal),
    }
}
