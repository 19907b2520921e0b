// Table implementation
// A table is a schema plus its rows, kept in insertion order

use super::Schema;
use crate::query::{Record, Row};
use crate::value::Value;
use anyhow::{anyhow, Result};
use std::cmp::Ordering;

/// Represents a database table
pub struct Table {
    pub name: String,
    pub schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        Self {
            name,
            schema,
            rows: Vec::new(),
        }
    }

    /// Insert a row built from a column -> value record
    ///
    /// Columns missing from the record are stored as NULL.
    pub fn insert(&mut self, record: &Record) -> Result<u64> {
        self.check_columns(record)?;

        let mut values = Vec::with_capacity(self.schema.columns.len());
        for column in &self.schema.columns {
            let value = record.get(&column.name).cloned().unwrap_or(Value::Null);
            if value == Value::Null && !column.nullable {
                return Err(anyhow!("Column '{}' cannot be NULL", column.name));
            }
            values.push(value);
        }

        // Check primary key constraint (no duplicates)
        if let Some(pk_index) = self.schema.get_primary_key_index() {
            if self.find_by_key(pk_index, &values[pk_index]).next().is_some() {
                return Err(anyhow!("Primary key violation: duplicate value"));
            }
        }

        self.rows.push(Row { values });
        Ok(1)
    }

    /// Update the row whose primary key equals `identifier`
    /// Returns the number of rows updated
    pub fn update(&mut self, record: &Record, identifier: &Value) -> Result<u64> {
        self.check_columns(record)?;

        let pk_index = self
            .schema
            .get_primary_key_index()
            .ok_or_else(|| anyhow!("Table '{}' has no primary key", self.name))?;

        let targets: Vec<usize> = self.find_by_key(pk_index, identifier).collect();

        let pk_name = &self.schema.columns[pk_index].name;
        if let Some(new_key) = record.get(pk_name) {
            let clash = self
                .find_by_key(pk_index, new_key)
                .any(|i| !targets.contains(&i));
            if clash {
                return Err(anyhow!("Primary key violation: duplicate value"));
            }
        }

        let assignments: Vec<(usize, Value)> = record
            .iter()
            .filter_map(|(name, value)| {
                self.schema
                    .get_column_index(name)
                    .map(|i| (i, value.clone()))
            })
            .collect();

        for (index, value) in &assignments {
            if *value == Value::Null && !self.schema.columns[*index].nullable {
                return Err(anyhow!(
                    "Column '{}' cannot be NULL",
                    self.schema.columns[*index].name
                ));
            }
        }

        for &row_index in &targets {
            let row = &mut self.rows[row_index];
            for (index, value) in &assignments {
                row.values[*index] = value.clone();
            }
        }

        Ok(targets.len() as u64)
    }

    /// All rows in insertion order
    pub fn scan(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    fn check_columns(&self, record: &Record) -> Result<()> {
        match record
            .keys()
            .find(|name| self.schema.get_column_index(name).is_none())
        {
            Some(name) => Err(anyhow!("Column not found: {}", name)),
            None => Ok(()),
        }
    }

    fn find_by_key<'a>(
        &'a self,
        pk_index: usize,
        key: &'a Value,
    ) -> impl Iterator<Item = usize> + 'a {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, row)| row.values[pk_index].compare(key) == Some(Ordering::Equal))
            .map(|(i, _)| i)
    }
}
