// Storage module - an in-memory implementation of the query builder interface
// Real deployments inject their own backend; this one backs the demo and the tests.

pub mod filter;
pub mod memory;
pub mod table;

pub use memory::MemoryBackend;
pub use table::Table;

use serde::{Deserialize, Serialize};

/// Represents the schema (structure) of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

/// Represents a single column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub nullable: bool,
}

/// Declared column types; used for display and NULL checks, values are not coerced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
}

impl Column {
    /// A nullable, non-key column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            nullable: true,
        }
    }

    /// Mark the column as the primary key (implies NOT NULL)
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Find the index of a column by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Get the primary key column index
    pub fn get_primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|col| col.primary_key)
    }
}
