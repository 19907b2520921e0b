// Query results
// Rows come back positionally, aligned with `column_names`

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A single row; values line up with the result set's column names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

/// Rows returned by a fetch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// An empty result with the given column names
    pub fn empty(column_names: Vec<String>) -> Self {
        Self {
            column_names,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_names.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(index)
    }

    /// All values of one column, in row order
    pub fn column(&self, column: &str) -> Vec<&Value> {
        match self.column_names.iter().position(|c| c == column) {
            Some(index) => self
                .rows
                .iter()
                .filter_map(|row| row.values.get(index))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Format the result as a box-drawn text table
    pub fn format(&self) -> String {
        if self.rows.is_empty() {
            return "No rows found".to_string();
        }

        let mut widths: Vec<usize> = self.column_names.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, value) in row.values.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(value.to_string().chars().count());
                }
            }
        }

        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{}{}{}\n", left, segments.join(mid), right)
        };

        let mut result = border("┌", "┬", "┐");

        result.push('│');
        for (name, width) in self.column_names.iter().zip(&widths) {
            result.push_str(&format!(" {:<width$} │", name, width = width));
        }
        result.push('\n');

        result.push_str(&border("├", "┼", "┤"));

        for row in &self.rows {
            result.push('│');
            for (value, width) in row.values.iter().zip(&widths) {
                result.push_str(&format!(" {:<width$} │", value.to_string(), width = width));
            }
            result.push('\n');
        }

        result.push_str(&border("└", "┴", "┘"));
        result.push_str(&format!("\n{} row(s) returned", self.rows.len()));
        result
    }
}
