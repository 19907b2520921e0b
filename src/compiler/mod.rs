// Expression compiler
// Turns the C-style filter language (`a == 1 && (b < 2 || c %% 'x')`) into WHERE-clause text.
// Pipeline: normalize -> scan (builds and validates nodes) -> emit (injects variables).

pub mod emit;
pub mod inject;
pub mod node;
pub mod normalize;
pub mod scanner;

pub use node::{Clause, Comparator, Logical, Node, NodeList, Paren};
pub use normalize::Normalization;

use crate::error::CompileError;
use crate::value::VariableMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Compiler configuration
///
/// Deserializes from JSON with every field optional, e.g.
/// `{"normalization": "strict", "in_lists": false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub normalization: Normalization,
    /// Accept `->` / `IN` lists
    pub in_lists: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            normalization: Normalization::Legacy,
            in_lists: true,
        }
    }
}

/// The expression compiler
///
/// Holds configuration only. Each call to [`Compiler::compile`] scans with its
/// own private state, so one instance can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Scan an expression into its validated node list without emitting SQL
    pub fn parse(&self, expression: &str) -> Result<NodeList, CompileError> {
        let text = normalize::normalize(
            expression,
            self.options.normalization,
            self.options.in_lists,
        );
        trace!(normalized = %text.as_string(), "normalized expression");
        scanner::scan(&text, self.options.in_lists)
    }

    /// Compile an expression into WHERE-clause text
    ///
    /// The output is a pure function of the expression, the variables and the
    /// options. Clauses and operators are each followed by one space.
    pub fn compile(
        &self,
        expression: &str,
        variables: &VariableMap,
    ) -> Result<String, CompileError> {
        let nodes = self.parse(expression)?;
        let sql = emit::emit(&nodes, variables);
        debug!(nodes = nodes.len(), %sql, "compiled expression");
        Ok(sql)
    }
}

/// Compile with default options
pub fn compile_where(expression: &str, variables: &VariableMap) -> Result<String, CompileError> {
    Compiler::new().compile(expression, variables)
}
