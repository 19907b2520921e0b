// Error types
// Compile errors abort a single compile call; facade errors wrap them together with
// backend failures

use thiserror::Error;

/// A syntax error raised while compiling an expression
///
/// Positions are 0-based character offsets into the text the caller passed in,
/// not into the normalized text the scanner walks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unexpected character '{ch}' at position {position}, expected '{expected}'")]
    ComparatorMismatch {
        ch: char,
        expected: char,
        position: usize,
    },

    #[error("lone '{ch}' at position {position}, logical operators must be doubled")]
    SingleLogical { ch: char, position: usize },

    #[error("unexpected '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("second comparator in one clause at position {position}")]
    DuplicateComparator { position: usize },

    #[error("unterminated string opened with {quote} at position {position}")]
    UnterminatedString { quote: char, position: usize },

    #[error("missing {missing} closing parenthesis(es) at end of input (position {position})")]
    UnclosedGroup { missing: usize, position: usize },

    #[error("closing parenthesis without matching opening at position {position}")]
    UnopenedGroup { position: usize },

    #[error("clause is missing its {part} at position {position}")]
    IncompleteClause {
        part: ClausePart,
        position: usize,
    },

    #[error("expression cannot start with a logical operator (position {position})")]
    LeadingLogical { position: usize },

    #[error("expression cannot end with a logical operator (position {position})")]
    TrailingLogical { position: usize },

    #[error("two clauses without a logical operator between them at position {position}")]
    AdjacentClauses { position: usize },

    #[error("{node} cannot follow {previous} at position {position}")]
    MisplacedNode {
        node: &'static str,
        previous: &'static str,
        position: usize,
    },

    #[error("IN comparator needs a parenthesized list at position {position}")]
    MissingInList { position: usize },

    #[error("IN lists are disabled, '->' at position {position}")]
    InListsDisabled { position: usize },
}

impl CompileError {
    /// Position of the offending character
    pub fn position(&self) -> usize {
        match self {
            CompileError::ComparatorMismatch { position, .. }
            | CompileError::SingleLogical { position, .. }
            | CompileError::UnexpectedCharacter { position, .. }
            | CompileError::DuplicateComparator { position }
            | CompileError::UnterminatedString { position, .. }
            | CompileError::UnclosedGroup { position, .. }
            | CompileError::UnopenedGroup { position }
            | CompileError::IncompleteClause { position, .. }
            | CompileError::LeadingLogical { position }
            | CompileError::TrailingLogical { position }
            | CompileError::AdjacentClauses { position }
            | CompileError::MisplacedNode { position, .. }
            | CompileError::MissingInList { position }
            | CompileError::InListsDisabled { position } => *position,
        }
    }
}

/// The part of a clause that was missing when it was finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClausePart {
    Column,
    Comparator,
    Value,
}

impl std::fmt::Display for ClausePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClausePart::Column => "column",
            ClausePart::Comparator => "comparator",
            ClausePart::Value => "value",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the execution facade
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("table '{0}' does not exist")]
    MissingTable(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("invalid ORDER BY entry '{0}'")]
    InvalidOrderBy(String),

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
