// Nodes produced by the scanner
// The node list is flat: parentheses are kept as their own nodes instead of building a tree,
// so grouping is passed through to the output exactly as written.

use crate::error::CompileError;

/// Comparison operator of a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Like,
    In,
}

impl Comparator {
    /// The operator as written in the SQL output
    pub fn sql(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Like => "LIKE",
            Comparator::In => "IN",
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    And,
    Or,
}

impl Logical {
    pub fn sql(&self) -> &'static str {
        match self {
            Logical::And => "AND",
            Logical::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paren {
    Open,
    Close,
}

/// A finalized `column comparator value` triple
///
/// `value` is the token text after literal coercion: quoted strings keep their
/// quotes, numbers and booleans are in canonical form, and `$name` merge fields
/// are kept as written until emission. For IN clauses it holds the raw list text
/// and the rendered list lives in the following [`Node::CommaGroup`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: String,
    pub comparator: Comparator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Clause(Clause),
    Logical(Logical),
    Group(Paren),
    /// Right-hand side of an IN clause
    CommaGroup {
        /// Text between the parentheses, as written
        raw: String,
        /// Items with their quoting replaced by single quotes
        items: Vec<String>,
    },
}

impl Node {
    fn describe(&self) -> &'static str {
        match self {
            Node::Clause(_) => "a clause",
            Node::Logical(_) => "a logical operator",
            Node::Group(Paren::Open) => "'('",
            Node::Group(Paren::Close) => "')'",
            Node::CommaGroup { .. } => "an IN list",
        }
    }
}

/// Ordered nodes of one compile pass, validated as they are appended
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeList {
    nodes: Vec<Node>,
}

impl NodeList {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Append a node after checking it against the previous one
    ///
    /// `position` is reported in the error when the node is rejected.
    pub fn push(&mut self, node: Node, position: usize) -> Result<(), CompileError> {
        self.check(&node, position)?;
        self.nodes.push(node);
        Ok(())
    }

    fn check(&self, node: &Node, position: usize) -> Result<(), CompileError> {
        let previous = self.nodes.last();
        let misplaced = |previous: &Node| CompileError::MisplacedNode {
            node: node.describe(),
            previous: previous.describe(),
            position,
        };

        match (node, previous) {
            (Node::Logical(_), None) => Err(CompileError::LeadingLogical { position }),
            (Node::Clause(_), Some(Node::Clause(_) | Node::CommaGroup { .. })) => {
                Err(CompileError::AdjacentClauses { position })
            }
            (Node::Clause(_), Some(prev @ Node::Group(Paren::Close))) => Err(misplaced(prev)),
            (Node::Logical(_), Some(prev @ (Node::Logical(_) | Node::Group(Paren::Open)))) => {
                Err(misplaced(prev))
            }
            (
                Node::Group(Paren::Open),
                Some(prev @ (Node::Clause(_) | Node::CommaGroup { .. } | Node::Group(Paren::Close))),
            ) => Err(misplaced(prev)),
            (Node::Group(Paren::Close), Some(prev @ (Node::Logical(_) | Node::Group(Paren::Open)))) => {
                Err(misplaced(prev))
            }
            (Node::CommaGroup { .. }, Some(Node::Clause(c))) if c.comparator == Comparator::In => {
                Ok(())
            }
            (Node::CommaGroup { .. }, Some(prev)) => Err(misplaced(prev)),
            (Node::CommaGroup { .. }, None) => Err(CompileError::UnexpectedCharacter {
                ch: '(',
                position,
            }),
            _ => Ok(()),
        }
    }

    /// Final checks once the whole input has been scanned
    pub fn finish(&self, position: usize) -> Result<(), CompileError> {
        if let Some(Node::Logical(_)) = self.nodes.last() {
            return Err(CompileError::TrailingLogical { position });
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
