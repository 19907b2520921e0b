// SQL emitter
// Renders a validated node list into WHERE-clause text in a single pass

use super::inject::resolve;
use super::node::{Comparator, Node, NodeList, Paren};
use crate::value::VariableMap;

/// Render nodes into WHERE text
///
/// Every clause and operator is followed by a single space, and `(` is not,
/// so `(a == 1)` renders as `(a = 1 ) `.
pub fn emit(nodes: &NodeList, variables: &VariableMap) -> String {
    let mut sql = String::new();

    for node in nodes {
        match node {
            Node::Clause(clause) if clause.comparator == Comparator::In => {
                sql.push_str(&format!("{} {} ", clause.column, clause.comparator.sql()));
            }
            Node::Clause(clause) => {
                let value = resolve(clause, variables);
                sql.push_str(&format!(
                    "{} {} {} ",
                    clause.column,
                    clause.comparator.sql(),
                    value
                ));
            }
            Node::Logical(logical) => {
                sql.push_str(logical.sql());
                sql.push(' ');
            }
            Node::Group(Paren::Open) => sql.push('('),
            Node::Group(Paren::Close) => sql.push_str(") "),
            Node::CommaGroup { items, .. } => {
                sql.push_str(&format!("({}) ", items.join(", ")));
            }
        }
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::node::{Clause, Logical};
    use crate::value::Value;

    fn push_all(nodes: Vec<Node>) -> NodeList {
        let mut list = NodeList::new();
        for (i, node) in nodes.into_iter().enumerate() {
            list.push(node, i).unwrap();
        }
        list
    }

    #[test]
    fn renders_each_node_kind() {
        let list = push_all(vec![
            Node::Clause(Clause {
                column: "a".into(),
                comparator: Comparator::Eq,
                value: "'x'".into(),
            }),
            Node::Logical(Logical::Or),
            Node::Group(Paren::Open),
            Node::Clause(Clause {
                column: "id".into(),
                comparator: Comparator::In,
                value: "1,2".into(),
            }),
            Node::CommaGroup {
                raw: "1,2".into(),
                items: vec!["'1'".into(), "'2'".into()],
            },
            Node::Group(Paren::Close),
        ]);
        assert_eq!(
            emit(&list, &VariableMap::new()),
            "a = 'x' OR (id IN ('1', '2') ) "
        );
    }

    #[test]
    fn injects_variables() {
        let list = push_all(vec![Node::Clause(Clause {
            column: "age".into(),
            comparator: Comparator::Ge,
            value: "$min".into(),
        })]);
        let mut vars = VariableMap::new();
        vars.insert("min".into(), Value::Integer(21));
        assert_eq!(emit(&list, &vars), "age >= 21 ");
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(emit(&NodeList::new(), &VariableMap::new()), "");
    }
}
