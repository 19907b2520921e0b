// WHERE evaluation
// The compiled WHERE text is parsed back with sqlparser (MySQL dialect, which matches the
// quoting the compiler emits) and evaluated row by row.

use super::Schema;
use crate::query::Row;
use crate::value::Value;
use anyhow::{anyhow, Result};
use sqlparser::ast::{BinaryOperator, Expr, SetExpr, Statement, UnaryOperator, Value as SqlValue};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use std::cmp::Ordering;

/// A parsed WHERE clause
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
}

impl Predicate {
    /// Parse WHERE text as it would appear in `SELECT * FROM table WHERE ...`
    pub fn parse(table: &str, where_text: &str) -> Result<Self> {
        let sql = format!("SELECT * FROM `{}` WHERE {}", table, where_text);
        let dialect = MySqlDialect {};
        let ast = Parser::parse_sql(&dialect, &sql)
            .map_err(|e| anyhow!("WHERE parsing error: {}", e))?;

        if ast.len() != 1 {
            return Err(anyhow!("WHERE text must not contain extra statements"));
        }

        let expr = match &ast[0] {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::Select(select) => select.selection.clone(),
                _ => None,
            },
            _ => None,
        };

        expr.map(|expr| Self { expr })
            .ok_or_else(|| anyhow!("Unsupported WHERE clause format"))
    }

    /// Does the row satisfy the predicate? NULL results count as false.
    pub fn matches(&self, schema: &Schema, row: &Row) -> Result<bool> {
        Ok(matches!(evaluate(&self.expr, schema, row)?, Value::Boolean(true)))
    }
}

fn evaluate(expr: &Expr, schema: &Schema, row: &Row) -> Result<Value> {
    match expr {
        Expr::Identifier(ident) => column_value(&ident.value, schema, row),
        Expr::CompoundIdentifier(idents) => match idents.last() {
            Some(ident) => column_value(&ident.value, schema, row),
            None => Err(anyhow!("Empty column reference")),
        },
        Expr::Value(value) => literal(value),
        Expr::Nested(inner) => evaluate(inner, schema, row),
        Expr::UnaryOp { op, expr } => {
            let value = evaluate(expr, schema, row)?;
            match (op, value) {
                (UnaryOperator::Minus, Value::Integer(i)) => Ok(Value::Integer(-i)),
                (UnaryOperator::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
                (UnaryOperator::Plus, v) => Ok(v),
                (UnaryOperator::Not, Value::Null) => Ok(Value::Null),
                (UnaryOperator::Not, v) => Ok(Value::Boolean(!truthy(&v))),
                (op, v) => Err(anyhow!("Unsupported unary operator {} on {}", op, v)),
            }
        }
        Expr::BinaryOp { left, op, right } => {
            let left = evaluate(left, schema, row)?;
            let right = evaluate(right, schema, row)?;
            binary(op, &left, &right)
        }
        Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => {
            let value = evaluate(expr, schema, row)?;
            let pattern = evaluate(pattern, schema, row)?;
            if value == Value::Null || pattern == Value::Null {
                return Ok(Value::Null);
            }
            let matched = like_match(&value.canonical_text(), &pattern.canonical_text());
            Ok(Value::Boolean(matched != *negated))
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let value = evaluate(expr, schema, row)?;
            if value == Value::Null {
                return Ok(Value::Null);
            }
            let mut found = false;
            for item in list {
                if value.compare(&evaluate(item, schema, row)?) == Some(Ordering::Equal) {
                    found = true;
                    break;
                }
            }
            Ok(Value::Boolean(found != *negated))
        }
        Expr::IsNull(inner) => Ok(Value::Boolean(evaluate(inner, schema, row)? == Value::Null)),
        Expr::IsNotNull(inner) => Ok(Value::Boolean(evaluate(inner, schema, row)? != Value::Null)),
        _ => Err(anyhow!("Unsupported WHERE expression: {}", expr)),
    }
}

fn column_value(name: &str, schema: &Schema, row: &Row) -> Result<Value> {
    let index = schema
        .get_column_index(name)
        .ok_or_else(|| anyhow!("Column not found: {}", name))?;
    Ok(row.values.get(index).cloned().unwrap_or(Value::Null))
}

fn literal(value: &SqlValue) -> Result<Value> {
    match value {
        SqlValue::Number(n, _) => {
            if n.contains(['.', 'e', 'E']) {
                Ok(Value::Float(n.parse()?))
            } else {
                Ok(Value::Integer(n.parse()?))
            }
        }
        SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => {
            Ok(Value::Text(s.clone()))
        }
        SqlValue::Boolean(b) => Ok(Value::Boolean(*b)),
        SqlValue::Null => Ok(Value::Null),
        _ => Err(anyhow!("Unsupported value expression: {}", value)),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Null => false,
        other => other.as_f64().is_some_and(|f| f != 0.0),
    }
}

fn binary(op: &BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    let ordering = || left.compare(right);
    let compare = |test: fn(Ordering) -> bool| match ordering() {
        Some(o) => Value::Boolean(test(o)),
        None => Value::Null,
    };

    Ok(match op {
        BinaryOperator::And => Value::Boolean(truthy(left) && truthy(right)),
        BinaryOperator::Or => Value::Boolean(truthy(left) || truthy(right)),
        BinaryOperator::Eq => compare(|o| o == Ordering::Equal),
        BinaryOperator::NotEq => compare(|o| o != Ordering::Equal),
        BinaryOperator::Lt => compare(|o| o == Ordering::Less),
        BinaryOperator::LtEq => compare(|o| o != Ordering::Greater),
        BinaryOperator::Gt => compare(|o| o == Ordering::Greater),
        BinaryOperator::GtEq => compare(|o| o != Ordering::Less),
        _ => return Err(anyhow!("Unsupported operator in WHERE clause: {}", op)),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    /// `%`
    AnyRun,
    /// `_`
    AnyOne,
    Literal(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyOne,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            c => LikeToken::Literal(c),
        });
    }
    tokens
}

/// SQL LIKE with `%` and `_`, case-insensitive; `\` escapes the next character
///
/// Greedy two-pointer match that only backtracks to the most recent `%`.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern = like_tokens(&pattern.to_lowercase());

    let (mut t, mut p) = (0, 0);
    // pattern index after the last `%` and the text index it was retried at
    let mut restart: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(LikeToken::AnyRun) => {
                p += 1;
                restart = Some((p, t));
                continue;
            }
            Some(LikeToken::AnyOne) => {
                t += 1;
                p += 1;
                continue;
            }
            Some(LikeToken::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
                continue;
            }
            _ => {}
        }
        match restart {
            Some((after_run, from)) => {
                p = after_run;
                t = from + 1;
                restart = Some((after_run, from + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|token| *token == LikeToken::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Column, DataType};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("id", DataType::Integer),
            Column::new("name", DataType::Text),
            Column::new("price", DataType::Float),
        ])
    }

    fn row(id: i64, name: &str, price: f64) -> Row {
        Row {
            values: vec![Value::Integer(id), Value::Text(name.into()), Value::Float(price)],
        }
    }

    fn check(where_text: &str, row: &Row) -> bool {
        Predicate::parse("items", where_text)
            .unwrap()
            .matches(&schema(), row)
            .unwrap()
    }

    #[test]
    fn comparisons_and_logic() {
        let r = row(3, "Wood screw", 0.5);
        assert!(check("id = 3 ", &r));
        assert!(check("id >= 3 AND price < 1 ", &r));
        assert!(!check("id != 3 OR (price > 1 ) ", &r));
        assert!(check("id > -1 ", &r));
    }

    #[test]
    fn like_and_in() {
        let r = row(2, "Wood Screw", 0.5);
        assert!(check("name LIKE '%screw%' ", &r));
        assert!(!check("name LIKE '%bolt%' ", &r));
        assert!(check("id IN ('1', '2', '3') ", &r));
        assert!(!check("id IN ('4') ", &r));
    }

    #[test]
    fn backslash_escaped_strings() {
        let r = row(1, "O'Brien", 1.0);
        assert!(check(r"name = 'O\'Brien' ", &r));
    }

    #[test]
    fn unknown_columns_fail() {
        let p = Predicate::parse("items", "ghost = 1").unwrap();
        assert!(p.matches(&schema(), &row(1, "a", 1.0)).is_err());
    }

    #[test]
    fn like_patterns() {
        assert!(like_match("hello", "h_llo"));
        assert!(like_match("hello", "%LL%"));
        assert!(!like_match("hello", "h_lo"));
        assert!(like_match("50%", "50\\%"));
        assert!(!like_match("500", "50\\%"));
        assert!(like_match("", "%"));
        assert!(!like_match("", "_"));
        assert!(like_match("abcabd", "%ab_"));
        assert!(!like_match("abc", "%b"));
    }

    #[test]
    fn many_wildcards_stay_linear() {
        let text = "a".repeat(200);
        let pattern = format!("{}b", "%a".repeat(40));
        assert!(!like_match(&text, &pattern));
        assert!(like_match(&text, &"%a".repeat(40)));
    }
}
