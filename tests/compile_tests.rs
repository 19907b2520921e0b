// tests/compile_tests.rs

use whereql::compiler::{Node, Paren};
use whereql::{compile_where, CompileError, CompileOptions, Compiler, Normalization, Value, VariableMap};

fn compile(expr: &str) -> Result<String, CompileError> {
    compile_where(expr, &VariableMap::new())
}

fn vars(pairs: &[(&str, Value)]) -> VariableMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ============================================================================
// Reference outputs
// ============================================================================

#[test]
fn test_simple_equality() {
    assert_eq!(compile("a == 1").unwrap(), "a = 1 ");
}

#[test]
fn test_grouped_expression() {
    let sql = compile("a == 'x' && (b < 2 || c >= 3)").unwrap();
    assert_eq!(sql.trim_end(), "a = 'x' AND (b < 2 OR c >= 3 )");
}

#[test]
fn test_like() {
    assert_eq!(compile("price %% 'screw'").unwrap(), "price LIKE '%screw%' ");
}

#[test]
fn test_in_list_quotes_every_item() {
    assert_eq!(compile("id -> (1,2,3)").unwrap(), "id IN ('1', '2', '3') ");
    assert_eq!(compile("id IN (1, 2, 3)").unwrap(), "id IN ('1', '2', '3') ");
}

#[test]
fn test_every_comparator() {
    let cases = vec![
        ("a < 1", "a < 1 "),
        ("a <= 1", "a <= 1 "),
        ("a > 1", "a > 1 "),
        ("a >= 1", "a >= 1 "),
        ("a == 1", "a = 1 "),
        ("a != 1", "a != 1 "),
    ];
    for (input, expected) in cases {
        assert_eq!(compile(input).unwrap(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_no_precedence_between_and_or() {
    // emitted in source order, grouping only where written
    assert_eq!(
        compile("a == 1 || b == 2 && c == 3").unwrap(),
        "a = 1 OR b = 2 AND c = 3 "
    );
}

#[test]
fn test_nested_groups() {
    assert_eq!(
        compile("((a == 1 || b == 2) && c == 3)").unwrap(),
        "((a = 1 OR b = 2 ) AND c = 3 ) "
    );
}

#[test]
fn test_logical_count_matches_input() {
    let inputs = [
        "a == 1",
        "a == 1 && b == 2",
        "a == 1 && (b == 2 || c == 3) && d -> (1, 2)",
        "(a == '&&' || b == '||') && c %% 'x'",
    ];
    for input in inputs {
        let sql = compile(input).unwrap();
        let emitted = sql
            .split_whitespace()
            .filter(|t| *t == "AND" || *t == "OR")
            .count();
        let normalized: String = input.chars().filter(|c| *c != ' ').collect();
        let mut written = 0;
        let mut quote = None;
        let chars: Vec<char> = normalized.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match (quote, chars[i]) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'') | (None, '"') => quote = Some(chars[i]),
                (None, '&') | (None, '|') => {
                    written += 1;
                    i += 1;
                }
                _ => {}
            }
            i += 1;
        }
        assert_eq!(emitted, written, "input: {}", input);
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_literal_coercion() {
    assert_eq!(compile("a == 010").unwrap(), "a = 10 ");
    assert_eq!(compile("a == 2.50").unwrap(), "a = 2.5 ");
    assert_eq!(compile("a == True").unwrap(), "a = 1 ");
    assert_eq!(compile("a == FALSE").unwrap(), "a = 0 ");
    assert_eq!(compile("a > -4").unwrap(), "a > -4 ");
}

#[test]
fn test_bare_words_pass_through_unescaped() {
    assert_eq!(compile("a == b").unwrap(), "a = b ");
    assert!(matches!(
        compile("a == NOW()x"),
        Err(CompileError::UnexpectedCharacter { ch: '(', .. })
    ));
}

#[test]
fn test_quoted_strings_keep_their_quotes() {
    assert_eq!(compile("a == \"x\"").unwrap(), "a = \"x\" ");
    assert_eq!(compile(r"a == 'it\'s'").unwrap(), r"a = 'it\'s' ");
}

// ============================================================================
// Legacy normalization quirks
// ============================================================================

#[test]
fn test_spaces_stripped_inside_strings() {
    assert_eq!(compile("name == 'John Smith'").unwrap(), "name = 'JohnSmith' ");
}

#[test]
fn test_in_substring_rewritten() {
    // "INDIA" contains IN, which becomes "->" before scanning
    assert_eq!(compile("country == 'INDIA'").unwrap(), "country = '->DIA' ");
}

#[test]
fn test_strict_mode_avoids_the_quirks() {
    let compiler = Compiler::with_options(CompileOptions {
        normalization: Normalization::Strict,
        ..CompileOptions::default()
    });
    let vars = VariableMap::new();
    assert_eq!(
        compiler.compile("name == 'John Smith'", &vars).unwrap(),
        "name = 'John Smith' "
    );
    assert_eq!(
        compiler.compile("country == 'INDIA'", &vars).unwrap(),
        "country = 'INDIA' "
    );
    assert_eq!(
        compiler.compile("id in (1, 2)", &vars).unwrap(),
        "id IN ('1', '2') "
    );
}

#[test]
fn test_reduced_dialect_without_in_lists() {
    let compiler = Compiler::with_options(CompileOptions {
        in_lists: false,
        ..CompileOptions::default()
    });
    let vars = VariableMap::new();
    assert_eq!(
        compiler.compile("country == 'INDIA'", &vars).unwrap(),
        "country = 'INDIA' "
    );
    assert!(matches!(
        compiler.compile("id -> (1)", &vars),
        Err(CompileError::InListsDisabled { .. })
    ));
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_variable_injection() {
    let v = vars(&[("minAge", Value::from(18))]);
    assert_eq!(compile_where("age > $minAge", &v).unwrap(), "age > 18 ");
}

#[test]
fn test_missing_variable_left_verbatim() {
    assert_eq!(compile("age > $minAge").unwrap(), "age > $minAge ");
}

#[test]
fn test_string_variable_is_escaped_and_quoted() {
    let v = vars(&[("name", Value::from("Robert'); DROP TABLE students;--"))]);
    assert_eq!(
        compile_where("name == $name", &v).unwrap(),
        r"name = 'Robert\'); DROP TABLE students;--' "
    );
}

#[test]
fn test_variables_inside_groups_and_like() {
    let v = vars(&[
        ("q", Value::from("bolt")),
        ("max", Value::from(2.5)),
        ("active", Value::from(true)),
    ]);
    assert_eq!(
        compile_where("(name %% $q || price <= $max) && active == $active", &v).unwrap(),
        "(name LIKE '%bolt%' OR price <= 2.5 ) AND active = 1 "
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unclosed_group_reports_one_missing() {
    let err = compile("a == 1 && (b == 2").unwrap_err();
    assert!(matches!(err, CompileError::UnclosedGroup { missing: 1, .. }));
    assert!(err.to_string().contains("missing 1 closing"));
}

#[test]
fn test_error_positions_refer_to_original_text() {
    let err = compile("a == 1 && b =! 2").unwrap_err();
    assert_eq!(
        err,
        CompileError::ComparatorMismatch {
            ch: '!',
            expected: '=',
            position: 13
        }
    );
    assert_eq!(err.position(), 13);
    assert!(err.to_string().contains("position 13"));
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(compile("&& a == 1"), Err(CompileError::LeadingLogical { .. })));
    assert!(matches!(compile("a == 1 &&"), Err(CompileError::TrailingLogical { .. })));
    assert!(matches!(compile("a == 1 && || b == 2"), Err(CompileError::MisplacedNode { .. })));
    assert!(matches!(compile("(a == 1)(b == 2)"), Err(CompileError::MisplacedNode { .. })));
    assert!(matches!(compile("a == 1)"), Err(CompileError::UnopenedGroup { .. })));
    assert!(matches!(compile("a == \"x"), Err(CompileError::UnterminatedString { quote: '"', .. })));
    assert!(matches!(compile("id -> (1, 2"), Err(CompileError::UnclosedGroup { .. })));
    assert!(matches!(compile("()"), Err(CompileError::MisplacedNode { .. })));
}

// ============================================================================
// Determinism and isolation
// ============================================================================

#[test]
fn test_deterministic_output() {
    let v = vars(&[("x", Value::from("a")), ("y", Value::from(3))]);
    let expr = "(a == $x || b -> ('p', \"q\")) && c %% 'z' && d < $y";
    let first = compile_where(expr, &v).unwrap();
    let second = compile_where(expr, &v).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_sequential_calls_do_not_leak() {
    let compiler = Compiler::new();
    let empty = VariableMap::new();
    let fresh = compiler.compile("z == 9", &empty).unwrap();

    let shared = Compiler::new();
    let _ = shared.compile("a == 'open && (b", &empty);
    let _ = shared.compile("x -> (1, 2", &empty);
    assert_eq!(shared.compile("z == 9", &empty).unwrap(), fresh);
}

#[test]
fn test_parallel_compiles_share_one_compiler() {
    let compiler = std::sync::Arc::new(Compiler::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let compiler = compiler.clone();
            std::thread::spawn(move || {
                let v = vars(&[("n", Value::from(i as i64))]);
                compiler.compile("(a == $n)", &v).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("(a = {} ) ", i));
    }
}

#[test]
fn test_parse_exposes_flat_nodes() {
    let nodes = Compiler::new().parse("(a == 1)").unwrap();
    assert_eq!(nodes.nodes().first(), Some(&Node::Group(Paren::Open)));
    assert_eq!(nodes.nodes().last(), Some(&Node::Group(Paren::Close)));
}

#[test]
fn test_missing_value_before_sign_or_comparator() {
    assert!(matches!(
        compile("a == -"),
        Err(CompileError::IncompleteClause { position: 5, .. })
    ));
}

#[test]
fn test_double_quoted_like_value_with_apostrophe() {
    assert_eq!(
        compile("name %% \"O'Neil\"").unwrap(),
        r"name LIKE '%O\'Neil%' "
    );
}

#[test]
fn test_non_finite_float_variable_renders_null() {
    let v = vars(&[("f", Value::from(f64::INFINITY))]);
    assert_eq!(compile_where("a == $f", &v).unwrap(), "a = NULL ");
}
