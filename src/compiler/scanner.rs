// Scanner
// A character-level state machine over the normalized expression. It tracks quote state,
// group depth and which half of the clause is being read, and appends validated nodes
// as soon as each one is complete.

use super::node::{Clause, Comparator, Logical, Node, NodeList, Paren};
use super::normalize::{is_escaped, Normalized};
use crate::error::{ClausePart, CompileError};

/// Scratch state of one compile call
///
/// Built fresh by [`scan`] and dropped when it returns, so nothing carries over
/// from one expression to the next.
struct ScanState<'a> {
    text: &'a Normalized,
    pos: usize,
    /// Open quote delimiter and the index it was opened at
    quote: Option<(char, usize)>,
    column: String,
    value: String,
    comparator: Option<Comparator>,
    is_column: bool,
    depth: usize,
    /// Index where the pending clause started
    clause_start: usize,
    in_lists: bool,
    nodes: NodeList,
}

/// Scan a normalized expression into a validated node list
pub fn scan(text: &Normalized, in_lists: bool) -> Result<NodeList, CompileError> {
    let mut state = ScanState {
        text,
        pos: 0,
        quote: None,
        column: String::new(),
        value: String::new(),
        comparator: None,
        is_column: true,
        depth: 0,
        clause_start: 0,
        in_lists,
        nodes: NodeList::new(),
    };
    state.run()?;
    Ok(state.nodes)
}

impl<'a> ScanState<'a> {
    fn current_char(&self) -> Option<char> {
        self.text.chars.get(self.pos).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.text.chars.get(self.pos + offset).copied()
    }

    /// Original position of a normalized index
    fn at(&self, index: usize) -> usize {
        self.text.original_position(index)
    }

    fn run(&mut self) -> Result<(), CompileError> {
        while let Some(ch) = self.current_char() {
            if let Some((quote, _)) = self.quote {
                if ch == quote && !is_escaped(&self.text.chars, self.pos) {
                    self.quote = None;
                }
                self.accumulate(ch);
                self.pos += 1;
                continue;
            }

            match ch {
                '\'' | '"' if !is_escaped(&self.text.chars, self.pos) => {
                    self.quote = Some((ch, self.pos));
                    self.accumulate(ch);
                    self.pos += 1;
                }
                '(' => self.open_paren()?,
                ')' => self.close_paren()?,
                '-' if self.starts_negative_number() => {
                    self.accumulate(ch);
                    self.pos += 1;
                }
                '<' | '>' | '=' | '!' | '%' | '-' => self.read_comparator(ch)?,
                '&' | '|' => self.read_logical(ch)?,
                _ => {
                    self.accumulate(ch);
                    self.pos += 1;
                }
            }
        }

        let end = self.text.end;
        if let Some((quote, opened)) = self.quote {
            return Err(CompileError::UnterminatedString {
                quote,
                position: self.at(opened),
            });
        }
        self.finalize_clause(self.pos)?;
        if self.depth > 0 {
            return Err(CompileError::UnclosedGroup {
                missing: self.depth,
                position: end,
            });
        }
        self.nodes.finish(end)
    }

    fn has_pending_clause(&self) -> bool {
        !self.column.is_empty() || !self.value.is_empty() || self.comparator.is_some()
    }

    fn accumulate(&mut self, ch: char) {
        if !self.has_pending_clause() {
            self.clause_start = self.pos;
        }
        if self.is_column {
            self.column.push(ch);
        } else {
            self.value.push(ch);
        }
    }

    /// A `-` right after a comparator, followed by a digit, is a sign
    fn starts_negative_number(&self) -> bool {
        !self.is_column
            && self.value.is_empty()
            && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
    }

    fn read_comparator(&mut self, ch: char) -> Result<(), CompileError> {
        if self.comparator.is_some() {
            if self.value.is_empty() {
                return Err(CompileError::IncompleteClause {
                    part: ClausePart::Value,
                    position: self.at(self.pos),
                });
            }
            return Err(CompileError::DuplicateComparator {
                position: self.at(self.pos),
            });
        }
        if self.column.is_empty() {
            return Err(CompileError::IncompleteClause {
                part: ClausePart::Column,
                position: self.at(self.pos),
            });
        }

        let next = self.peek_char(1);
        let (comparator, width) = match ch {
            '<' if next == Some('=') => (Comparator::Le, 2),
            '<' => (Comparator::Lt, 1),
            '>' if next == Some('=') => (Comparator::Ge, 2),
            '>' => (Comparator::Gt, 1),
            '=' => (self.expect_second(ch, '=')?, 2),
            '!' => (self.expect_second(ch, '=')?, 2),
            '%' => (self.expect_second(ch, '%')?, 2),
            _ => {
                let comparator = self.expect_second(ch, '>')?;
                if !self.in_lists {
                    return Err(CompileError::InListsDisabled {
                        position: self.at(self.pos),
                    });
                }
                (comparator, 2)
            }
        };

        self.comparator = Some(comparator);
        self.is_column = false;
        self.pos += width;
        Ok(())
    }

    /// Check the second character of a two-character comparator
    fn expect_second(&self, first: char, expected: char) -> Result<Comparator, CompileError> {
        match self.peek_char(1) {
            Some(c) if c == expected => {}
            Some(c) => {
                return Err(CompileError::ComparatorMismatch {
                    ch: c,
                    expected,
                    position: self.at(self.pos + 1),
                })
            }
            None => {
                return Err(CompileError::UnexpectedCharacter {
                    ch: first,
                    position: self.at(self.pos),
                })
            }
        }

        Ok(match first {
            '=' => Comparator::Eq,
            '!' => Comparator::Ne,
            '%' => Comparator::Like,
            _ => Comparator::In,
        })
    }

    fn read_logical(&mut self, ch: char) -> Result<(), CompileError> {
        if self.peek_char(1) != Some(ch) {
            return Err(CompileError::SingleLogical {
                ch,
                position: self.at(self.pos),
            });
        }

        self.finalize_clause(self.pos)?;
        let logical = if ch == '&' { Logical::And } else { Logical::Or };
        let position = self.at(self.pos);
        self.nodes.push(Node::Logical(logical), position)?;
        self.pos += 2;
        Ok(())
    }

    fn open_paren(&mut self) -> Result<(), CompileError> {
        if self.comparator == Some(Comparator::In) && self.value.is_empty() {
            return self.read_comma_group();
        }
        if self.has_pending_clause() {
            return Err(CompileError::UnexpectedCharacter {
                ch: '(',
                position: self.at(self.pos),
            });
        }

        let position = self.at(self.pos);
        self.nodes.push(Node::Group(Paren::Open), position)?;
        self.depth += 1;
        self.pos += 1;
        Ok(())
    }

    fn close_paren(&mut self) -> Result<(), CompileError> {
        if self.depth == 0 {
            return Err(CompileError::UnopenedGroup {
                position: self.at(self.pos),
            });
        }

        self.finalize_clause(self.pos)?;
        let position = self.at(self.pos);
        self.nodes.push(Node::Group(Paren::Close), position)?;
        self.depth -= 1;
        self.pos += 1;
        Ok(())
    }

    /// Capture `( item, item, ... )` after `->` up to the first unquoted `)`
    fn read_comma_group(&mut self) -> Result<(), CompileError> {
        let open = self.pos;
        let chars = &self.text.chars;
        let mut quote: Option<(char, usize)> = None;
        let mut close = None;

        for i in open + 1..chars.len() {
            let ch = chars[i];
            match quote {
                Some((q, _)) if ch == q && !is_escaped(chars, i) => quote = None,
                Some(_) => {}
                None if (ch == '\'' || ch == '"') && !is_escaped(chars, i) => {
                    quote = Some((ch, i))
                }
                None if ch == ')' => {
                    close = Some(i);
                    break;
                }
                None => {}
            }
        }

        let close = match (close, quote) {
            (Some(close), _) => close,
            (None, Some((q, opened))) => {
                return Err(CompileError::UnterminatedString {
                    quote: q,
                    position: self.at(opened),
                })
            }
            (None, None) => {
                return Err(CompileError::UnclosedGroup {
                    missing: self.depth + 1,
                    position: self.text.end,
                })
            }
        };

        let raw: String = chars[open + 1..close].iter().collect();
        if raw.is_empty() {
            return Err(CompileError::IncompleteClause {
                part: ClausePart::Value,
                position: self.at(close),
            });
        }
        let items = split_items(&raw).iter().map(|item| requote(item)).collect();

        let clause_position = self.at(self.clause_start);
        let list_position = self.at(open);
        let clause = Clause {
            column: std::mem::take(&mut self.column),
            comparator: Comparator::In,
            value: raw.clone(),
        };
        self.nodes.push(Node::Clause(clause), clause_position)?;
        self.nodes.push(Node::CommaGroup { raw, items }, list_position)?;

        self.reset_clause();
        self.pos = close + 1;
        Ok(())
    }

    /// Turn the pending column/comparator/value into a clause node
    fn finalize_clause(&mut self, index: usize) -> Result<(), CompileError> {
        if !self.has_pending_clause() {
            return Ok(());
        }

        let position = self.at(index);
        if self.column.is_empty() {
            return Err(CompileError::IncompleteClause {
                part: ClausePart::Column,
                position,
            });
        }
        let comparator = self.comparator.ok_or(CompileError::IncompleteClause {
            part: ClausePart::Comparator,
            position,
        })?;
        if self.value.is_empty() {
            return Err(CompileError::IncompleteClause {
                part: ClausePart::Value,
                position,
            });
        }
        if comparator == Comparator::In {
            return Err(CompileError::MissingInList {
                position: self.at(self.clause_start),
            });
        }

        let clause_position = self.at(self.clause_start);
        let clause = Clause {
            column: std::mem::take(&mut self.column),
            comparator,
            value: finalize_value(&self.value, comparator),
        };
        self.nodes.push(Node::Clause(clause), clause_position)?;
        self.reset_clause();
        Ok(())
    }

    fn reset_clause(&mut self) {
        self.column.clear();
        self.value.clear();
        self.comparator = None;
        self.is_column = true;
    }
}

/// `$name` with an identifier-shaped name
pub(crate) fn is_variable_ref(value: &str) -> bool {
    let Some(name) = value.strip_prefix('$') else {
        return false;
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_quoted(value: &str) -> bool {
    value.starts_with('\'') || value.starts_with('"')
}

/// Remove one pair of matching surrounding quotes, if present
fn strip_quotes(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if (first == '\'' || first == '"') && first == last => {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

fn looks_numeric(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Literal coercion applied when a clause is finalized
fn finalize_value(raw: &str, comparator: Comparator) -> String {
    if is_variable_ref(raw) {
        // LIKE wrapping of merge fields happens when they are injected
        return raw.to_string();
    }

    if comparator == Comparator::Like {
        let content = strip_quotes(raw);
        if content.is_empty() {
            return raw.to_string();
        }
        return format!("'%{}%'", escape_apostrophes(content));
    }

    if is_quoted(raw) {
        return raw.to_string();
    }
    coerce_bare(raw)
}

/// Numbers become canonical integers or floats, booleans become 1/0,
/// anything else passes through as written
fn coerce_bare(raw: &str) -> String {
    if looks_numeric(raw) {
        if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return f.to_string();
            }
        } else if let Ok(i) = raw.parse::<i64>() {
            return i.to_string();
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return "1".to_string();
    }
    if raw.eq_ignore_ascii_case("false") {
        return "0".to_string();
    }
    raw.to_string()
}

/// Split an IN list on commas that are outside quotes
fn split_items(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for (i, &ch) in chars.iter().enumerate() {
        match quote {
            Some(q) if ch == q && !is_escaped(&chars, i) => quote = None,
            Some(_) => {}
            None if (ch == '\'' || ch == '"') && !is_escaped(&chars, i) => quote = Some(ch),
            None if ch == ',' => {
                items.push(std::mem::take(&mut current));
                continue;
            }
            None => {}
        }
        current.push(ch);
    }
    items.push(current);
    items
}

/// Re-wrap one list item in single quotes
fn requote(item: &str) -> String {
    format!("'{}'", escape_apostrophes(strip_quotes(item)))
}

/// Backslash-escape every unescaped `'` so the text can sit inside a
/// single-quoted literal
///
/// Content taken from a double-quoted string may hold bare apostrophes;
/// content from a single-quoted one only holds escaped ones and comes back
/// unchanged.
fn escape_apostrophes(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut escaped = String::with_capacity(content.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '\'' && !is_escaped(&chars, i) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
