// Pre-scan normalization
// Two textual passes run before the scanner sees the expression: whitespace removal and
// the "IN" -> "->" rewrite that lets IN lists reuse the comparator machinery.

use serde::{Deserialize, Serialize};

/// How the pre-scan passes treat the raw text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Strip every space and replace every `IN` substring, string literals included
    #[default]
    Legacy,
    /// Skip whitespace outside string literals and only rewrite a standalone `IN` keyword
    Strict,
}

/// Normalized expression text plus the original offset of every character
#[derive(Debug, Clone)]
pub struct Normalized {
    pub chars: Vec<char>,
    pub offsets: Vec<usize>,
    /// Length of the original text in characters
    pub end: usize,
}

impl Normalized {
    /// Original position of the normalized character at `index`
    ///
    /// Indexes past the end map to the end of the original text.
    pub fn original_position(&self, index: usize) -> usize {
        self.offsets.get(index).copied().unwrap_or(self.end)
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

/// True when the character at `index` is preceded by an odd run of backslashes
pub(crate) fn is_escaped(chars: &[char], index: usize) -> bool {
    chars[..index]
        .iter()
        .rev()
        .take_while(|&&c| c == '\\')
        .count()
        % 2
        == 1
}

pub fn normalize(input: &str, mode: Normalization, in_lists: bool) -> Normalized {
    match mode {
        Normalization::Legacy => normalize_legacy(input, in_lists),
        Normalization::Strict => normalize_strict(input, in_lists),
    }
}

fn normalize_legacy(input: &str, in_lists: bool) -> Normalized {
    let mut chars = Vec::with_capacity(input.len());
    let mut offsets = Vec::with_capacity(input.len());
    let mut end = 0;

    for (i, ch) in input.chars().enumerate() {
        end = i + 1;
        if ch == ' ' {
            continue;
        }
        chars.push(ch);
        offsets.push(i);
    }

    // Runs over the space-stripped text, so "I N" becomes "->" as well
    if in_lists {
        let mut i = 0;
        while i + 1 < chars.len() {
            if chars[i] == 'I' && chars[i + 1] == 'N' {
                chars[i] = '-';
                chars[i + 1] = '>';
                i += 2;
            } else {
                i += 1;
            }
        }
    }

    Normalized {
        chars,
        offsets,
        end,
    }
}

fn normalize_strict(input: &str, in_lists: bool) -> Normalized {
    let source: Vec<char> = input.chars().collect();
    let mut chars = Vec::with_capacity(source.len());
    let mut offsets = Vec::with_capacity(source.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < source.len() {
        let ch = source[i];

        if let Some(q) = quote {
            if ch == q && !is_escaped(&source, i) {
                quote = None;
            }
            chars.push(ch);
            offsets.push(i);
            i += 1;
            continue;
        }

        match ch {
            '\'' | '"' if !is_escaped(&source, i) => {
                quote = Some(ch);
                chars.push(ch);
                offsets.push(i);
            }
            c if c.is_whitespace() => {}
            _ if in_lists && is_in_keyword(&source, i) => {
                chars.extend(['-', '>']);
                offsets.extend([i, i + 1]);
                i += 2;
                continue;
            }
            _ => {
                chars.push(ch);
                offsets.push(i);
            }
        }
        i += 1;
    }

    Normalized {
        chars,
        offsets,
        end: source.len(),
    }
}

/// `IN` / `in` as its own word: whitespace before, whitespace or `(` after
fn is_in_keyword(source: &[char], i: usize) -> bool {
    if i == 0 || i + 1 >= source.len() {
        return false;
    }
    let word = source[i].eq_ignore_ascii_case(&'i') && source[i + 1].eq_ignore_ascii_case(&'n');
    let before = source[i - 1].is_whitespace();
    let after = match source.get(i + 2) {
        Some(c) => c.is_whitespace() || *c == '(',
        None => false,
    };
    word && before && after
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(input: &str) -> String {
        normalize(input, Normalization::Legacy, true).as_string()
    }

    fn strict(input: &str) -> String {
        normalize(input, Normalization::Strict, true).as_string()
    }

    #[test]
    fn legacy_strips_spaces_everywhere() {
        assert_eq!(legacy("a == 'x y'"), "a=='xy'");
    }

    #[test]
    fn legacy_rewrites_every_in() {
        assert_eq!(legacy("id IN (1, 2)"), "id->(1,2)");
        assert_eq!(legacy("country == 'INDIA'"), "country=='->DIA'");
        assert_eq!(legacy("I N"), "->");
    }

    #[test]
    fn legacy_without_in_lists_keeps_in() {
        let n = normalize("id IN (1)", Normalization::Legacy, false);
        assert_eq!(n.as_string(), "idIN(1)");
    }

    #[test]
    fn offsets_point_into_original_text() {
        let n = normalize("a == 1", Normalization::Legacy, true);
        assert_eq!(n.offsets, vec![0, 2, 3, 5]);
        assert_eq!(n.original_position(3), 5);
        assert_eq!(n.original_position(4), 6);
    }

    #[test]
    fn strict_keeps_string_contents() {
        assert_eq!(strict("name == 'INDIA INK'"), "name=='INDIA INK'");
        assert_eq!(strict("id IN (1, 2)"), "id->(1,2)");
        assert_eq!(strict("id in ('a b')"), "id->('a b')");
    }

    #[test]
    fn strict_leaves_identifiers_containing_in() {
        assert_eq!(strict("INDEX == 1 && min < 2"), "INDEX==1&&min<2");
    }

    #[test]
    fn strict_respects_escaped_quotes() {
        assert_eq!(strict(r"a == 'it\'s here'"), r"a=='it\'s here'");
    }

    #[test]
    fn escape_parity() {
        let chars: Vec<char> = r#"a\'b\\'c"#.chars().collect();
        assert!(is_escaped(&chars, 2));
        assert!(!is_escaped(&chars, 6));
    }
}
