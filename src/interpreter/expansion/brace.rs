//! Brace expansion.
//!
//! Runs before everything else and is purely lexical: one word with
//! brace parts becomes several words, multiplying cartesian-style when
//! a word carries more than one brace.

use crate::ast::types::{BraceItem, Word, WordPart};

/// Expand the first brace part of `word`, recursing until none remain.
pub fn expand_braces(word: &Word) -> Vec<Word> {
    let brace_at = word
        .parts
        .iter()
        .position(|p| matches!(p, WordPart::BraceExpansion(_)));

    let idx = match brace_at {
        Some(i) => i,
        None => return vec![word.clone()],
    };

    let items = match &word.parts[idx] {
        WordPart::BraceExpansion(items) => items,
        _ => unreachable!(),
    };

    let mut out = Vec::new();
    for alternative in alternatives(items) {
        let mut parts = word.parts[..idx].to_vec();
        parts.extend(alternative);
        parts.extend_from_slice(&word.parts[idx + 1..]);
        // The spliced-in alternative may itself contain braces.
        out.extend(expand_braces(&Word::new(parts)));
    }
    out
}

fn alternatives(items: &[BraceItem]) -> Vec<Vec<WordPart>> {
    let mut out = Vec::new();
    for item in items {
        match item {
            BraceItem::Word(w) => out.push(w.parts.clone()),
            BraceItem::NumberRange { start, end, step, width } => {
                for n in number_range(*start, *end, *step) {
                    let text = if *width > 0 {
                        let sign = if n < 0 { "-" } else { "" };
                        format!("{}{:0width$}", sign, n.abs(), width = *width)
                    } else {
                        n.to_string()
                    };
                    out.push(vec![WordPart::Literal(text)]);
                }
            }
            BraceItem::CharRange { start, end, step } => {
                let (a, b) = (*start as u32, *end as u32);
                let step = step.unsigned_abs().max(1) as u32;
                let codes: Vec<u32> = if a <= b {
                    (a..=b).step_by(step as usize).collect()
                } else {
                    (b..=a).rev().step_by(step as usize).collect()
                };
                for code in codes {
                    if let Some(c) = char::from_u32(code) {
                        out.push(vec![WordPart::Literal(c.to_string())]);
                    }
                }
            }
        }
    }
    out
}

fn number_range(start: i64, end: i64, step: i64) -> Vec<i64> {
    let step = if step == 0 { 1 } else { step.abs() };
    let mut out = Vec::new();
    if start <= end {
        let mut n = start;
        while n <= end {
            out.push(n);
            n += step;
        }
    } else {
        let mut n = start;
        while n >= end {
            out.push(n);
            n -= step;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::word_parser::parse_word;

    fn expand_to_text(src: &str) -> Vec<String> {
        let word = parse_word(src).unwrap();
        expand_braces(&word)
            .iter()
            .map(|w| {
                w.parts
                    .iter()
                    .map(|p| match p {
                        WordPart::Literal(s) | WordPart::Glob(s) => s.clone(),
                        other => panic!("unexpected part {:?}", other),
                    })
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn simple_list() {
        assert_eq!(expand_to_text("{a,b,c}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn prefix_and_suffix() {
        assert_eq!(expand_to_text("x{a,b}y"), vec!["xay", "xby"]);
    }

    #[test]
    fn cartesian_product() {
        assert_eq!(
            expand_to_text("{a,b}{1,2}"),
            vec!["a1", "a2", "b1", "b2"]
        );
    }

    #[test]
    fn nested_braces() {
        assert_eq!(expand_to_text("{a,{b,c}}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn numeric_ranges() {
        assert_eq!(expand_to_text("{1..4}"), vec!["1", "2", "3", "4"]);
        assert_eq!(expand_to_text("{4..1}"), vec!["4", "3", "2", "1"]);
        assert_eq!(expand_to_text("{0..10..5}"), vec!["0", "5", "10"]);
        assert_eq!(expand_to_text("{-2..2..2}"), vec!["-2", "0", "2"]);
    }

    #[test]
    fn padded_numeric_range() {
        assert_eq!(expand_to_text("{01..03}"), vec!["01", "02", "03"]);
    }

    #[test]
    fn char_ranges() {
        assert_eq!(expand_to_text("{a..d}"), vec!["a", "b", "c", "d"]);
        assert_eq!(expand_to_text("{d..a}"), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn word_without_braces_is_unchanged() {
        assert_eq!(expand_to_text("plain"), vec!["plain"]);
    }

    #[test]
    fn empty_brace_is_literal() {
        // `{}` never parses as a brace part, so nothing multiplies.
        assert_eq!(expand_to_text("{}"), vec!["{}"]);
    }
}
