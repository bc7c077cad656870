//! Glob pattern matching.
//!
//! One translation, four consumers: pathname expansion, `case` arms,
//! `[[ == ]]`, and the `#`/`%`/`/` parameter operators all funnel
//! through here. A backslash in the pattern marks the next character as
//! literal; the expander uses that to protect quoted text.

use regex_lite::Regex;

/// Translate a shell glob into a regex fragment (no anchors).
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                i += 1;
                if let Some(&next) = chars.get(i) {
                    push_escaped(&mut out, next);
                } else {
                    out.push_str("\\\\");
                }
            }
            '[' => {
                // Find the closing bracket; `]` first in the class is
                // literal. An unclosed class is a literal `[`.
                let mut j = i + 1;
                if chars.get(j) == Some(&'!') || chars.get(j) == Some(&'^') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j < chars.len() {
                    let mut class = String::from("[");
                    let mut k = i + 1;
                    if chars.get(k) == Some(&'!') || chars.get(k) == Some(&'^') {
                        class.push('^');
                        k += 1;
                    }
                    while k < j {
                        let cc = chars[k];
                        if cc == '\\' || (cc == '[' && chars.get(k + 1) == Some(&':')) {
                            class.push('\\');
                        }
                        class.push(cc);
                        k += 1;
                    }
                    class.push(']');
                    out.push_str(&class);
                    i = j;
                } else {
                    out.push_str("\\[");
                }
            }
            other => push_escaped(&mut out, other),
        }
        i += 1;
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    if "\\^$.|?*+()[]{}".contains(c) {
        out.push('\\');
    }
    out.push(c);
}

/// Full-string glob match.
pub fn matches_glob(pattern: &str, text: &str) -> bool {
    match compile_anchored(pattern) {
        Some(re) => re.is_match(text),
        None => false,
    }
}

/// Compile a glob as an anchored regex.
pub fn compile_anchored(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^(?s:{})$", glob_to_regex(pattern))).ok()
}

/// Does the pattern contain active (unescaped) glob metacharacters?
pub fn has_glob_chars(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '?' | '[' => return true,
            _ => {}
        }
    }
    false
}

/// Strip pattern-escaping backslashes, yielding the literal text.
pub fn unescape(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(n) = chars.next() {
                out.push(n);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape glob metacharacters so the text matches only itself. Applied
/// to quoted word parts before they join a pattern.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_and_question() {
        assert!(matches_glob("*.txt", "file.txt"));
        assert!(!matches_glob("*.txt", "file.txt.bak"));
        assert!(matches_glob("a?c", "abc"));
        assert!(!matches_glob("a?c", "abbc"));
    }

    #[test]
    fn char_classes() {
        assert!(matches_glob("[ab]x", "ax"));
        assert!(matches_glob("[ab]x", "bx"));
        assert!(!matches_glob("[ab]x", "cx"));
        assert!(matches_glob("[!a]x", "bx"));
        assert!(!matches_glob("[!a]x", "ax"));
        assert!(matches_glob("[0-9]*", "42 files"));
    }

    #[test]
    fn regex_metachars_are_literal() {
        assert!(matches_glob("a.b", "a.b"));
        assert!(!matches_glob("a.b", "axb"));
        assert!(matches_glob("a+b", "a+b"));
        assert!(matches_glob("(x)", "(x)"));
    }

    #[test]
    fn escaped_star_is_literal() {
        assert!(matches_glob("\\*", "*"));
        assert!(!matches_glob("\\*", "anything"));
    }

    #[test]
    fn star_crosses_newlines() {
        assert!(matches_glob("a*b", "a\nx\nb"));
    }

    #[test]
    fn glob_char_detection() {
        assert!(has_glob_chars("*.rs"));
        assert!(has_glob_chars("x[ab]"));
        assert!(!has_glob_chars("plain"));
        assert!(!has_glob_chars("\\*escaped"));
    }

    #[test]
    fn escape_then_match_is_identity() {
        let text = "weird*name?.txt";
        assert!(matches_glob(&escape_literal(text), text));
        assert!(!matches_glob(&escape_literal("*"), "x"));
    }

    #[test]
    fn unescape_strips_protection() {
        assert_eq!(unescape("a\\*b"), "a*b");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        assert!(matches_glob("a[b", "a[b"));
    }
}
