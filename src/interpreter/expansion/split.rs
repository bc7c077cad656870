//! Field assembly and IFS word splitting.
//!
//! Expansion produces a stream of text pieces, each either quoted
//! (never split, never globbed) or unquoted. The accumulator assembles
//! them into argv fields, applying IFS splitting to unquoted pieces and
//! tracking a parallel "pattern" rendition in which quoted characters
//! are escaped so the glob phase leaves them alone.

use crate::interpreter::pattern::escape_literal;

/// One assembled field, pre-glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Quote-removed text: the argv value if no glob match applies.
    pub text: String,
    /// Same text with quoted characters backslash-escaped, for the
    /// pathname-expansion phase.
    pub pattern: String,
}

#[derive(Debug, Default)]
pub struct FieldAccumulator {
    fields: Vec<Field>,
    text: String,
    pattern: String,
    /// A field exists once it has content or a quoted contribution;
    /// empty unstarted fields are dropped at the end.
    started: bool,
}

impl FieldAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote-protected text: joins the current field verbatim.
    pub fn push_quoted(&mut self, text: &str) {
        self.text.push_str(text);
        self.pattern.push_str(&escape_literal(text));
        self.started = true;
    }

    /// Unquoted text with no splitting (assignment values, redirect
    /// targets). Glob characters stay active.
    pub fn push_raw(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.push_str(text);
            self.pattern.push_str(text);
            self.started = true;
        }
    }

    /// Unquoted expansion output: split on IFS.
    ///
    /// Whitespace IFS characters collapse and never make empty fields;
    /// a non-whitespace IFS character (with adjacent IFS whitespace)
    /// always terminates the current field, empty or not.
    pub fn push_split(&mut self, text: &str, ifs: &str) {
        if ifs.is_empty() {
            self.push_raw(text);
            return;
        }
        let ws: Vec<char> = ifs.chars().filter(|c| c.is_whitespace()).collect();
        let nws: Vec<char> = ifs.chars().filter(|c| !c.is_whitespace()).collect();

        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if nws.contains(&c) {
                self.close(true);
                i += 1;
                while i < chars.len() && ws.contains(&chars[i]) {
                    i += 1;
                }
            } else if ws.contains(&c) {
                let mut j = i;
                while j < chars.len() && ws.contains(&chars[j]) {
                    j += 1;
                }
                if j < chars.len() && nws.contains(&chars[j]) {
                    // whitespace glued to a non-whitespace separator:
                    // one separator total
                    self.close(true);
                    i = j + 1;
                    while i < chars.len() && ws.contains(&chars[i]) {
                        i += 1;
                    }
                } else {
                    self.close(false);
                    i = j;
                }
            } else {
                self.text.push(c);
                self.pattern.push(c);
                self.started = true;
                i += 1;
            }
        }
    }

    /// Hard field boundary, as between `"$@"` elements.
    pub fn force_break(&mut self) {
        self.close(true);
    }

    fn close(&mut self, force: bool) {
        if self.started || force {
            self.fields.push(Field {
                text: std::mem::take(&mut self.text),
                pattern: std::mem::take(&mut self.pattern),
            });
            self.started = false;
        }
    }

    pub fn finish(mut self) -> Vec<Field> {
        self.close(false);
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IFS: &str = " \t\n";

    fn split(text: &str, ifs: &str) -> Vec<String> {
        let mut acc = FieldAccumulator::new();
        acc.push_split(text, ifs);
        acc.finish().into_iter().map(|f| f.text).collect()
    }

    #[test]
    fn whitespace_splitting_collapses() {
        assert_eq!(split("a b", IFS), vec!["a", "b"]);
        assert_eq!(split("  a   b  ", IFS), vec!["a", "b"]);
        assert_eq!(split("a\tb\nc", IFS), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_input_yields_no_fields() {
        assert_eq!(split("", IFS), Vec::<String>::new());
        assert_eq!(split("   ", IFS), Vec::<String>::new());
    }

    #[test]
    fn non_whitespace_separators_keep_empties() {
        assert_eq!(split("a:b", ":"), vec!["a", "b"]);
        assert_eq!(split("a::b", ":"), vec!["a", "", "b"]);
        assert_eq!(split(":a", ":"), vec!["", "a"]);
        assert_eq!(split("a:", ":"), vec!["a"]);
        assert_eq!(split("a::", ":"), vec!["a", ""]);
    }

    #[test]
    fn mixed_ifs_collapses_adjacent_whitespace() {
        assert_eq!(split("a : b", ": "), vec!["a", "b"]);
        assert_eq!(split("a :: b", ": "), vec!["a", "", "b"]);
        assert_eq!(split(" : a", ": "), vec!["", "a"]);
    }

    #[test]
    fn empty_ifs_means_no_split() {
        assert_eq!(split("a b c", ""), vec!["a b c"]);
    }

    #[test]
    fn quoted_content_joins_fields() {
        let mut acc = FieldAccumulator::new();
        acc.push_raw("x");
        acc.push_split(" a", IFS);
        let fields = acc.finish();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].text, "x");
        assert_eq!(fields[1].text, "a");
    }

    #[test]
    fn quoted_empty_field_is_kept() {
        let mut acc = FieldAccumulator::new();
        acc.push_quoted("");
        let fields = acc.finish();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].text, "");
    }

    #[test]
    fn quoted_pattern_is_escaped() {
        let mut acc = FieldAccumulator::new();
        acc.push_quoted("*");
        acc.push_raw("*");
        let fields = acc.finish();
        assert_eq!(fields[0].text, "**");
        assert_eq!(fields[0].pattern, "\\**");
    }

    #[test]
    fn force_break_separates_fields() {
        let mut acc = FieldAccumulator::new();
        acc.push_quoted("a");
        acc.force_break();
        acc.push_quoted("b");
        let fields = acc.finish();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn separator_joining_prior_content() {
        // Unquoted "a b" after existing content extends the first field
        let mut acc = FieldAccumulator::new();
        acc.push_raw("pre");
        acc.push_split("a b", IFS);
        let fields = acc.finish();
        assert_eq!(fields[0].text, "prea");
        assert_eq!(fields[1].text, "b");
    }
}
