//! Word parser: raw word text into `Word` part trees.
//!
//! The lexer hands over words verbatim, quotes included. This module
//! interprets quoting, expansions, brace candidates, tildes, and glob
//! segments, producing the part list the expansion pipeline walks.

use crate::ast::types::*;
use crate::parser::{arithmetic_parser, ParseError};

/// Parse the raw text of one shell word.
pub fn parse_word(text: &str) -> Result<Word, ParseError> {
    let mut p = WordScanner::new(text, false);
    let parts = p.parse_parts()?;
    Ok(Word::new(parts))
}

/// Parse here-document body text under double-quote rules (`$`, backtick
/// and backslash are live; quotes are not).
pub fn parse_heredoc_body(text: &str) -> Result<Word, ParseError> {
    let mut p = WordScanner::new(text, true);
    let parts = p.parse_parts()?;
    Ok(Word::new(vec![WordPart::DoubleQuoted(parts)]))
}

fn glob_or_literal(buf: String) -> WordPart {
    if buf.contains(['*', '?', '[']) {
        WordPart::Glob(buf)
    } else {
        WordPart::Literal(buf)
    }
}

struct WordScanner {
    chars: Vec<char>,
    pos: usize,
    /// Heredoc-body mode: quote characters are plain text.
    heredoc: bool,
}

impl WordScanner {
    fn new(text: &str, heredoc: bool) -> Self {
        Self { chars: text.chars().collect(), pos: 0, heredoc }
    }

    fn cur(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, 1, self.pos + 1)
    }

    fn parse_parts(&mut self) -> Result<Vec<WordPart>, ParseError> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        macro_rules! flush {
            () => {
                if !literal.is_empty() {
                    parts.push(glob_or_literal(std::mem::take(&mut literal)));
                }
            };
        }

        // Leading tilde expands; anywhere else it is a plain character.
        if !self.heredoc && self.cur() == Some('~') {
            let mut user = String::new();
            let mut scan = self.pos + 1;
            while let Some(&c) = self.chars.get(scan) {
                if c == '/' {
                    break;
                }
                user.push(c);
                scan += 1;
            }
            self.pos = scan;
            parts.push(WordPart::TildeExpansion {
                user: if user.is_empty() { None } else { Some(user) },
            });
        }

        while let Some(c) = self.cur() {
            match c {
                '\'' if !self.heredoc => {
                    flush!();
                    self.pos += 1;
                    let mut value = String::new();
                    loop {
                        match self.cur() {
                            Some('\'') => {
                                self.pos += 1;
                                break;
                            }
                            Some(ch) => {
                                value.push(ch);
                                self.pos += 1;
                            }
                            None => return Err(self.err("unterminated single quote")),
                        }
                    }
                    parts.push(WordPart::SingleQuoted(value));
                }
                '"' if !self.heredoc => {
                    flush!();
                    self.pos += 1;
                    let inner = self.parse_double_quoted()?;
                    parts.push(WordPart::DoubleQuoted(inner));
                }
                '\\' => {
                    // In heredoc bodies only \$, \` and \\ are escapes;
                    // any other backslash is literal text.
                    if self.heredoc && !matches!(self.peek(1), Some('$') | Some('`') | Some('\\')) {
                        literal.push('\\');
                        self.pos += 1;
                        continue;
                    }
                    self.pos += 1;
                    match self.cur() {
                        Some(ch) => {
                            flush!();
                            parts.push(WordPart::Escaped(ch.to_string()));
                            self.pos += 1;
                        }
                        None => literal.push('\\'),
                    }
                }
                '`' => {
                    flush!();
                    parts.push(self.parse_backtick()?);
                }
                '$' => {
                    if !self.heredoc && self.peek(1) == Some('\'') {
                        flush!();
                        parts.push(self.parse_ansi_c_quoted()?);
                    } else if let Some(part) = self.parse_dollar()? {
                        flush!();
                        parts.push(part);
                    } else {
                        literal.push('$');
                        self.pos += 1;
                    }
                }
                '{' if !self.heredoc => {
                    if let Some(items) = self.try_parse_brace()? {
                        flush!();
                        parts.push(WordPart::BraceExpansion(items));
                    } else {
                        literal.push('{');
                        self.pos += 1;
                    }
                }
                '<' | '>' if !self.heredoc && self.peek(1) == Some('(') => {
                    flush!();
                    let direction = if c == '<' {
                        ProcessDirection::In
                    } else {
                        ProcessDirection::Out
                    };
                    self.pos += 1;
                    let inner = self.read_balanced('(', ')')?;
                    let body = crate::parser::parse(&inner)?;
                    parts.push(WordPart::ProcessSubstitution { body, direction });
                }
                _ => {
                    literal.push(c);
                    self.pos += 1;
                }
            }
        }

        if !literal.is_empty() {
            parts.push(glob_or_literal(literal));
        }
        Ok(parts)
    }

    /// Inside double quotes only `$`, backtick, and a restricted backslash
    /// are live.
    fn parse_double_quoted(&mut self) -> Result<Vec<WordPart>, ParseError> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        macro_rules! flush {
            () => {
                if !literal.is_empty() {
                    parts.push(WordPart::Literal(std::mem::take(&mut literal)));
                }
            };
        }

        loop {
            match self.cur() {
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    match self.peek(1) {
                        Some(n @ ('"' | '\\' | '$' | '`')) => {
                            flush!();
                            parts.push(WordPart::Escaped(n.to_string()));
                            self.pos += 2;
                        }
                        _ => {
                            literal.push('\\');
                            self.pos += 1;
                        }
                    }
                }
                Some('`') => {
                    flush!();
                    parts.push(self.parse_backtick()?);
                }
                Some('$') => {
                    if let Some(part) = self.parse_dollar()? {
                        flush!();
                        parts.push(part);
                    } else {
                        literal.push('$');
                        self.pos += 1;
                    }
                }
                Some(c) => {
                    literal.push(c);
                    self.pos += 1;
                }
                None => return Err(self.err("unterminated double quote")),
            }
        }

        if !literal.is_empty() {
            parts.push(WordPart::Literal(literal));
        }
        Ok(parts)
    }

    /// `$'...'` ANSI-C quoting: escapes are decoded at parse time.
    fn parse_ansi_c_quoted(&mut self) -> Result<WordPart, ParseError> {
        self.pos += 2; // $'
        let mut value = String::new();
        loop {
            match self.cur() {
                Some('\'') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    let decoded = match self.cur() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('a') => '\x07',
                        Some('b') => '\x08',
                        Some('f') => '\x0c',
                        Some('v') => '\x0b',
                        Some('e') | Some('E') => '\x1b',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some('0') => '\0',
                        Some(other) => {
                            value.push('\\');
                            other
                        }
                        None => return Err(self.err("unterminated $'...'")),
                    };
                    value.push(decoded);
                    self.pos += 1;
                }
                Some(ch) => {
                    value.push(ch);
                    self.pos += 1;
                }
                None => return Err(self.err("unterminated $'...'")),
            }
        }
        Ok(WordPart::SingleQuoted(value))
    }

    /// Legacy backtick substitution. Only `\$`, `` \` `` and `\\` are
    /// unescaped; everything else passes through to the sub-script.
    fn parse_backtick(&mut self) -> Result<WordPart, ParseError> {
        self.pos += 1;
        let mut inner = String::new();
        loop {
            match self.cur() {
                Some('`') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    match self.peek(1) {
                        Some(n @ ('$' | '`' | '\\')) => {
                            inner.push(n);
                            self.pos += 2;
                        }
                        _ => {
                            inner.push('\\');
                            self.pos += 1;
                        }
                    }
                }
                Some(c) => {
                    inner.push(c);
                    self.pos += 1;
                }
                None => return Err(self.err("unterminated backquote")),
            }
        }
        let body = crate::parser::parse(&inner)?;
        Ok(WordPart::CommandSubstitution { body, legacy: true })
    }

    /// Everything introduced by `$`. Returns None when the dollar is
    /// literal (end of word, `$ ` etc.).
    fn parse_dollar(&mut self) -> Result<Option<WordPart>, ParseError> {
        match self.peek(1) {
            Some('(') if self.peek(2) == Some('(') => {
                // $(( ... )) unless it is really $( (subshell) )
                let save = self.pos;
                self.pos += 1;
                let inner = self.read_balanced('(', ')')?;
                if let Some(arith_text) = strip_matched_parens(&inner) {
                    let expr = arithmetic_parser::parse_arithmetic(arith_text)
                        .map_err(|e| self.err(e.message))?;
                    return Ok(Some(WordPart::ArithExpansion(expr)));
                }
                self.pos = save;
                self.parse_command_subst().map(Some)
            }
            Some('(') => self.parse_command_subst().map(Some),
            Some('{') => {
                self.pos += 2;
                let inner = self.read_until_matching_brace()?;
                parse_param_in_braces(&inner).map(Some)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.pos += 1;
                let mut name = String::new();
                while let Some(ch) = self.cur() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        name.push(ch);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Ok(Some(WordPart::ParamExpansion(ParamExpansion { name, op: None })))
            }
            Some(c) if c.is_ascii_digit() => {
                self.pos += 2;
                Ok(Some(WordPart::ParamExpansion(ParamExpansion {
                    name: c.to_string(),
                    op: None,
                })))
            }
            Some(c @ ('?' | '$' | '!' | '#' | '@' | '*' | '-')) => {
                self.pos += 2;
                Ok(Some(WordPart::ParamExpansion(ParamExpansion {
                    name: c.to_string(),
                    op: None,
                })))
            }
            _ => Ok(None),
        }
    }

    fn parse_command_subst(&mut self) -> Result<WordPart, ParseError> {
        self.pos += 1; // $
        let inner = self.read_balanced('(', ')')?;
        let body = crate::parser::parse(&inner)?;
        Ok(WordPart::CommandSubstitution { body, legacy: false })
    }

    /// At an opening delimiter: consume through the matching close,
    /// returning the inner text. Quote-aware.
    fn read_balanced(&mut self, open: char, close: char) -> Result<String, ParseError> {
        debug_assert_eq!(self.cur(), Some(open));
        self.pos += 1;
        let mut inner = String::new();
        let mut depth = 1usize;
        let mut in_single = false;
        let mut in_double = false;

        loop {
            let c = match self.cur() {
                Some(c) => c,
                None => return Err(self.err(format!("unterminated `{}'", open))),
            };
            if in_single {
                if c == '\'' {
                    in_single = false;
                }
                inner.push(c);
                self.pos += 1;
                continue;
            }
            if c == '\\' && !in_single {
                inner.push('\\');
                self.pos += 1;
                if let Some(n) = self.cur() {
                    inner.push(n);
                    self.pos += 1;
                }
                continue;
            }
            if in_double {
                if c == '"' {
                    in_double = false;
                }
                inner.push(c);
                self.pos += 1;
                continue;
            }
            match c {
                '\'' => in_single = true,
                '"' => in_double = true,
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            inner.push(c);
            self.pos += 1;
        }
    }

    fn read_until_matching_brace(&mut self) -> Result<String, ParseError> {
        // Called just past `${`; rewind to the brace for read_balanced.
        self.pos -= 1;
        self.read_balanced('{', '}')
    }

    /// Try to parse `{...}` as a brace expansion. Returns None (and does
    /// not consume) when it is not one: no top-level comma or range, or
    /// unbalanced.
    fn try_parse_brace(&mut self) -> Result<Option<Vec<BraceItem>>, ParseError> {
        let save = self.pos;
        let inner = match self.read_balanced('{', '}') {
            Ok(s) => s,
            Err(_) => {
                self.pos = save;
                return Ok(None);
            }
        };

        match parse_brace_items(&inner)? {
            Some(items) => Ok(Some(items)),
            None => {
                self.pos = save;
                Ok(None)
            }
        }
    }
}

/// If `inner` is `( ... )` with the first paren matching the last one,
/// return the text between them. Distinguishes `$((expr))` from
/// `$( (subshell) )`.
fn strip_matched_parens(inner: &str) -> Option<&str> {
    let body = inner.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0i32;
    for c in body.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(body)
}

/// Split `{...}` content into expansion items, or None when the braces
/// are literal (`{}`, `{single}` without comma or range).
fn parse_brace_items(inner: &str) -> Result<Option<Vec<BraceItem>>, ParseError> {
    if inner.is_empty() {
        return Ok(None);
    }

    // Top-level comma split, respecting nested braces and quotes.
    let mut items: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = inner.chars().peekable();
    let mut has_comma = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                buf.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                buf.push(c);
            }
            '\\' => {
                buf.push(c);
                if let Some(&n) = chars.peek() {
                    buf.push(n);
                    chars.next();
                }
            }
            '{' if !in_single && !in_double => {
                depth += 1;
                buf.push(c);
            }
            '}' if !in_single && !in_double => {
                depth = depth.saturating_sub(1);
                buf.push(c);
            }
            ',' if depth == 0 && !in_single && !in_double => {
                has_comma = true;
                items.push(std::mem::take(&mut buf));
            }
            _ => buf.push(c),
        }
    }
    items.push(buf);

    if has_comma {
        let mut parsed = Vec::new();
        for item in items {
            parsed.push(BraceItem::Word(parse_word(&item)?));
        }
        return Ok(Some(parsed));
    }

    // No comma: maybe a range.
    Ok(parse_brace_range(inner))
}

/// `start..end` or `start..end..step` ranges, numeric or single-char.
fn parse_brace_range(inner: &str) -> Option<Vec<BraceItem>> {
    let segments: Vec<&str> = inner.split("..").collect();
    if segments.len() != 2 && segments.len() != 3 {
        return None;
    }
    let step = if segments.len() == 3 {
        match segments[2].parse::<i64>() {
            Ok(s) => s,
            Err(_) => return None,
        }
    } else {
        1
    };

    let (a, b) = (segments[0], segments[1]);
    if let (Ok(start), Ok(end)) = (a.parse::<i64>(), b.parse::<i64>()) {
        // Zero padding carries over when either endpoint has it.
        let width = if (a.starts_with('0') && a.len() > 1)
            || (a.starts_with("-0") && a.len() > 2)
            || (b.starts_with('0') && b.len() > 1)
            || (b.starts_with("-0") && b.len() > 2)
        {
            a.trim_start_matches('-').len().max(b.trim_start_matches('-').len())
        } else {
            0
        };
        return Some(vec![BraceItem::NumberRange { start, end, step, width }]);
    }

    let mut ac = a.chars();
    let mut bc = b.chars();
    match (ac.next(), ac.next(), bc.next(), bc.next()) {
        (Some(s), None, Some(e), None) if s.is_ascii_alphabetic() && e.is_ascii_alphabetic() => {
            Some(vec![BraceItem::CharRange { start: s, end: e, step }])
        }
        _ => None,
    }
}

// =============================================================================
// ${ ... } parameter expansion forms
// =============================================================================

/// Parse the inner text of `${...}`.
fn parse_param_in_braces(inner: &str) -> Result<WordPart, ParseError> {
    let bad = |text: &str| ParseError::new(format!("${{{}}}: bad substitution", text), 1, 1);

    if inner.is_empty() {
        return Err(bad(inner));
    }

    // ${#name} length; ${#} is $#
    if let Some(rest) = inner.strip_prefix('#') {
        if rest.is_empty() {
            return Ok(WordPart::ParamExpansion(ParamExpansion {
                name: "#".to_string(),
                op: None,
            }));
        }
        if is_param_name(rest) {
            return Ok(WordPart::ParamExpansion(ParamExpansion {
                name: rest.to_string(),
                op: Some(ParamOp::Length),
            }));
        }
        return Err(bad(inner));
    }

    // ${!name} indirection
    if let Some(rest) = inner.strip_prefix('!') {
        if is_param_name(rest) {
            return Ok(WordPart::ParamExpansion(ParamExpansion {
                name: rest.to_string(),
                op: Some(ParamOp::Indirection),
            }));
        }
        return Err(bad(inner));
    }

    let chars: Vec<char> = inner.chars().collect();
    let name_len = param_name_length(&chars);
    if name_len == 0 {
        return Err(bad(inner));
    }
    let name: String = chars[..name_len].iter().collect();
    let rest: String = chars[name_len..].iter().collect();

    if rest.is_empty() {
        return Ok(WordPart::ParamExpansion(ParamExpansion { name, op: None }));
    }

    let op = parse_param_op(&rest).ok_or_else(|| bad(inner))??;
    Ok(WordPart::ParamExpansion(ParamExpansion { name, op: Some(op) }))
}

fn is_param_name(s: &str) -> bool {
    if s.len() == 1 {
        let c = s.chars().next().unwrap();
        if matches!(c, '?' | '$' | '!' | '#' | '@' | '*' | '-') || c.is_ascii_digit() {
            return true;
        }
    }
    if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
        return true;
    }
    if let Some(open) = s.find('[') {
        return crate::parser::lexer::is_valid_name(&s[..open]) && s.ends_with(']');
    }
    crate::parser::lexer::is_valid_name(s)
}

/// Length of the parameter name prefix, including `[subscript]`.
fn param_name_length(chars: &[char]) -> usize {
    let mut i = 0;
    if let Some(&c) = chars.first() {
        if matches!(c, '?' | '$' | '!' | '#' | '@' | '*' | '-') {
            return 1;
        }
        if c.is_ascii_digit() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            return i;
        }
    }
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    if i > 0 && chars.get(i) == Some(&'[') {
        let mut depth = 0usize;
        while i < chars.len() {
            match chars[i] {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        return 0; // unbalanced subscript
    }
    i
}

/// Parse the operator suffix of a braced expansion. Outer Option is
/// "recognized at all", inner Result carries nested parse failures.
#[allow(clippy::type_complexity)]
fn parse_param_op(rest: &str) -> Option<Result<ParamOp, ParseError>> {
    let word_of = |s: &str| parse_word(s);

    // Two-character operator prefixes first.
    for (prefix, check_empty) in [(":-", true), ("-", false)] {
        if let Some(w) = rest.strip_prefix(prefix) {
            return Some(word_of(w).map(|word| ParamOp::DefaultValue { word, check_empty }));
        }
    }
    for (prefix, check_empty) in [(":=", true), ("=", false)] {
        if let Some(w) = rest.strip_prefix(prefix) {
            return Some(word_of(w).map(|word| ParamOp::AssignDefault { word, check_empty }));
        }
    }
    for (prefix, check_empty) in [(":+", true), ("+", false)] {
        if let Some(w) = rest.strip_prefix(prefix) {
            return Some(word_of(w).map(|word| ParamOp::UseAlternative { word, check_empty }));
        }
    }
    for (prefix, check_empty) in [(":?", true), ("?", false)] {
        if let Some(w) = rest.strip_prefix(prefix) {
            let word = if w.is_empty() { None } else { Some(word_of(w)) };
            return Some(match word {
                None => Ok(ParamOp::ErrorIfUnset { word: None, check_empty }),
                Some(Ok(word)) => Ok(ParamOp::ErrorIfUnset { word: Some(word), check_empty }),
                Some(Err(e)) => Err(e),
            });
        }
    }

    if let Some(w) = rest.strip_prefix("##") {
        return Some(
            word_of(w).map(|pattern| ParamOp::PatternRemoval {
                pattern,
                side: PatternSide::Prefix,
                greedy: true,
            }),
        );
    }
    if let Some(w) = rest.strip_prefix('#') {
        return Some(
            word_of(w).map(|pattern| ParamOp::PatternRemoval {
                pattern,
                side: PatternSide::Prefix,
                greedy: false,
            }),
        );
    }
    if let Some(w) = rest.strip_prefix("%%") {
        return Some(
            word_of(w).map(|pattern| ParamOp::PatternRemoval {
                pattern,
                side: PatternSide::Suffix,
                greedy: true,
            }),
        );
    }
    if let Some(w) = rest.strip_prefix('%') {
        return Some(
            word_of(w).map(|pattern| ParamOp::PatternRemoval {
                pattern,
                side: PatternSide::Suffix,
                greedy: false,
            }),
        );
    }

    if let Some(w) = rest.strip_prefix('/') {
        return Some(parse_replacement(w));
    }

    for (prefix, upper, all) in [("^^", true, true), ("^", true, false), (",,", false, true), (",", false, false)] {
        if let Some(w) = rest.strip_prefix(prefix) {
            let pattern = if w.is_empty() {
                None
            } else {
                match word_of(w) {
                    Ok(p) => Some(p),
                    Err(e) => return Some(Err(e)),
                }
            };
            return Some(Ok(ParamOp::CaseModification { upper, all, pattern }));
        }
    }

    if let Some(w) = rest.strip_prefix(':') {
        return Some(parse_substring(w));
    }

    None
}

/// `${v/pat/repl}` family; the leading `/` has been consumed.
fn parse_replacement(rest: &str) -> Result<ParamOp, ParseError> {
    let (all, anchor, body) = if let Some(b) = rest.strip_prefix('/') {
        (true, PatternAnchor::None, b)
    } else if let Some(b) = rest.strip_prefix('#') {
        (false, PatternAnchor::Start, b)
    } else if let Some(b) = rest.strip_prefix('%') {
        (false, PatternAnchor::End, b)
    } else {
        (false, PatternAnchor::None, rest)
    };

    // Split pattern from replacement at the first unescaped, unquoted `/`.
    let chars: Vec<char> = body.chars().collect();
    let mut split = None;
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '/' if !in_single && !in_double => {
                split = Some(i);
                break;
            }
            _ => {}
        }
        i += 1;
    }

    let (pattern_text, replacement_text) = match split {
        Some(i) => {
            let p: String = chars[..i].iter().collect();
            let r: String = chars[i + 1..].iter().collect();
            (p, Some(r))
        }
        None => (body.to_string(), None),
    };

    let pattern = parse_word(&pattern_text)?;
    let replacement = match replacement_text {
        Some(r) => Some(parse_word(&r)?),
        None => None,
    };
    Ok(ParamOp::PatternReplacement { pattern, replacement, all, anchor })
}

/// `${v:offset}` / `${v:offset:length}`; the leading `:` has been consumed.
fn parse_substring(rest: &str) -> Result<ParamOp, ParseError> {
    // Find the `:` separating offset from length, skipping ternary `?:`
    // by tracking parens.
    let chars: Vec<char> = rest.chars().collect();
    let mut depth = 0usize;
    let mut question = 0usize;
    let mut split = None;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '?' => question += 1,
            ':' if depth == 0 && question == 0 => {
                split = Some(i);
                break;
            }
            ':' if question > 0 => question -= 1,
            _ => {}
        }
    }

    let (off_text, len_text) = match split {
        Some(i) => {
            let o: String = chars[..i].iter().collect();
            let l: String = chars[i + 1..].iter().collect();
            (o, Some(l))
        }
        None => (rest.to_string(), None),
    };

    let offset = arithmetic_parser::parse_arithmetic(&off_text)?;
    let length = match len_text {
        Some(l) => Some(arithmetic_parser::parse_arithmetic(&l)?),
        None => None,
    };
    Ok(ParamOp::Substring { offset, length })
}
