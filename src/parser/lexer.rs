//! Lexer for shell source.
//!
//! Turns a byte stream into tokens while tracking the structural context
//! the grammar cannot see on its own: quoting state, pending here-document
//! bodies, and the payload spans of `(( ... ))` and `[[ ... ]]`, which are
//! handed to their sub-parsers as contiguous strings.
//!
//! Word tokens carry the raw source text, quotes and all. Quote
//! interpretation happens later in the word parser; the lexer only needs
//! quoting state to find word boundaries and to balance substitutions.

use std::collections::HashMap;

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Newline,

    // Separators and pipeline operators
    Semi,    // ;
    Amp,     // &
    Pipe,    // |
    AndAnd,  // &&
    OrOr,    // ||
    Bang,    // !

    // Redirection operators
    Less,      // <
    Great,     // >
    DLess,     // <<
    DGreat,    // >>
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>
    DLessDash, // <<-
    Clobber,   // >|
    TLess,     // <<<
    AndGreat,  // &>
    AndDGreat, // &>>

    // Grouping
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }

    // Case terminators
    DSemi,    // ;;
    SemiAnd,  // ;&
    DSemiAnd, // ;;&

    // Sub-parser payloads
    ArithPayload, // contents of (( ... ))
    CondPayload,  // contents of [[ ... ]]

    // Reserved words
    If,
    Then,
    Elif,
    Else,
    Fi,
    For,
    While,
    Until,
    Do,
    Done,
    Case,
    Esac,
    In,
    Function,

    // Words
    Word,
    Name,
    Number,
    AssignmentWord,
    HeredocBody,
}

/// A single token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self { kind, text: text.into(), line, col }
    }
}

/// Lexical error: unterminated quote, substitution, or here-document.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexError {}

impl LexError {
    fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self { message: message.into(), line, col }
    }
}

#[derive(Debug, Clone)]
struct QueuedHeredoc {
    delimiter: String,
    strip_tabs: bool,
}

lazy_static::lazy_static! {
    static ref RESERVED: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("if", TokenKind::If);
        m.insert("then", TokenKind::Then);
        m.insert("elif", TokenKind::Elif);
        m.insert("else", TokenKind::Else);
        m.insert("fi", TokenKind::Fi);
        m.insert("for", TokenKind::For);
        m.insert("while", TokenKind::While);
        m.insert("until", TokenKind::Until);
        m.insert("do", TokenKind::Do);
        m.insert("done", TokenKind::Done);
        m.insert("case", TokenKind::Case);
        m.insert("esac", TokenKind::Esac);
        m.insert("in", TokenKind::In);
        m.insert("function", TokenKind::Function);
        m
    };
}

/// Operators ordered longest-first so prefixes never shadow them.
const OPERATORS: &[(&str, TokenKind)] = &[
    (";;&", TokenKind::DSemiAnd),
    ("<<<", TokenKind::TLess),
    ("&>>", TokenKind::AndDGreat),
    ("<<-", TokenKind::DLessDash),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    (";;", TokenKind::DSemi),
    (";&", TokenKind::SemiAnd),
    ("<<", TokenKind::DLess),
    (">>", TokenKind::DGreat),
    ("<&", TokenKind::LessAnd),
    (">&", TokenKind::GreatAnd),
    ("<>", TokenKind::LessGreat),
    (">|", TokenKind::Clobber),
    ("&>", TokenKind::AndGreat),
    (";", TokenKind::Semi),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("<", TokenKind::Less),
    (">", TokenKind::Great),
];

/// Characters that terminate an unquoted word.
pub fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// Valid shell identifier.
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Index of the `=` that makes `s` an assignment word, skipping any
/// `[subscript]` on the left-hand side. Returns the index of `=`.
fn assignment_eq_index(s: &str) -> Option<usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut depth = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => return Some(i),
            '+' if depth == 0 => {
                return if chars.get(i + 1) == Some(&'=') { Some(i + 1) } else { None };
            }
            c if depth == 0 && !c.is_ascii_alphanumeric() && c != '_' => return None,
            _ => {}
        }
    }
    None
}

fn is_assignment_lhs(s: &str) -> bool {
    let name_end = s.find(|c: char| !c.is_ascii_alphanumeric() && c != '_').unwrap_or(s.len());
    if name_end == 0 || !is_valid_name(&s[..name_end]) {
        return false;
    }
    let rest = &s[name_end..];
    if rest.is_empty() || rest == "+" {
        return true;
    }
    // name[subscript] or name[subscript]+
    rest.starts_with('[') && {
        let trimmed = rest.strip_suffix('+').unwrap_or(rest);
        trimmed.ends_with(']')
    }
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    queued_heredocs: Vec<QueuedHeredoc>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            queued_heredocs: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.input.len() {
            if !self.queued_heredocs.is_empty()
                && self.tokens.last().map(|t| t.kind) == Some(TokenKind::Newline)
            {
                self.read_heredoc_bodies()?;
                continue;
            }

            self.skip_blank();
            if self.pos >= self.input.len() {
                break;
            }
            self.next_token()?;
        }

        if !self.queued_heredocs.is_empty() {
            return Err(LexError::new(
                format!(
                    "here-document at end of file (wanted `{}')",
                    self.queued_heredocs[0].delimiter
                ),
                self.line,
                self.col,
            ));
        }

        self.tokens.push(Token::new(TokenKind::Eof, "", self.line, self.col));
        Ok(self.tokens)
    }

    fn cur(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.input.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.cur();
        if let Some(ch) = c {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        c
    }

    fn skip_blank(&mut self) {
        loop {
            match self.cur() {
                Some(' ') | Some('\t') => {
                    self.bump();
                }
                // Line continuation
                Some('\\') if self.peek(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c))
    }

    fn next_token(&mut self) -> Result<(), LexError> {
        let (line, col) = (self.line, self.col);
        let c = match self.cur() {
            Some(c) => c,
            None => return Ok(()),
        };

        // Comment runs to end of line. A '#' mid-word is handled by the
        // word reader, never here: next_token always starts at a word
        // boundary.
        if c == '#' {
            while let Some(ch) = self.cur() {
                if ch == '\n' {
                    break;
                }
                self.bump();
            }
            return Ok(());
        }

        if c == '\n' {
            self.bump();
            self.tokens.push(Token::new(TokenKind::Newline, "\n", line, col));
            return Ok(());
        }

        // (( ... )) arithmetic command / C-style for header
        if self.starts_with("((") && !self.dparen_is_nested_subshell() {
            let payload = self.read_arith_payload()?;
            self.tokens.push(Token::new(TokenKind::ArithPayload, payload, line, col));
            return Ok(());
        }

        // [[ ... ]] conditional command
        if self.starts_with("[[") && self.peek(2).map_or(true, is_word_boundary) {
            let payload = self.read_cond_payload()?;
            self.tokens.push(Token::new(TokenKind::CondPayload, payload, line, col));
            return Ok(());
        }

        // { and } only group at a word boundary; `{a,b}` and `}x` are words
        if c == '{' {
            if matches!(self.peek(1), Some(' ') | Some('\t') | Some('\n') | None) {
                self.bump();
                self.tokens.push(Token::new(TokenKind::LBrace, "{", line, col));
                return Ok(());
            }
            return self.read_word(line, col);
        }
        if c == '}' && self.peek(1).map_or(true, is_word_boundary) {
            self.bump();
            self.tokens.push(Token::new(TokenKind::RBrace, "}", line, col));
            return Ok(());
        }

        if c == '!' && self.peek(1).map_or(true, |n| n == ' ' || n == '\t' || n == '\n') {
            self.bump();
            self.tokens.push(Token::new(TokenKind::Bang, "!", line, col));
            return Ok(());
        }

        // Process substitution starts a word even though < and > are
        // normally operators.
        if (c == '<' || c == '>') && self.peek(1) == Some('(') {
            return self.read_word(line, col);
        }

        for (text, kind) in OPERATORS {
            if self.starts_with(text) {
                for _ in 0..text.len() {
                    self.bump();
                }
                if matches!(kind, TokenKind::DLess | TokenKind::DLessDash) {
                    self.queue_heredoc(*kind == TokenKind::DLessDash);
                }
                self.tokens.push(Token::new(*kind, *text, line, col));
                return Ok(());
            }
        }

        self.read_word(line, col)
    }

    /// Read one word as raw source text, quotes preserved. Tracks quoting
    /// only to find the end of the word and to balance `$()`, `${}` and
    /// backticks, which may contain boundary characters.
    fn read_word(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        let mut text = String::new();
        let mut bracket_depth = 0usize;

        while let Some(c) = self.cur() {
            if bracket_depth == 0
                && is_word_boundary(c)
                && !((c == '<' || c == '>') && self.peek(1) == Some('('))
            {
                break;
            }

            match c {
                '<' | '>' if self.peek(1) == Some('(') => {
                    text.push(c);
                    self.bump();
                    self.consume_parens(&mut text, line, col)?;
                }
                '\'' => {
                    text.push('\'');
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('\'') => {
                                text.push('\'');
                                break;
                            }
                            Some(ch) => text.push(ch),
                            None => {
                                return Err(LexError::new(
                                    "unexpected EOF while looking for matching `''",
                                    line,
                                    col,
                                ));
                            }
                        }
                    }
                }
                '"' => {
                    text.push('"');
                    self.bump();
                    self.consume_double_quoted(&mut text, line, col)?;
                }
                '\\' => {
                    self.bump();
                    match self.cur() {
                        // Line continuation disappears entirely
                        Some('\n') => {
                            self.bump();
                        }
                        Some(ch) => {
                            text.push('\\');
                            text.push(ch);
                            self.bump();
                        }
                        None => text.push('\\'),
                    }
                }
                '`' => {
                    text.push('`');
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('`') => {
                                text.push('`');
                                break;
                            }
                            Some('\\') => {
                                text.push('\\');
                                if let Some(n) = self.bump() {
                                    text.push(n);
                                }
                            }
                            Some(ch) => text.push(ch),
                            None => {
                                return Err(LexError::new(
                                    "unexpected EOF while looking for matching ``'",
                                    line,
                                    col,
                                ));
                            }
                        }
                    }
                }
                '$' if self.peek(1) == Some('(') => {
                    text.push('$');
                    self.bump();
                    self.consume_parens(&mut text, line, col)?;
                }
                '$' if self.peek(1) == Some('{') => {
                    text.push('$');
                    self.bump();
                    self.consume_braces(&mut text, line, col)?;
                }
                '[' if bracket_depth > 0 || is_valid_name(&text) => {
                    // Array subscript on an assignment LHS: a[i+1]=x
                    bracket_depth += 1;
                    text.push('[');
                    self.bump();
                }
                ']' if bracket_depth > 0 => {
                    bracket_depth -= 1;
                    text.push(']');
                    self.bump();
                }
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        let kind = self.classify_word(&text);
        self.tokens.push(Token::new(kind, text, line, col));
        Ok(())
    }

    /// Inside `"..."`: copy raw text through the closing quote, keeping
    /// escapes and balancing embedded `$()` / `${}` / backticks.
    fn consume_double_quoted(
        &mut self,
        text: &mut String,
        line: usize,
        col: usize,
    ) -> Result<(), LexError> {
        loop {
            match self.cur() {
                Some('"') => {
                    text.push('"');
                    self.bump();
                    return Ok(());
                }
                Some('\\') => {
                    text.push('\\');
                    self.bump();
                    if let Some(n) = self.bump() {
                        text.push(n);
                    }
                }
                Some('$') if self.peek(1) == Some('(') => {
                    text.push('$');
                    self.bump();
                    self.consume_parens(text, line, col)?;
                }
                Some('$') if self.peek(1) == Some('{') => {
                    text.push('$');
                    self.bump();
                    self.consume_braces(text, line, col)?;
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
                None => {
                    return Err(LexError::new(
                        "unexpected EOF while looking for matching `\"'",
                        line,
                        col,
                    ));
                }
            }
        }
    }

    /// Balanced `( ... )` consumption starting at the opening paren,
    /// respecting quotes. Used for `$( ... )` and `$(( ... ))`.
    fn consume_parens(&mut self, text: &mut String, line: usize, col: usize) -> Result<(), LexError> {
        debug_assert_eq!(self.cur(), Some('('));
        text.push('(');
        self.bump();
        let mut depth = 1usize;

        while depth > 0 {
            match self.cur() {
                Some('(') => {
                    depth += 1;
                    text.push('(');
                    self.bump();
                }
                Some(')') => {
                    depth -= 1;
                    text.push(')');
                    self.bump();
                }
                Some('\'') => {
                    text.push('\'');
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('\'') => {
                                text.push('\'');
                                break;
                            }
                            Some(ch) => text.push(ch),
                            None => {
                                return Err(LexError::new(
                                    "unexpected EOF in command substitution",
                                    line,
                                    col,
                                ));
                            }
                        }
                    }
                }
                Some('"') => {
                    text.push('"');
                    self.bump();
                    self.consume_double_quoted(text, line, col)?;
                    // consume_double_quoted pushed the closing quote
                }
                Some('\\') => {
                    text.push('\\');
                    self.bump();
                    if let Some(n) = self.bump() {
                        text.push(n);
                    }
                }
                Some('#') => {
                    // Comment inside $( ... ): skip to end of line
                    let word_start = text
                        .chars()
                        .last()
                        .map_or(true, |p| p.is_whitespace() || p == '(' || p == ';');
                    if word_start {
                        while let Some(ch) = self.cur() {
                            if ch == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        text.push('#');
                        self.bump();
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
                None => {
                    return Err(LexError::new(
                        "unexpected EOF while looking for matching `)'",
                        line,
                        col,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Balanced `{ ... }` consumption for `${ ... }`.
    fn consume_braces(&mut self, text: &mut String, line: usize, col: usize) -> Result<(), LexError> {
        debug_assert_eq!(self.cur(), Some('{'));
        text.push('{');
        self.bump();
        let mut depth = 1usize;

        while depth > 0 {
            match self.cur() {
                Some('{') => {
                    depth += 1;
                    text.push('{');
                    self.bump();
                }
                Some('}') => {
                    depth -= 1;
                    text.push('}');
                    self.bump();
                }
                Some('\'') => {
                    text.push('\'');
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('\'') => {
                                text.push('\'');
                                break;
                            }
                            Some(ch) => text.push(ch),
                            None => {
                                return Err(LexError::new(
                                    "unexpected EOF while looking for matching `}'",
                                    line,
                                    col,
                                ));
                            }
                        }
                    }
                }
                Some('\\') => {
                    text.push('\\');
                    self.bump();
                    if let Some(n) = self.bump() {
                        text.push(n);
                    }
                }
                Some('$') if self.peek(1) == Some('(') => {
                    text.push('$');
                    self.bump();
                    self.consume_parens(text, line, col)?;
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
                None => {
                    return Err(LexError::new(
                        "unexpected EOF while looking for matching `}'",
                        line,
                        col,
                    ));
                }
            }
        }
        Ok(())
    }

    fn classify_word(&self, text: &str) -> TokenKind {
        if let Some(&kind) = RESERVED.get(text) {
            return kind;
        }
        if let Some(eq) = assignment_eq_index(text) {
            if eq > 0 && is_assignment_lhs(&text[..eq]) {
                return TokenKind::AssignmentWord;
            }
        }
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            return TokenKind::Number;
        }
        if is_valid_name(text) {
            return TokenKind::Name;
        }
        TokenKind::Word
    }

    // -------------------------------------------------------------------------
    // (( ... )) and [[ ... ]] payloads
    // -------------------------------------------------------------------------

    /// `((` is ambiguous with two nested subshells. Treat it as nested
    /// subshells only when the matching close is `) )` with whitespace in
    /// between; adjacent `))` means arithmetic.
    fn dparen_is_nested_subshell(&self) -> bool {
        let mut pos = self.pos + 2;
        let mut depth = 2usize;
        let mut in_single = false;
        let mut in_double = false;

        while pos < self.input.len() && depth > 0 {
            let c = self.input[pos];
            if in_single {
                if c == '\'' {
                    in_single = false;
                }
                pos += 1;
                continue;
            }
            if in_double {
                if c == '\\' {
                    pos += 2;
                    continue;
                }
                if c == '"' {
                    in_double = false;
                }
                pos += 1;
                continue;
            }
            match c {
                '\'' => in_single = true,
                '"' => in_double = true,
                '\\' => {
                    pos += 2;
                    continue;
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 1 {
                        let mut scan = pos + 1;
                        let mut saw_space = false;
                        while scan < self.input.len()
                            && matches!(self.input[scan], ' ' | '\t' | '\n')
                        {
                            saw_space = true;
                            scan += 1;
                        }
                        return saw_space && self.input.get(scan) == Some(&')');
                    }
                    if depth == 0 {
                        return false;
                    }
                }
                _ => {}
            }
            pos += 1;
        }
        false
    }

    /// Consume `(( payload ))`, returning the payload text.
    fn read_arith_payload(&mut self) -> Result<String, LexError> {
        let (line, col) = (self.line, self.col);
        self.bump();
        self.bump();
        let mut payload = String::new();
        let mut depth = 0usize;
        let mut in_single = false;
        let mut in_double = false;

        loop {
            let c = match self.cur() {
                Some(c) => c,
                None => {
                    return Err(LexError::new(
                        "unexpected EOF while looking for matching `))'",
                        line,
                        col,
                    ));
                }
            };
            if in_single {
                if c == '\'' {
                    in_single = false;
                }
                payload.push(c);
                self.bump();
                continue;
            }
            if in_double {
                if c == '"' {
                    in_double = false;
                }
                payload.push(c);
                self.bump();
                continue;
            }
            match c {
                '\'' => in_single = true,
                '"' => in_double = true,
                '(' => depth += 1,
                ')' => {
                    if depth == 0 && self.peek(1) == Some(')') {
                        self.bump();
                        self.bump();
                        return Ok(payload);
                    }
                    if depth == 0 {
                        return Err(LexError::new(
                            "unexpected `)' in arithmetic expression",
                            self.line,
                            self.col,
                        ));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            payload.push(c);
            self.bump();
        }
    }

    /// Consume `[[ payload ]]`, returning the payload text.
    fn read_cond_payload(&mut self) -> Result<String, LexError> {
        let (line, col) = (self.line, self.col);
        self.bump();
        self.bump();
        let mut payload = String::new();
        let mut in_single = false;
        let mut in_double = false;

        loop {
            let c = match self.cur() {
                Some(c) => c,
                None => {
                    return Err(LexError::new(
                        "unexpected EOF while looking for matching `]]'",
                        line,
                        col,
                    ));
                }
            };
            if in_single {
                if c == '\'' {
                    in_single = false;
                }
                payload.push(c);
                self.bump();
                continue;
            }
            if in_double {
                if c == '\\' {
                    payload.push(c);
                    self.bump();
                    if let Some(n) = self.bump() {
                        payload.push(n);
                    }
                    continue;
                }
                if c == '"' {
                    in_double = false;
                }
                payload.push(c);
                self.bump();
                continue;
            }
            match c {
                '\'' => in_single = true,
                '"' => in_double = true,
                '\\' => {
                    payload.push('\\');
                    self.bump();
                    if let Some(n) = self.bump() {
                        payload.push(n);
                    }
                    continue;
                }
                ']' if self.peek(1) == Some(']')
                    && payload.chars().last().map_or(true, |p| p.is_whitespace()) =>
                {
                    self.bump();
                    self.bump();
                    return Ok(payload.trim().to_string());
                }
                _ => {}
            }
            payload.push(c);
            self.bump();
        }
    }

    // -------------------------------------------------------------------------
    // Here-documents
    // -------------------------------------------------------------------------

    /// Peek past `<<`/`<<-` to record the delimiter for later body
    /// collection. The delimiter word itself is lexed normally.
    fn queue_heredoc(&mut self, strip_tabs: bool) {
        let mut pos = self.pos;
        while pos < self.input.len() && matches!(self.input[pos], ' ' | '\t') {
            pos += 1;
        }

        let mut delimiter = String::new();
        while pos < self.input.len() {
            let c = self.input[pos];
            if c.is_whitespace() || matches!(c, ';' | '&' | '|' | '<' | '>' | '(' | ')') {
                break;
            }
            match c {
                '\'' | '"' => {
                    let quote = c;
                    pos += 1;
                    while pos < self.input.len() && self.input[pos] != quote {
                        delimiter.push(self.input[pos]);
                        pos += 1;
                    }
                    pos += 1;
                }
                '\\' => {
                    pos += 1;
                    if pos < self.input.len() {
                        delimiter.push(self.input[pos]);
                        pos += 1;
                    }
                }
                _ => {
                    delimiter.push(c);
                    pos += 1;
                }
            }
        }

        if !delimiter.is_empty() {
            self.queued_heredocs.push(QueuedHeredoc { delimiter, strip_tabs });
        }
    }

    /// Collect queued here-document bodies, oldest first, emitting one
    /// HeredocBody token per queued delimiter.
    fn read_heredoc_bodies(&mut self) -> Result<(), LexError> {
        let queued: Vec<QueuedHeredoc> = self.queued_heredocs.drain(..).collect();
        for heredoc in queued {
            let (line, col) = (self.line, self.col);
            let mut body = String::new();
            let mut terminated = false;

            while self.pos < self.input.len() {
                let mut line_text = String::new();
                while let Some(c) = self.cur() {
                    if c == '\n' {
                        break;
                    }
                    line_text.push(c);
                    self.bump();
                }
                let had_newline = self.cur() == Some('\n');
                if had_newline {
                    self.bump();
                }

                let check: &str = if heredoc.strip_tabs {
                    line_text.trim_start_matches('\t')
                } else {
                    &line_text
                };
                if check == heredoc.delimiter {
                    terminated = true;
                    break;
                }

                if heredoc.strip_tabs {
                    body.push_str(line_text.trim_start_matches('\t'));
                } else {
                    body.push_str(&line_text);
                }
                if had_newline {
                    body.push('\n');
                }
            }

            if !terminated && self.pos >= self.input.len() {
                return Err(LexError::new(
                    format!("here-document delimited by end-of-file (wanted `{}')", heredoc.delimiter),
                    line,
                    col,
                ));
            }

            self.tokens.push(Token::new(TokenKind::HeredocBody, body, line, col));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap()
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_command() {
        let tokens = lex("echo hello");
        assert_eq!(tokens[0].kind, TokenKind::Name);
        assert_eq!(tokens[0].text, "echo");
        assert_eq!(tokens[1].text, "hello");
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("a && b || c ; d | e"),
            vec![
                TokenKind::Name,
                TokenKind::AndAnd,
                TokenKind::Name,
                TokenKind::OrOr,
                TokenKind::Name,
                TokenKind::Semi,
                TokenKind::Name,
                TokenKind::Pipe,
                TokenKind::Name,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn redirections() {
        assert_eq!(
            kinds("cmd > f 2>&1 <in >> log"),
            vec![
                TokenKind::Name,
                TokenKind::Great,
                TokenKind::Name,
                TokenKind::Number,
                TokenKind::GreatAnd,
                TokenKind::Number,
                TokenKind::Less,
                TokenKind::Name,
                TokenKind::DGreat,
                TokenKind::Name,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn assignment_words() {
        let tokens = lex("FOO=bar BAZ+=x arr[2]=y");
        assert_eq!(tokens[0].kind, TokenKind::AssignmentWord);
        assert_eq!(tokens[1].kind, TokenKind::AssignmentWord);
        assert_eq!(tokens[2].kind, TokenKind::AssignmentWord);
        assert_eq!(tokens[2].text, "arr[2]=y");
    }

    #[test]
    fn quoted_words_keep_raw_text() {
        let tokens = lex("echo 'a b' \"c d\"");
        assert_eq!(tokens[1].text, "'a b'");
        assert_eq!(tokens[2].text, "\"c d\"");
        assert_eq!(tokens[1].kind, TokenKind::Word);
    }

    #[test]
    fn quoted_reserved_word_is_plain() {
        let tokens = lex("'if'");
        assert_eq!(tokens[0].kind, TokenKind::Word);
        let tokens = lex("if");
        assert_eq!(tokens[0].kind, TokenKind::If);
    }

    #[test]
    fn command_substitution_spans_boundaries() {
        let tokens = lex("echo $(ls | wc -l)");
        assert_eq!(tokens[1].text, "$(ls | wc -l)");
    }

    #[test]
    fn nested_command_substitution() {
        let tokens = lex("echo $(echo $(echo x))");
        assert_eq!(tokens[1].text, "$(echo $(echo x))");
    }

    #[test]
    fn parameter_braces_span_boundaries() {
        let tokens = lex("echo ${v:-a b}");
        assert_eq!(tokens[1].text, "${v:-a b}");
    }

    #[test]
    fn arith_payload() {
        let tokens = lex("(( x + 1 ))");
        assert_eq!(tokens[0].kind, TokenKind::ArithPayload);
        assert_eq!(tokens[0].text.trim(), "x + 1");
    }

    #[test]
    fn cond_payload() {
        let tokens = lex("[[ -f file && $x == y ]]");
        assert_eq!(tokens[0].kind, TokenKind::CondPayload);
        assert_eq!(tokens[0].text, "-f file && $x == y");
    }

    #[test]
    fn heredoc_body() {
        let tokens = lex("cat <<EOF\nhello\nworld\nEOF\n");
        assert_eq!(tokens[1].kind, TokenKind::DLess);
        let body = tokens.iter().find(|t| t.kind == TokenKind::HeredocBody).unwrap();
        assert_eq!(body.text, "hello\nworld\n");
    }

    #[test]
    fn heredoc_strip_tabs() {
        let tokens = lex("cat <<-EOF\n\thello\n\tEOF\n");
        let body = tokens.iter().find(|t| t.kind == TokenKind::HeredocBody).unwrap();
        assert_eq!(body.text, "hello\n");
    }

    #[test]
    fn heredoc_unterminated_is_error() {
        assert!(Lexer::new("cat <<EOF\nno end").tokenize().is_err());
    }

    #[test]
    fn unterminated_quote_is_error() {
        assert!(Lexer::new("echo 'oops").tokenize().is_err());
        assert!(Lexer::new("echo \"oops").tokenize().is_err());
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("echo hi # trailing\n"),
            vec![TokenKind::Name, TokenKind::Name, TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn line_continuation() {
        let tokens = lex("echo a\\\nb");
        assert_eq!(tokens[1].text, "ab");
    }

    #[test]
    fn nested_subshell_not_arith() {
        // `( (echo a) )` closes with spaced parens: plain grouping
        assert_eq!(kinds("((echo a) )")[0], TokenKind::LParen);
    }

    #[test]
    fn brace_group_vs_brace_word() {
        assert_eq!(kinds("{ echo; }")[0], TokenKind::LBrace);
        let tokens = lex("echo {a,b}");
        assert_eq!(tokens[1].kind, TokenKind::Word);
        assert_eq!(tokens[1].text, "{a,b}");
    }

    #[test]
    fn bang_token() {
        assert_eq!(kinds("! true")[0], TokenKind::Bang);
        // != inside a word stays a word
        let tokens = lex("a!=b");
        assert_eq!(tokens[0].kind, TokenKind::Word);
    }
}
