//! Recursive-descent grammar over the token stream.
//!
//! Builds `Script` trees from tokens. Word tokens are handed to the word
//! parser; `(( ... ))` and `[[ ... ]]` payloads go to their sub-parsers.

use std::collections::VecDeque;

use crate::ast::types::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::{
    arithmetic_parser, conditional_parser, word_parser, ParseError, MAX_PARSE_DEPTH,
};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    /// Here-document bodies in source order, pulled out of the token
    /// stream up front and consumed as heredoc redirections parse.
    heredoc_bodies: VecDeque<String>,
}

/// Token kinds acceptable wherever a word is expected. Reserved words
/// lose their special meaning outside command position.
fn is_wordlike(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Word
            | TokenKind::Name
            | TokenKind::Number
            | TokenKind::AssignmentWord
            | TokenKind::If
            | TokenKind::Then
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::Fi
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Until
            | TokenKind::Do
            | TokenKind::Done
            | TokenKind::Case
            | TokenKind::Esac
            | TokenKind::In
            | TokenKind::Function
    )
}

fn is_redir_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Less
            | TokenKind::Great
            | TokenKind::DLess
            | TokenKind::DGreat
            | TokenKind::LessAnd
            | TokenKind::GreatAnd
            | TokenKind::LessGreat
            | TokenKind::DLessDash
            | TokenKind::Clobber
            | TokenKind::TLess
            | TokenKind::AndGreat
            | TokenKind::AndDGreat
    )
}

fn redir_op_of(kind: TokenKind) -> RedirOp {
    match kind {
        TokenKind::Less => RedirOp::Read,
        TokenKind::Great => RedirOp::Write,
        TokenKind::DGreat => RedirOp::Append,
        TokenKind::GreatAnd => RedirOp::DupOut,
        TokenKind::LessAnd => RedirOp::DupIn,
        TokenKind::LessGreat => RedirOp::ReadWrite,
        TokenKind::Clobber => RedirOp::Clobber,
        TokenKind::AndGreat => RedirOp::AllOut,
        TokenKind::AndDGreat => RedirOp::AllAppend,
        TokenKind::TLess => RedirOp::HereString,
        TokenKind::DLess => RedirOp::HereDoc,
        TokenKind::DLessDash => RedirOp::HereDocDash,
        _ => unreachable!("not a redirection token"),
    }
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut stream = Vec::with_capacity(tokens.len());
        let mut heredoc_bodies = VecDeque::new();
        for tok in tokens {
            if tok.kind == TokenKind::HeredocBody {
                heredoc_bodies.push_back(tok.text);
            } else {
                stream.push(tok);
            }
        }
        Self { tokens: stream, pos: 0, depth: 0, heredoc_bodies }
    }

    pub fn parse_script(mut self) -> Result<Script, ParseError> {
        let mut statements = Vec::new();
        self.skip_separators();
        while self.kind() != TokenKind::Eof {
            statements.push(self.parse_statement()?);
            self.skip_separators();
        }
        Ok(Script { statements })
    }

    // -------------------------------------------------------------------------
    // Token helpers
    // -------------------------------------------------------------------------

    fn token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.token().kind
    }

    fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.token().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn err_here(&self, msg: impl Into<String>) -> ParseError {
        let t = self.token();
        ParseError::new(msg, t.line, t.col)
    }

    fn unexpected(&self) -> ParseError {
        let t = self.token();
        let what = if t.kind == TokenKind::Eof {
            "unexpected end of file".to_string()
        } else {
            format!("syntax error near unexpected token `{}'", t.text)
        };
        ParseError::new(what, t.line, t.col)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.kind() == kind {
            Ok(self.bump())
        } else {
            Err(self.err_here(format!(
                "expected {} but found `{}'",
                what,
                self.token().text
            )))
        }
    }

    fn skip_newlines(&mut self) {
        while self.kind() == TokenKind::Newline {
            self.bump();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.kind(), TokenKind::Newline | TokenKind::Semi) {
            self.bump();
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(self.err_here("expression nests too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // -------------------------------------------------------------------------
    // Statements and pipelines
    // -------------------------------------------------------------------------

    /// One statement: pipelines joined by `&&`, `||`, and `;`, ended by
    /// newline, `&`, or a structural token.
    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let mut pipelines = vec![self.parse_pipeline()?];
        let mut operators = Vec::new();
        let mut background = false;

        loop {
            match self.kind() {
                TokenKind::AndAnd => {
                    self.bump();
                    self.skip_newlines();
                    operators.push(ListOp::And);
                    pipelines.push(self.parse_pipeline()?);
                }
                TokenKind::OrOr => {
                    self.bump();
                    self.skip_newlines();
                    operators.push(ListOp::Or);
                    pipelines.push(self.parse_pipeline()?);
                }
                TokenKind::Semi => {
                    // `;` continues the statement only when something
                    // non-structural follows on the same list.
                    if self.statement_continues_after_semi() {
                        self.bump();
                        operators.push(ListOp::Seq);
                        pipelines.push(self.parse_pipeline()?);
                    } else {
                        break;
                    }
                }
                TokenKind::Amp => {
                    self.bump();
                    background = true;
                    break;
                }
                _ => break,
            }
        }

        Ok(Statement { pipelines, operators, background })
    }

    fn statement_continues_after_semi(&self) -> bool {
        let next = self.peek_kind(1);
        if matches!(
            next,
            TokenKind::Then
                | TokenKind::Do
                | TokenKind::Done
                | TokenKind::Fi
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::Esac
                | TokenKind::In
        ) {
            return false;
        }
        is_wordlike(next)
            || matches!(
                next,
                TokenKind::Bang
                    | TokenKind::LParen
                    | TokenKind::LBrace
                    | TokenKind::ArithPayload
                    | TokenKind::CondPayload
            )
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let mut negated = false;
        while self.kind() == TokenKind::Bang {
            self.bump();
            negated = !negated;
        }

        let mut commands = vec![self.parse_command()?];
        while self.kind() == TokenKind::Pipe {
            self.bump();
            self.skip_newlines();
            commands.push(self.parse_command()?);
        }
        Ok(Pipeline { commands, negated })
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        self.enter()?;
        let result = self.parse_command_inner();
        self.leave();
        result
    }

    fn parse_command_inner(&mut self) -> Result<Command, ParseError> {
        match self.kind() {
            // Structural keywords cannot begin a command.
            TokenKind::Then
            | TokenKind::Do
            | TokenKind::Done
            | TokenKind::Fi
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::Esac
            | TokenKind::In => Err(self.unexpected()),
            TokenKind::If => Ok(Command::Compound(CompoundCommand::If(self.parse_if()?))),
            TokenKind::While => {
                Ok(Command::Compound(CompoundCommand::While(self.parse_while()?)))
            }
            TokenKind::Until => {
                Ok(Command::Compound(CompoundCommand::Until(self.parse_until()?)))
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Case => Ok(Command::Compound(CompoundCommand::Case(self.parse_case()?))),
            TokenKind::LParen => {
                Ok(Command::Compound(CompoundCommand::Subshell(self.parse_subshell()?)))
            }
            TokenKind::LBrace => {
                Ok(Command::Compound(CompoundCommand::Group(self.parse_group()?)))
            }
            TokenKind::ArithPayload => {
                let payload = self.bump().text;
                let expr = arithmetic_parser::parse_arithmetic(&payload)?;
                let redirections = self.parse_trailing_redirections()?;
                Ok(Command::Compound(CompoundCommand::Arith(ArithCommand {
                    expr,
                    redirections,
                })))
            }
            TokenKind::CondPayload => {
                let payload = self.bump().text;
                let expr = conditional_parser::parse_conditional(&payload)?;
                let redirections = self.parse_trailing_redirections()?;
                Ok(Command::Compound(CompoundCommand::Cond(CondCommand {
                    expr,
                    redirections,
                })))
            }
            TokenKind::Function => self.parse_function_keyword(),
            TokenKind::Name
                if self.peek_kind(1) == TokenKind::LParen
                    && self.peek_kind(2) == TokenKind::RParen =>
            {
                self.parse_function_posix()
            }
            kind if is_wordlike(kind) || is_redir_op(kind) => {
                Ok(Command::Simple(self.parse_simple_command()?))
            }
            _ => Err(self.unexpected()),
        }
    }

    // -------------------------------------------------------------------------
    // Simple commands
    // -------------------------------------------------------------------------

    fn parse_simple_command(&mut self) -> Result<SimpleCommand, ParseError> {
        let mut assignments = Vec::new();
        let mut name: Option<Word> = None;
        let mut args = Vec::new();
        let mut redirections = Vec::new();

        loop {
            let kind = self.kind();

            if self.at_redirection() {
                redirections.push(self.parse_redirection()?);
                continue;
            }

            if kind == TokenKind::AssignmentWord && name.is_none() {
                assignments.push(self.parse_assignment()?);
                continue;
            }

            if is_wordlike(kind) {
                let word = self.parse_word_token()?;
                if name.is_none() {
                    name = Some(word);
                } else {
                    args.push(word);
                }
                continue;
            }

            // A lone `!`, `{` or `}` in argument position is plain text.
            if name.is_some()
                && matches!(kind, TokenKind::Bang | TokenKind::LBrace | TokenKind::RBrace)
            {
                args.push(Word::literal(self.bump().text));
                continue;
            }

            break;
        }

        if assignments.is_empty() && name.is_none() && redirections.is_empty() {
            return Err(self.unexpected());
        }

        Ok(SimpleCommand { assignments, name, args, redirections })
    }

    fn parse_word_token(&mut self) -> Result<Word, ParseError> {
        let tok = self.bump();
        word_parser::parse_word(&tok.text)
            .map_err(|e| ParseError::new(e.message, tok.line, tok.col + e.col - 1))
    }

    fn parse_assignment(&mut self) -> Result<Assignment, ParseError> {
        let tok = self.bump();
        let text = &tok.text;

        // Find the `=` outside any subscript.
        let mut eq = 0;
        let mut depth = 0;
        for (i, c) in text.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => depth -= 1,
                '=' if depth == 0 => {
                    eq = i;
                    break;
                }
                _ => {}
            }
        }

        let (mut lhs, value_text) = (&text[..eq], &text[eq + 1..]);
        let append = lhs.ends_with('+');
        if append {
            lhs = &lhs[..lhs.len() - 1];
        }

        // `a=(one two)` array literal: the lexer stops the assignment word
        // at `(`, leaving the elements as ordinary tokens.
        if value_text.is_empty() && self.kind() == TokenKind::LParen {
            self.bump();
            self.skip_newlines();
            let mut elements = Vec::new();
            while self.kind() != TokenKind::RParen {
                if self.kind() == TokenKind::Eof {
                    return Err(self.err_here("unexpected EOF in array literal"));
                }
                if !is_wordlike(self.kind()) {
                    return Err(self.unexpected());
                }
                elements.push(self.parse_word_token()?);
                self.skip_newlines();
            }
            self.bump();
            return Ok(Assignment {
                name: lhs.to_string(),
                value: None,
                append,
                array: Some(elements),
            });
        }

        let value = word_parser::parse_word(value_text)
            .map_err(|e| ParseError::new(e.message, tok.line, tok.col))?;
        Ok(Assignment {
            name: lhs.to_string(),
            value: Some(value),
            append,
            array: None,
        })
    }

    // -------------------------------------------------------------------------
    // Redirections
    // -------------------------------------------------------------------------

    fn at_redirection(&self) -> bool {
        let kind = self.kind();
        if is_redir_op(kind) {
            return true;
        }
        // `2>file`: fd digits adjacent to the operator
        if kind == TokenKind::Number && is_redir_op(self.peek_kind(1)) {
            let num = self.token();
            if let Some(op) = self.tokens.get(self.pos + 1) {
                return op.line == num.line && op.col == num.col + num.text.chars().count();
            }
        }
        false
    }

    fn parse_redirection(&mut self) -> Result<Redirection, ParseError> {
        let fd = if self.kind() == TokenKind::Number {
            let tok = self.bump();
            Some(tok.text.parse::<i32>().map_err(|_| {
                ParseError::new("file descriptor out of range", tok.line, tok.col)
            })?)
        } else {
            None
        };

        let op_tok = self.bump();
        let op = redir_op_of(op_tok.kind);

        match op {
            RedirOp::HereDoc | RedirOp::HereDocDash => {
                let delim_tok = self.bump();
                if !is_wordlike(delim_tok.kind) {
                    return Err(ParseError::new(
                        "here-document delimiter expected",
                        delim_tok.line,
                        delim_tok.col,
                    ));
                }
                let (delimiter, quoted) = unquote_delimiter(&delim_tok.text);
                let raw_body = self.heredoc_bodies.pop_front().unwrap_or_default();
                let body = if quoted {
                    Word::literal(raw_body)
                } else {
                    word_parser::parse_heredoc_body(&raw_body)?
                };
                Ok(Redirection {
                    fd,
                    op,
                    target: RedirTarget::HereDoc(HereDoc {
                        delimiter,
                        body,
                        strip_tabs: op == RedirOp::HereDocDash,
                        quoted,
                    }),
                })
            }
            _ => {
                if !is_wordlike(self.kind()) {
                    return Err(self.err_here(format!(
                        "redirection target expected after `{}'",
                        op_tok.text
                    )));
                }
                let target = self.parse_word_token()?;
                Ok(Redirection { fd, op, target: RedirTarget::Word(target) })
            }
        }
    }

    fn parse_trailing_redirections(&mut self) -> Result<Vec<Redirection>, ParseError> {
        let mut redirections = Vec::new();
        while self.at_redirection() {
            redirections.push(self.parse_redirection()?);
        }
        Ok(redirections)
    }

    // -------------------------------------------------------------------------
    // Compound commands
    // -------------------------------------------------------------------------

    /// Statements until one of `stops`; newlines and `;` separate.
    fn parse_statement_list(&mut self, stops: &[TokenKind]) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if stops.contains(&self.kind()) {
                return Ok(statements);
            }
            if self.kind() == TokenKind::Eof {
                return Err(self.err_here("unexpected end of file"));
            }
            statements.push(self.parse_statement()?);
        }
    }

    fn parse_if(&mut self) -> Result<IfCommand, ParseError> {
        self.expect(TokenKind::If, "`if'")?;
        let mut branches = Vec::new();
        let mut else_body = None;

        loop {
            let condition = self.parse_statement_list(&[TokenKind::Then])?;
            self.expect(TokenKind::Then, "`then'")?;
            let body = self.parse_statement_list(&[
                TokenKind::Elif,
                TokenKind::Else,
                TokenKind::Fi,
            ])?;
            branches.push(IfBranch { condition, body });

            match self.kind() {
                TokenKind::Elif => {
                    self.bump();
                    continue;
                }
                TokenKind::Else => {
                    self.bump();
                    else_body = Some(self.parse_statement_list(&[TokenKind::Fi])?);
                    self.expect(TokenKind::Fi, "`fi'")?;
                    break;
                }
                TokenKind::Fi => {
                    self.bump();
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        let redirections = self.parse_trailing_redirections()?;
        Ok(IfCommand { branches, else_body, redirections })
    }

    fn parse_while(&mut self) -> Result<WhileCommand, ParseError> {
        self.expect(TokenKind::While, "`while'")?;
        let condition = self.parse_statement_list(&[TokenKind::Do])?;
        let body = self.parse_do_done()?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(WhileCommand { condition, body, redirections })
    }

    fn parse_until(&mut self) -> Result<UntilCommand, ParseError> {
        self.expect(TokenKind::Until, "`until'")?;
        let condition = self.parse_statement_list(&[TokenKind::Do])?;
        let body = self.parse_do_done()?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(UntilCommand { condition, body, redirections })
    }

    fn parse_do_done(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(TokenKind::Do, "`do'")?;
        let body = self.parse_statement_list(&[TokenKind::Done])?;
        self.expect(TokenKind::Done, "`done'")?;
        Ok(body)
    }

    fn parse_for(&mut self) -> Result<Command, ParseError> {
        self.expect(TokenKind::For, "`for'")?;

        // C-style: for (( init; cond; update ))
        if self.kind() == TokenKind::ArithPayload {
            let payload = self.bump().text;
            let parts: Vec<&str> = payload.split(';').collect();
            if parts.len() != 3 {
                return Err(self.err_here("expected `((expr; expr; expr))'"));
            }
            let section = |s: &str| -> Result<Option<ArithExpr>, ParseError> {
                if s.trim().is_empty() {
                    Ok(None)
                } else {
                    arithmetic_parser::parse_arithmetic(s).map(Some)
                }
            };
            let init = section(parts[0])?;
            let condition = section(parts[1])?;
            let update = section(parts[2])?;

            self.skip_separators();
            let body = self.parse_do_done()?;
            let redirections = self.parse_trailing_redirections()?;
            return Ok(Command::Compound(CompoundCommand::CStyleFor(CStyleForCommand {
                init,
                condition,
                update,
                body,
                redirections,
            })));
        }

        let name_tok = self.bump();
        if !is_wordlike(name_tok.kind) {
            return Err(ParseError::new(
                "variable name expected after `for'",
                name_tok.line,
                name_tok.col,
            ));
        }
        let variable = name_tok.text;

        self.skip_newlines();
        let words = if self.kind() == TokenKind::In {
            self.bump();
            let mut words = Vec::new();
            while is_wordlike(self.kind()) {
                words.push(self.parse_word_token()?);
            }
            Some(words)
        } else {
            None
        };

        self.skip_separators();
        let body = self.parse_do_done()?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::Compound(CompoundCommand::For(ForCommand {
            variable,
            words,
            body,
            redirections,
        })))
    }

    fn parse_case(&mut self) -> Result<CaseCommand, ParseError> {
        self.expect(TokenKind::Case, "`case'")?;
        let subject = self.parse_word_token()?;
        self.skip_newlines();
        self.expect(TokenKind::In, "`in'")?;
        self.skip_newlines();

        let mut arms = Vec::new();
        while self.kind() != TokenKind::Esac {
            if self.kind() == TokenKind::Eof {
                return Err(self.err_here("unexpected end of file in `case'"));
            }

            if self.kind() == TokenKind::LParen {
                self.bump();
            }

            let mut patterns = vec![self.parse_word_token()?];
            while self.kind() == TokenKind::Pipe {
                self.bump();
                patterns.push(self.parse_word_token()?);
            }
            self.expect(TokenKind::RParen, "`)'")?;

            let body = self.parse_statement_list(&[
                TokenKind::DSemi,
                TokenKind::SemiAnd,
                TokenKind::DSemiAnd,
                TokenKind::Esac,
            ])?;

            let terminator = match self.kind() {
                TokenKind::DSemi => {
                    self.bump();
                    CaseTerminator::Break
                }
                TokenKind::SemiAnd => {
                    self.bump();
                    CaseTerminator::FallThrough
                }
                TokenKind::DSemiAnd => {
                    self.bump();
                    CaseTerminator::Continue
                }
                _ => CaseTerminator::Break,
            };
            arms.push(CaseArm { patterns, body, terminator });
            self.skip_newlines();
        }
        self.expect(TokenKind::Esac, "`esac'")?;

        let redirections = self.parse_trailing_redirections()?;
        Ok(CaseCommand { subject, arms, redirections })
    }

    fn parse_subshell(&mut self) -> Result<SubshellCommand, ParseError> {
        self.expect(TokenKind::LParen, "`('")?;
        let body = self.parse_statement_list(&[TokenKind::RParen])?;
        self.expect(TokenKind::RParen, "`)'")?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(SubshellCommand { body, redirections })
    }

    fn parse_group(&mut self) -> Result<GroupCommand, ParseError> {
        self.expect(TokenKind::LBrace, "`{'")?;
        let body = self.parse_statement_list(&[TokenKind::RBrace])?;
        self.expect(TokenKind::RBrace, "`}'")?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(GroupCommand { body, redirections })
    }

    // -------------------------------------------------------------------------
    // Function definitions
    // -------------------------------------------------------------------------

    fn parse_function_posix(&mut self) -> Result<Command, ParseError> {
        let name = self.bump().text;
        self.expect(TokenKind::LParen, "`('")?;
        self.expect(TokenKind::RParen, "`)'")?;
        self.skip_newlines();
        self.parse_function_body(name)
    }

    fn parse_function_keyword(&mut self) -> Result<Command, ParseError> {
        self.expect(TokenKind::Function, "`function'")?;
        let name_tok = self.bump();
        if !is_wordlike(name_tok.kind) {
            return Err(ParseError::new(
                "function name expected",
                name_tok.line,
                name_tok.col,
            ));
        }
        if self.kind() == TokenKind::LParen && self.peek_kind(1) == TokenKind::RParen {
            self.bump();
            self.bump();
        }
        self.skip_newlines();
        self.parse_function_body(name_tok.text)
    }

    fn parse_function_body(&mut self, name: String) -> Result<Command, ParseError> {
        let body_cmd = self.parse_command()?;
        let body = match body_cmd {
            Command::Compound(c) => c,
            _ => return Err(self.err_here("function body must be a compound command")),
        };
        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::FunctionDef(FunctionDef {
            name,
            body: Box::new(body),
            redirections,
        }))
    }
}

/// Strip delimiter quoting, reporting whether any quoting was present
/// (a quoted delimiter suppresses body expansion).
fn unquote_delimiter(raw: &str) -> (String, bool) {
    let mut out = String::new();
    let mut quoted = false;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                quoted = true;
                let q = c;
                for ch in chars.by_ref() {
                    if ch == q {
                        break;
                    }
                    out.push(ch);
                }
            }
            '\\' => {
                quoted = true;
                if let Some(&n) = chars.peek() {
                    out.push(n);
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    (out, quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first_simple(script: &Script) -> &SimpleCommand {
        match &script.statements[0].pipelines[0].commands[0] {
            Command::Simple(sc) => sc,
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn simple_command() {
        let script = parse("echo hello world").unwrap();
        let cmd = first_simple(&script);
        assert_eq!(cmd.name.as_ref().unwrap(), &Word::literal("echo"));
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn and_or_chain() {
        let script = parse("true && echo yes || echo no").unwrap();
        let stmt = &script.statements[0];
        assert_eq!(stmt.pipelines.len(), 3);
        assert_eq!(stmt.operators, vec![ListOp::And, ListOp::Or]);
    }

    #[test]
    fn semicolon_sequencing() {
        let script = parse("echo a; echo b").unwrap();
        assert_eq!(script.statements[0].pipelines.len(), 2);
        assert_eq!(script.statements[0].operators, vec![ListOp::Seq]);
    }

    #[test]
    fn pipeline_and_negation() {
        let script = parse("! cat file | grep x | wc -l").unwrap();
        let p = &script.statements[0].pipelines[0];
        assert!(p.negated);
        assert_eq!(p.commands.len(), 3);
    }

    #[test]
    fn background_flag() {
        let script = parse("sleep 5 &").unwrap();
        assert!(script.statements[0].background);
    }

    #[test]
    fn prefix_assignments() {
        let script = parse("A=1 B=2 env").unwrap();
        let cmd = first_simple(&script);
        assert_eq!(cmd.assignments.len(), 2);
        assert_eq!(cmd.assignments[0].name, "A");
        assert!(cmd.name.is_some());
    }

    #[test]
    fn assignment_only_command() {
        let script = parse("X=hello").unwrap();
        let cmd = first_simple(&script);
        assert!(cmd.name.is_none());
        assert_eq!(cmd.assignments.len(), 1);
    }

    #[test]
    fn append_assignment() {
        let script = parse("X+=more").unwrap();
        assert!(first_simple(&script).assignments[0].append);
    }

    #[test]
    fn array_literal_assignment() {
        let script = parse("arr=(one two three)").unwrap();
        let a = &first_simple(&script).assignments[0];
        assert_eq!(a.array.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn redirections_with_fd() {
        let script = parse("cmd >out.txt 2>&1 <in.txt").unwrap();
        let cmd = first_simple(&script);
        assert_eq!(cmd.redirections.len(), 3);
        assert_eq!(cmd.redirections[1].fd, Some(2));
        assert_eq!(cmd.redirections[1].op, RedirOp::DupOut);
    }

    #[test]
    fn spaced_number_is_argument_not_fd() {
        let script = parse("echo 2 > f").unwrap();
        let cmd = first_simple(&script);
        assert_eq!(cmd.args.len(), 1);
        assert_eq!(cmd.redirections.len(), 1);
        assert_eq!(cmd.redirections[0].fd, None);
    }

    #[test]
    fn heredoc_redirection() {
        let script = parse("cat <<EOF\nline one\nline two\nEOF\n").unwrap();
        let cmd = first_simple(&script);
        match &cmd.redirections[0].target {
            RedirTarget::HereDoc(h) => {
                assert_eq!(h.delimiter, "EOF");
                assert!(!h.quoted);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn quoted_heredoc_delimiter() {
        let script = parse("cat <<'EOF'\n$not_expanded\nEOF\n").unwrap();
        let cmd = first_simple(&script);
        match &cmd.redirections[0].target {
            RedirTarget::HereDoc(h) => {
                assert!(h.quoted);
                assert_eq!(h.body, Word::literal("$not_expanded\n"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn if_elif_else() {
        let script = parse("if a; then b; elif c; then d; else e; fi").unwrap();
        match &script.statements[0].pipelines[0].commands[0] {
            Command::Compound(CompoundCommand::If(node)) => {
                assert_eq!(node.branches.len(), 2);
                assert!(node.else_body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn for_in_loop() {
        let script = parse("for i in 1 2 3; do echo $i; done").unwrap();
        match &script.statements[0].pipelines[0].commands[0] {
            Command::Compound(CompoundCommand::For(node)) => {
                assert_eq!(node.variable, "i");
                assert_eq!(node.words.as_ref().unwrap().len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn for_without_in() {
        let script = parse("for arg; do echo $arg; done").unwrap();
        match &script.statements[0].pipelines[0].commands[0] {
            Command::Compound(CompoundCommand::For(node)) => assert!(node.words.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn c_style_for() {
        let script = parse("for ((i=0; i<3; i++)); do echo $i; done").unwrap();
        match &script.statements[0].pipelines[0].commands[0] {
            Command::Compound(CompoundCommand::CStyleFor(node)) => {
                assert!(node.init.is_some());
                assert!(node.condition.is_some());
                assert!(node.update.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn while_loop() {
        let script = parse("while true; do echo x; done").unwrap();
        assert!(matches!(
            &script.statements[0].pipelines[0].commands[0],
            Command::Compound(CompoundCommand::While(_))
        ));
    }

    #[test]
    fn case_with_terminators() {
        let script = parse("case $x in a) echo a ;; b|c) echo bc ;& d) echo d ;;& *) echo other ;; esac").unwrap();
        match &script.statements[0].pipelines[0].commands[0] {
            Command::Compound(CompoundCommand::Case(node)) => {
                assert_eq!(node.arms.len(), 4);
                assert_eq!(node.arms[0].terminator, CaseTerminator::Break);
                assert_eq!(node.arms[1].terminator, CaseTerminator::FallThrough);
                assert_eq!(node.arms[1].patterns.len(), 2);
                assert_eq!(node.arms[2].terminator, CaseTerminator::Continue);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn subshell_and_group() {
        let script = parse("(echo a; echo b)").unwrap();
        assert!(matches!(
            &script.statements[0].pipelines[0].commands[0],
            Command::Compound(CompoundCommand::Subshell(_))
        ));
        let script = parse("{ echo a; echo b; }").unwrap();
        assert!(matches!(
            &script.statements[0].pipelines[0].commands[0],
            Command::Compound(CompoundCommand::Group(_))
        ));
    }

    #[test]
    fn arithmetic_command() {
        let script = parse("(( x > 3 ))").unwrap();
        assert!(matches!(
            &script.statements[0].pipelines[0].commands[0],
            Command::Compound(CompoundCommand::Arith(_))
        ));
    }

    #[test]
    fn conditional_command() {
        let script = parse("[[ -f file && $x == y ]]").unwrap();
        assert!(matches!(
            &script.statements[0].pipelines[0].commands[0],
            Command::Compound(CompoundCommand::Cond(_))
        ));
    }

    #[test]
    fn function_definitions() {
        for src in ["greet() { echo hi; }", "function greet { echo hi; }", "function greet() { echo hi; }"] {
            let script = parse(src).unwrap();
            match &script.statements[0].pipelines[0].commands[0] {
                Command::FunctionDef(f) => assert_eq!(f.name, "greet"),
                other => panic!("unexpected {:?} for {}", other, src),
            }
        }
    }

    #[test]
    fn reserved_word_as_argument() {
        let script = parse("echo if then done").unwrap();
        assert_eq!(first_simple(&script).args.len(), 3);
    }

    #[test]
    fn parse_errors_are_values() {
        assert!(parse("if true; then").is_err());
        assert!(parse("while ; done").is_err());
        assert!(parse("fi").is_err());
        assert!(parse("echo 'unterminated").is_err());
    }

    #[test]
    fn multiline_script() {
        let script = parse("echo one\necho two\n\necho three\n").unwrap();
        assert_eq!(script.statements.len(), 3);
    }

    #[test]
    fn newline_after_logical_operator() {
        let script = parse("true &&\necho yes").unwrap();
        assert_eq!(script.statements[0].pipelines.len(), 2);
    }
}
