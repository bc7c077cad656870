//! Conditional expression parser for `[[ ... ]]`.
//!
//! The lexer hands over the payload between the brackets; this module
//! splits it into operand words and operators, then builds the
//! conditional tree with `!` binding tighter than `&&`, which binds
//! tighter than `||`.

use crate::ast::types::{CondBinOp, CondExpr, CondUnOp, Word};
use crate::parser::{word_parser, ParseError};

pub fn parse_conditional(payload: &str) -> Result<CondExpr, ParseError> {
    let tokens = split_tokens(payload);
    if tokens.is_empty() {
        return Err(ParseError::new("conditional expression expected", 1, 1));
    }
    let mut p = CondParser { tokens, pos: 0 };
    let expr = p.parse_or()?;
    if p.pos < p.tokens.len() {
        return Err(ParseError::new(
            format!("unexpected token `{}' in conditional expression", p.tokens[p.pos]),
            1,
            1,
        ));
    }
    Ok(expr)
}

/// Whitespace-separated raw tokens, but quotes, `$()`, `${}` and
/// backslashes keep their runs together.
fn split_tokens(payload: &str) -> Vec<String> {
    let chars: Vec<char> = payload.chars().collect();
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            if !buf.is_empty() {
                tokens.push(std::mem::take(&mut buf));
            }
            i += 1;
            continue;
        }
        match c {
            '\'' => {
                buf.push(c);
                i += 1;
                while i < chars.len() {
                    buf.push(chars[i]);
                    if chars[i] == '\'' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '"' => {
                buf.push(c);
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        buf.push(chars[i]);
                        buf.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    buf.push(chars[i]);
                    if chars[i] == '"' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '\\' => {
                buf.push(c);
                i += 1;
                if i < chars.len() {
                    buf.push(chars[i]);
                    i += 1;
                }
            }
            '$' if chars.get(i + 1) == Some(&'(') || chars.get(i + 1) == Some(&'{') => {
                let (open, close) = if chars[i + 1] == '(' { ('(', ')') } else { ('{', '}') };
                buf.push('$');
                i += 1;
                let mut depth = 0usize;
                while i < chars.len() {
                    let ch = chars[i];
                    buf.push(ch);
                    if ch == open {
                        depth += 1;
                    } else if ch == close {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    i += 1;
                }
            }
            _ => {
                buf.push(c);
                i += 1;
            }
        }
    }
    if !buf.is_empty() {
        tokens.push(buf);
    }
    tokens
}

fn unary_op(token: &str) -> Option<CondUnOp> {
    Some(match token {
        "-e" | "-a" => CondUnOp::Exists,
        "-f" => CondUnOp::IsFile,
        "-d" => CondUnOp::IsDir,
        "-r" => CondUnOp::Readable,
        "-w" => CondUnOp::Writable,
        "-x" => CondUnOp::Executable,
        "-s" => CondUnOp::NonEmptyFile,
        "-L" | "-h" => CondUnOp::IsSymlink,
        "-z" => CondUnOp::ZeroLength,
        "-n" => CondUnOp::NonZeroLength,
        "-v" => CondUnOp::VarSet,
        _ => return None,
    })
}

fn binary_op(token: &str) -> Option<CondBinOp> {
    Some(match token {
        "=" | "==" => CondBinOp::StrEq,
        "!=" => CondBinOp::StrNe,
        "=~" => CondBinOp::Match,
        "<" => CondBinOp::StrLt,
        ">" => CondBinOp::StrGt,
        "-eq" => CondBinOp::IntEq,
        "-ne" => CondBinOp::IntNe,
        "-lt" => CondBinOp::IntLt,
        "-le" => CondBinOp::IntLe,
        "-gt" => CondBinOp::IntGt,
        "-ge" => CondBinOp::IntGe,
        "-nt" => CondBinOp::NewerThan,
        "-ot" => CondBinOp::OlderThan,
        "-ef" => CondBinOp::SameFile,
        _ => return None,
    })
}

struct CondParser {
    tokens: Vec<String>,
    pos: usize,
}

impl CondParser {
    fn cur(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|s| s.as_str())
    }

    fn parse_or(&mut self) -> Result<CondExpr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.cur() == Some("||") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = CondExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<CondExpr, ParseError> {
        let mut lhs = self.parse_not()?;
        while self.cur() == Some("&&") {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = CondExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<CondExpr, ParseError> {
        if self.cur() == Some("!") {
            self.pos += 1;
            let inner = self.parse_not()?;
            return Ok(CondExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<CondExpr, ParseError> {
        let token = match self.cur() {
            Some(t) => t.to_string(),
            None => return Err(ParseError::new("conditional operand expected", 1, 1)),
        };

        if token == "(" {
            self.pos += 1;
            let inner = self.parse_or()?;
            if self.cur() != Some(")") {
                return Err(ParseError::new("expected `)' in conditional expression", 1, 1));
            }
            self.pos += 1;
            return Ok(CondExpr::Group(Box::new(inner)));
        }

        if let Some(op) = unary_op(&token) {
            self.pos += 1;
            let operand = self.operand_word()?;
            return Ok(CondExpr::Unary { op, operand });
        }

        let lhs = self.operand_word()?;
        if let Some(op) = self.cur().and_then(binary_op) {
            self.pos += 1;
            let rhs = self.operand_word()?;
            return Ok(CondExpr::Binary { op, lhs, rhs });
        }
        Ok(CondExpr::Word(lhs))
    }

    fn operand_word(&mut self) -> Result<Word, ParseError> {
        let token = match self.cur() {
            Some(t) if !matches!(t, "&&" | "||" | ")") => t.to_string(),
            _ => return Err(ParseError::new("conditional operand expected", 1, 1)),
        };
        self.pos += 1;
        word_parser::parse_word(&token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unary_file_test() {
        let e = parse_conditional("-f /etc/passwd").unwrap();
        assert!(matches!(e, CondExpr::Unary { op: CondUnOp::IsFile, .. }));
    }

    #[test]
    fn binary_string_test() {
        let e = parse_conditional("$x == hello").unwrap();
        assert!(matches!(e, CondExpr::Binary { op: CondBinOp::StrEq, .. }));
    }

    #[test]
    fn regex_match() {
        let e = parse_conditional("$x =~ ^[0-9]+$").unwrap();
        assert!(matches!(e, CondExpr::Binary { op: CondBinOp::Match, .. }));
    }

    #[test]
    fn integer_comparison() {
        let e = parse_conditional("3 -lt 5").unwrap();
        assert!(matches!(e, CondExpr::Binary { op: CondBinOp::IntLt, .. }));
    }

    #[test]
    fn and_or_not() {
        let e = parse_conditional("-f a && ! -d b || -e c").unwrap();
        assert!(matches!(e, CondExpr::Or(_, _)));
    }

    #[test]
    fn grouping() {
        let e = parse_conditional("( -f a || -f b ) && -r c").unwrap();
        match e {
            CondExpr::And(lhs, _) => assert!(matches!(*lhs, CondExpr::Group(_))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bare_word_is_nonempty_test() {
        let e = parse_conditional("$x").unwrap();
        assert!(matches!(e, CondExpr::Word(_)));
    }

    #[test]
    fn quoted_operands_keep_spaces() {
        let e = parse_conditional("\"a b\" == \"a b\"").unwrap();
        assert!(matches!(e, CondExpr::Binary { op: CondBinOp::StrEq, .. }));
    }

    #[test]
    fn empty_is_error() {
        assert!(parse_conditional("").is_err());
        assert!(parse_conditional("-f").is_err());
    }
}
