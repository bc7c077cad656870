//! Arithmetic expression parser.
//!
//! Precedence-climbing parser for `$(( ... ))`, `(( ... ))`, C-style for
//! headers, and array subscripts. Works on the payload text captured by
//! the lexer.

use crate::ast::types::{ArithAssignOp, ArithBinOp, ArithExpr, ArithUnOp};
use crate::parser::ParseError;

/// Parse arithmetic text. Empty input evaluates to zero, which is what
/// `${v::n}` offsets and bare `(( ))` sections rely on.
pub fn parse_arithmetic(text: &str) -> Result<ArithExpr, ParseError> {
    let tokens = scan(text)?;
    if tokens.is_empty() {
        return Ok(ArithExpr::Number(0));
    }
    let mut p = ArithParser { tokens, pos: 0 };
    let expr = p.parse_comma()?;
    if p.pos < p.tokens.len() {
        return Err(ParseError::new(
            format!("arithmetic syntax error near `{}'", p.tokens[p.pos].text()),
            1,
            1,
        ));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum ATok {
    Num(i64),
    Ident(String),
    Op(&'static str),
}

impl ATok {
    fn text(&self) -> String {
        match self {
            ATok::Num(n) => n.to_string(),
            ATok::Ident(s) => s.clone(),
            ATok::Op(s) => s.to_string(),
        }
    }
}

const ARITH_OPS: &[&str] = &[
    "<<=", ">>=", "**", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "=", "+", "-", "*", "/", "%", "<", ">", "!", "~", "&",
    "|", "^", "?", ":", ",", "(", ")", "[", "]",
];

fn scan(text: &str) -> Result<Vec<ATok>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    'outer: while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '#') {
                i += 1;
            }
            let lit: String = chars[start..i].iter().collect();
            tokens.push(ATok::Num(parse_number(&lit)?));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(ATok::Ident(chars[start..i].iter().collect()));
            continue;
        }

        // $name and ${name} are plain variable references here
        if c == '$' {
            i += 1;
            if i < chars.len() && chars[i] == '{' {
                let start = i + 1;
                while i < chars.len() && chars[i] != '}' {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                i += 1;
                tokens.push(ATok::Ident(name));
                continue;
            }
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            if start == i {
                return Err(ParseError::new("arithmetic syntax error near `$'", 1, 1));
            }
            tokens.push(ATok::Ident(chars[start..i].iter().collect()));
            continue;
        }

        for op in ARITH_OPS {
            let len = op.len();
            if chars.len() - i >= len && chars[i..i + len].iter().collect::<String>() == **op {
                tokens.push(ATok::Op(op));
                i += len;
                continue 'outer;
            }
        }

        return Err(ParseError::new(
            format!("arithmetic syntax error near `{}'", c),
            1,
            1,
        ));
    }
    Ok(tokens)
}

/// Integer literal: decimal, `0x` hex, leading-zero octal, or `base#value`.
fn parse_number(lit: &str) -> Result<i64, ParseError> {
    let bad = || ParseError::new(format!("invalid arithmetic number: `{}'", lit), 1, 1);

    if let Some((base_str, digits)) = lit.split_once('#') {
        let base: u32 = base_str.parse().map_err(|_| bad())?;
        if !(2..=36).contains(&base) {
            return Err(bad());
        }
        return i64::from_str_radix(digits, base).map_err(|_| bad());
    }
    if let Some(hex) = lit.strip_prefix("0x").or_else(|| lit.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map_err(|_| bad());
    }
    if lit.len() > 1 && lit.starts_with('0') {
        return i64::from_str_radix(&lit[1..], 8).map_err(|_| bad());
    }
    lit.parse().map_err(|_| bad())
}

struct ArithParser {
    tokens: Vec<ATok>,
    pos: usize,
}

impl ArithParser {
    fn cur(&self) -> Option<&ATok> {
        self.tokens.get(self.pos)
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.cur(), Some(ATok::Op(o)) if *o == op)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), ParseError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("arithmetic: expected `{}'", op),
                1,
                1,
            ))
        }
    }

    fn err_here(&self, what: &str) -> ParseError {
        let near = self.cur().map(|t| t.text()).unwrap_or_else(|| "end of expression".into());
        ParseError::new(format!("arithmetic: {} near `{}'", what, near), 1, 1)
    }

    fn parse_comma(&mut self) -> Result<ArithExpr, ParseError> {
        let mut lhs = self.parse_assign()?;
        while self.eat_op(",") {
            let rhs = self.parse_assign()?;
            lhs = ArithExpr::Binary {
                op: ArithBinOp::Comma,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_assign(&mut self) -> Result<ArithExpr, ParseError> {
        let save = self.pos;
        let lhs = self.parse_ternary()?;

        let assign_op = match self.cur() {
            Some(ATok::Op("=")) => Some(ArithAssignOp::Assign),
            Some(ATok::Op("+=")) => Some(ArithAssignOp::Add),
            Some(ATok::Op("-=")) => Some(ArithAssignOp::Sub),
            Some(ATok::Op("*=")) => Some(ArithAssignOp::Mul),
            Some(ATok::Op("/=")) => Some(ArithAssignOp::Div),
            Some(ATok::Op("%=")) => Some(ArithAssignOp::Mod),
            Some(ATok::Op("<<=")) => Some(ArithAssignOp::Shl),
            Some(ATok::Op(">>=")) => Some(ArithAssignOp::Shr),
            Some(ATok::Op("&=")) => Some(ArithAssignOp::And),
            Some(ATok::Op("|=")) => Some(ArithAssignOp::Or),
            Some(ATok::Op("^=")) => Some(ArithAssignOp::Xor),
            _ => None,
        };

        if let Some(op) = assign_op {
            match lhs {
                ArithExpr::Var(name) => {
                    self.pos += 1;
                    let value = self.parse_assign()?;
                    return Ok(ArithExpr::Assign {
                        op,
                        name,
                        index: None,
                        value: Box::new(value),
                    });
                }
                ArithExpr::Element { name, index } => {
                    self.pos += 1;
                    let value = self.parse_assign()?;
                    return Ok(ArithExpr::Assign {
                        op,
                        name,
                        index: Some(index),
                        value: Box::new(value),
                    });
                }
                _ => {
                    self.pos = save;
                    return Err(self.err_here("assignment to non-variable"));
                }
            }
        }
        Ok(lhs)
    }

    fn parse_ternary(&mut self) -> Result<ArithExpr, ParseError> {
        let cond = self.parse_binary(0)?;
        if self.eat_op("?") {
            let then = self.parse_assign()?;
            self.expect_op(":")?;
            let otherwise = self.parse_ternary()?;
            return Ok(ArithExpr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    /// Binary operators by precedence level, lowest first.
    fn parse_binary(&mut self, level: usize) -> Result<ArithExpr, ParseError> {
        const LEVELS: &[&[(&str, ArithBinOp)]] = &[
            &[("||", ArithBinOp::LogicalOr)],
            &[("&&", ArithBinOp::LogicalAnd)],
            &[("|", ArithBinOp::BitOr)],
            &[("^", ArithBinOp::BitXor)],
            &[("&", ArithBinOp::BitAnd)],
            &[("==", ArithBinOp::Eq), ("!=", ArithBinOp::Ne)],
            &[
                ("<=", ArithBinOp::Le),
                (">=", ArithBinOp::Ge),
                ("<", ArithBinOp::Lt),
                (">", ArithBinOp::Gt),
            ],
            &[("<<", ArithBinOp::Shl), (">>", ArithBinOp::Shr)],
            &[("+", ArithBinOp::Add), ("-", ArithBinOp::Sub)],
            &[
                ("*", ArithBinOp::Mul),
                ("/", ArithBinOp::Div),
                ("%", ArithBinOp::Mod),
            ],
        ];

        if level >= LEVELS.len() {
            return self.parse_power();
        }

        let mut lhs = self.parse_binary(level + 1)?;
        'scan: loop {
            for (text, op) in LEVELS[level] {
                if self.at_op(text) {
                    self.pos += 1;
                    let rhs = self.parse_binary(level + 1)?;
                    lhs = ArithExpr::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue 'scan;
                }
            }
            break;
        }
        Ok(lhs)
    }

    /// `**` binds tighter than `*` and associates right.
    fn parse_power(&mut self) -> Result<ArithExpr, ParseError> {
        let base = self.parse_unary()?;
        if self.eat_op("**") {
            let exp = self.parse_power()?;
            return Ok(ArithExpr::Binary {
                op: ArithBinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exp),
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<ArithExpr, ParseError> {
        for (text, op) in [
            ("++", ArithUnOp::Inc),
            ("--", ArithUnOp::Dec),
            ("!", ArithUnOp::Not),
            ("~", ArithUnOp::BitNot),
            ("-", ArithUnOp::Neg),
            ("+", ArithUnOp::Plus),
        ] {
            if self.eat_op(text) {
                let operand = self.parse_unary()?;
                return Ok(ArithExpr::Unary {
                    op,
                    operand: Box::new(operand),
                    prefix: true,
                });
            }
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ArithExpr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at_op("++") || self.at_op("--") {
                // Postfix only applies to lvalues; `5++` is a syntax error.
                if !matches!(expr, ArithExpr::Var(_) | ArithExpr::Element { .. }) {
                    return Err(self.err_here("`++'/`--' on non-variable"));
                }
                let op = if self.eat_op("++") {
                    ArithUnOp::Inc
                } else {
                    self.eat_op("--");
                    ArithUnOp::Dec
                };
                expr = ArithExpr::Unary {
                    op,
                    operand: Box::new(expr),
                    prefix: false,
                };
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ArithExpr, ParseError> {
        match self.cur().cloned() {
            Some(ATok::Num(n)) => {
                self.pos += 1;
                Ok(ArithExpr::Number(n))
            }
            Some(ATok::Ident(name)) => {
                self.pos += 1;
                if self.eat_op("[") {
                    let index = self.parse_comma()?;
                    self.expect_op("]")?;
                    return Ok(ArithExpr::Element {
                        name,
                        index: Box::new(index),
                    });
                }
                Ok(ArithExpr::Var(name))
            }
            Some(ATok::Op("(")) => {
                self.pos += 1;
                let inner = self.parse_comma()?;
                self.expect_op(")")?;
                Ok(ArithExpr::Group(Box::new(inner)))
            }
            _ => Err(self.err_here("operand expected")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ArithExpr {
        parse_arithmetic(text).unwrap()
    }

    #[test]
    fn numbers() {
        assert_eq!(parse("42"), ArithExpr::Number(42));
        assert_eq!(parse("0x1f"), ArithExpr::Number(31));
        assert_eq!(parse("010"), ArithExpr::Number(8));
        assert_eq!(parse("2#101"), ArithExpr::Number(5));
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(parse(""), ArithExpr::Number(0));
        assert_eq!(parse("   "), ArithExpr::Number(0));
    }

    #[test]
    fn precedence_mul_over_add() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match parse("1 + 2 * 3") {
            ArithExpr::Binary { op: ArithBinOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, ArithExpr::Binary { op: ArithBinOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn power_is_right_assoc() {
        // 2 ** 3 ** 2 parses as 2 ** (3 ** 2)
        match parse("2 ** 3 ** 2") {
            ArithExpr::Binary { op: ArithBinOp::Pow, rhs, .. } => {
                assert!(matches!(*rhs, ArithExpr::Binary { op: ArithBinOp::Pow, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn assignment_forms() {
        assert!(matches!(
            parse("x = 1"),
            ArithExpr::Assign { op: ArithAssignOp::Assign, .. }
        ));
        assert!(matches!(
            parse("x += 2"),
            ArithExpr::Assign { op: ArithAssignOp::Add, .. }
        ));
        match parse("a[3] = 7") {
            ArithExpr::Assign { name, index, .. } => {
                assert_eq!(name, "a");
                assert!(index.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ternary() {
        assert!(matches!(parse("x ? 1 : 2"), ArithExpr::Ternary { .. }));
    }

    #[test]
    fn prefix_and_postfix() {
        assert!(matches!(
            parse("++x"),
            ArithExpr::Unary { op: ArithUnOp::Inc, prefix: true, .. }
        ));
        assert!(matches!(
            parse("x--"),
            ArithExpr::Unary { op: ArithUnOp::Dec, prefix: false, .. }
        ));
    }

    #[test]
    fn dollar_variables() {
        assert_eq!(parse("$x"), ArithExpr::Var("x".into()));
        assert_eq!(parse("${x}"), ArithExpr::Var("x".into()));
    }

    #[test]
    fn comma_sequences() {
        assert!(matches!(
            parse("x = 1, y = 2"),
            ArithExpr::Binary { op: ArithBinOp::Comma, .. }
        ));
    }

    #[test]
    fn syntax_errors() {
        assert!(parse_arithmetic("1 +").is_err());
        assert!(parse_arithmetic("(1").is_err());
        assert!(parse_arithmetic("5++").is_err());
        assert!(parse_arithmetic("2 @ 3").is_err());
    }
}
