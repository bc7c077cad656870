//! Arithmetic evaluation over `ArithExpr` trees.
//!
//! Signed 64-bit wrapping semantics. Assignments and `++`/`--` write
//! straight into the environment. A variable whose value is itself an
//! expression is evaluated recursively, one nesting level at a time up
//! to a small depth cap so `x=x` cannot loop.

use crate::ast::types::{ArithAssignOp, ArithBinOp, ArithExpr, ArithUnOp};
use crate::interpreter::types::ShellState;
use crate::parser::arithmetic_parser;

const MAX_VALUE_RECURSION: u32 = 16;

/// Arithmetic failure: division by zero, bad exponent, unparsable
/// variable content. Fails the enclosing command with status 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithError {
    pub message: String,
}

impl ArithError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub fn eval_arith(state: &mut ShellState, expr: &ArithExpr) -> Result<i64, ArithError> {
    eval(state, expr, 0)
}

fn eval(state: &mut ShellState, expr: &ArithExpr, depth: u32) -> Result<i64, ArithError> {
    match expr {
        ArithExpr::Number(n) => Ok(*n),
        ArithExpr::Var(name) => lookup(state, name, depth),
        ArithExpr::Element { name, index } => {
            let idx = eval(state, index, depth)?;
            let key = element_key(name, idx);
            let text = state.get_var(&key).unwrap_or_default();
            value_of(state, text, depth)
        }
        ArithExpr::Group(inner) => eval(state, inner, depth),
        ArithExpr::Unary { op, operand, prefix } => eval_unary(state, *op, operand, *prefix, depth),
        ArithExpr::Binary { op, lhs, rhs } => eval_binary(state, *op, lhs, rhs, depth),
        ArithExpr::Ternary { cond, then, otherwise } => {
            if eval(state, cond, depth)? != 0 {
                eval(state, then, depth)
            } else {
                eval(state, otherwise, depth)
            }
        }
        ArithExpr::Assign { op, name, index, value } => {
            let key = match index {
                Some(i) => {
                    let idx = eval(state, i, depth)?;
                    element_key(name, idx)
                }
                None => name.clone(),
            };
            let rhs = eval(state, value, depth)?;
            let new = if *op == ArithAssignOp::Assign {
                rhs
            } else {
                let cur_text = state.get_var(&key).unwrap_or_default();
                let current = value_of(state, cur_text, depth)?;
                match op {
                    ArithAssignOp::Assign => unreachable!(),
                    ArithAssignOp::Add => current.wrapping_add(rhs),
                    ArithAssignOp::Sub => current.wrapping_sub(rhs),
                    ArithAssignOp::Mul => current.wrapping_mul(rhs),
                    ArithAssignOp::Div => checked_div(current, rhs)?,
                    ArithAssignOp::Mod => checked_rem(current, rhs)?,
                    ArithAssignOp::Shl => shift_left(current, rhs),
                    ArithAssignOp::Shr => shift_right(current, rhs),
                    ArithAssignOp::And => current & rhs,
                    ArithAssignOp::Or => current | rhs,
                    ArithAssignOp::Xor => current ^ rhs,
                }
            };
            state.set_var(&key, new.to_string());
            Ok(new)
        }
    }
}

fn element_key(name: &str, index: i64) -> String {
    if index == 0 {
        name.to_string()
    } else {
        format!("{}[{}]", name, index)
    }
}

fn lookup(state: &mut ShellState, name: &str, depth: u32) -> Result<i64, ArithError> {
    let value = state.get_var(name).unwrap_or_default();
    value_of(state, value, depth)
}

/// Interpret a variable's text as an arithmetic value: a number, or an
/// expression to evaluate.
fn value_of(state: &mut ShellState, text: String, depth: u32) -> Result<i64, ArithError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    if depth >= MAX_VALUE_RECURSION {
        return Err(ArithError::new("expression recursion level exceeded"));
    }
    let parsed = arithmetic_parser::parse_arithmetic(trimmed)
        .map_err(|_| ArithError::new(format!("{}: syntax error in expression", trimmed)))?;
    eval(state, &parsed, depth + 1)
}

fn eval_unary(
    state: &mut ShellState,
    op: ArithUnOp,
    operand: &ArithExpr,
    prefix: bool,
    depth: u32,
) -> Result<i64, ArithError> {
    match op {
        ArithUnOp::Neg => Ok(eval(state, operand, depth)?.wrapping_neg()),
        ArithUnOp::Plus => eval(state, operand, depth),
        ArithUnOp::Not => Ok((eval(state, operand, depth)? == 0) as i64),
        ArithUnOp::BitNot => Ok(!eval(state, operand, depth)?),
        ArithUnOp::Inc | ArithUnOp::Dec => {
            let key = match operand {
                ArithExpr::Var(name) => name.clone(),
                ArithExpr::Element { name, index } => {
                    let idx = eval(state, index, depth)?;
                    element_key(name, idx)
                }
                _ => return Err(ArithError::new("++/-- needs a variable")),
            };
            let cur_text = state.get_var(&key).unwrap_or_default();
            let old = value_of(state, cur_text, depth)?;
            let new = if op == ArithUnOp::Inc {
                old.wrapping_add(1)
            } else {
                old.wrapping_sub(1)
            };
            state.set_var(&key, new.to_string());
            Ok(if prefix { new } else { old })
        }
    }
}

fn eval_binary(
    state: &mut ShellState,
    op: ArithBinOp,
    lhs: &ArithExpr,
    rhs: &ArithExpr,
    depth: u32,
) -> Result<i64, ArithError> {
    // Short-circuit forms evaluate the right side conditionally.
    match op {
        ArithBinOp::LogicalAnd => {
            if eval(state, lhs, depth)? == 0 {
                return Ok(0);
            }
            return Ok((eval(state, rhs, depth)? != 0) as i64);
        }
        ArithBinOp::LogicalOr => {
            if eval(state, lhs, depth)? != 0 {
                return Ok(1);
            }
            return Ok((eval(state, rhs, depth)? != 0) as i64);
        }
        ArithBinOp::Comma => {
            eval(state, lhs, depth)?;
            return eval(state, rhs, depth);
        }
        _ => {}
    }

    let a = eval(state, lhs, depth)?;
    let b = eval(state, rhs, depth)?;
    Ok(match op {
        ArithBinOp::Add => a.wrapping_add(b),
        ArithBinOp::Sub => a.wrapping_sub(b),
        ArithBinOp::Mul => a.wrapping_mul(b),
        ArithBinOp::Div => checked_div(a, b)?,
        ArithBinOp::Mod => checked_rem(a, b)?,
        ArithBinOp::Pow => {
            if b < 0 {
                return Err(ArithError::new(format!("exponent less than 0 (error token is \"{}\")", b)));
            }
            let mut acc: i64 = 1;
            for _ in 0..b {
                acc = acc.wrapping_mul(a);
            }
            acc
        }
        ArithBinOp::Shl => shift_left(a, b),
        ArithBinOp::Shr => shift_right(a, b),
        ArithBinOp::Lt => (a < b) as i64,
        ArithBinOp::Le => (a <= b) as i64,
        ArithBinOp::Gt => (a > b) as i64,
        ArithBinOp::Ge => (a >= b) as i64,
        ArithBinOp::Eq => (a == b) as i64,
        ArithBinOp::Ne => (a != b) as i64,
        ArithBinOp::BitAnd => a & b,
        ArithBinOp::BitOr => a | b,
        ArithBinOp::BitXor => a ^ b,
        ArithBinOp::LogicalAnd | ArithBinOp::LogicalOr | ArithBinOp::Comma => unreachable!(),
    })
}

fn checked_div(a: i64, b: i64) -> Result<i64, ArithError> {
    if b == 0 {
        return Err(ArithError::new("division by 0"));
    }
    Ok(a.wrapping_div(b))
}

fn checked_rem(a: i64, b: i64) -> Result<i64, ArithError> {
    if b == 0 {
        return Err(ArithError::new("division by 0"));
    }
    Ok(a.wrapping_rem(b))
}

fn shift_left(a: i64, b: i64) -> i64 {
    a.wrapping_shl((b & 63) as u32)
}

fn shift_right(a: i64, b: i64) -> i64 {
    a.wrapping_shr((b & 63) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::arithmetic_parser::parse_arithmetic;

    fn eval_text(state: &mut ShellState, text: &str) -> Result<i64, ArithError> {
        let expr = parse_arithmetic(text).unwrap();
        eval_arith(state, &expr)
    }

    #[test]
    fn basic_math() {
        let mut s = ShellState::new();
        assert_eq!(eval_text(&mut s, "1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval_text(&mut s, "(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval_text(&mut s, "2 ** 10").unwrap(), 1024);
        assert_eq!(eval_text(&mut s, "7 % 3").unwrap(), 1);
        assert_eq!(eval_text(&mut s, "-5 + 2").unwrap(), -3);
    }

    #[test]
    fn division_by_zero_is_error() {
        let mut s = ShellState::new();
        assert!(eval_text(&mut s, "1 / 0").is_err());
        assert!(eval_text(&mut s, "1 % 0").is_err());
    }

    #[test]
    fn variables_default_to_zero() {
        let mut s = ShellState::new();
        assert_eq!(eval_text(&mut s, "missing + 1").unwrap(), 1);
    }

    #[test]
    fn assignment_side_effects() {
        let mut s = ShellState::new();
        assert_eq!(eval_text(&mut s, "x = 5").unwrap(), 5);
        assert_eq!(s.get_var("x"), Some("5".to_string()));
        assert_eq!(eval_text(&mut s, "x += 3").unwrap(), 8);
        assert_eq!(s.get_var("x"), Some("8".to_string()));
    }

    #[test]
    fn increment_and_decrement() {
        let mut s = ShellState::new();
        s.set_var("i", "5");
        assert_eq!(eval_text(&mut s, "i++").unwrap(), 5);
        assert_eq!(s.get_var("i"), Some("6".to_string()));
        assert_eq!(eval_text(&mut s, "++i").unwrap(), 7);
        assert_eq!(eval_text(&mut s, "i--").unwrap(), 7);
        assert_eq!(s.get_var("i"), Some("6".to_string()));
    }

    #[test]
    fn logical_short_circuit() {
        let mut s = ShellState::new();
        // The right side must not run: x stays unset.
        assert_eq!(eval_text(&mut s, "0 && (x = 9)").unwrap(), 0);
        assert_eq!(s.get_var("x"), None);
        assert_eq!(eval_text(&mut s, "1 || (x = 9)").unwrap(), 1);
        assert_eq!(s.get_var("x"), None);
    }

    #[test]
    fn comparisons_yield_bool_ints() {
        let mut s = ShellState::new();
        assert_eq!(eval_text(&mut s, "3 < 5").unwrap(), 1);
        assert_eq!(eval_text(&mut s, "5 <= 4").unwrap(), 0);
        assert_eq!(eval_text(&mut s, "2 == 2").unwrap(), 1);
    }

    #[test]
    fn ternary_and_comma() {
        let mut s = ShellState::new();
        assert_eq!(eval_text(&mut s, "1 ? 10 : 20").unwrap(), 10);
        assert_eq!(eval_text(&mut s, "0 ? 10 : 20").unwrap(), 20);
        assert_eq!(eval_text(&mut s, "x = 1, x + 1").unwrap(), 2);
    }

    #[test]
    fn variable_holding_expression() {
        let mut s = ShellState::new();
        s.set_var("e", "2 + 3");
        assert_eq!(eval_text(&mut s, "e * 2").unwrap(), 10);
    }

    #[test]
    fn self_referential_variable_is_error_not_hang() {
        let mut s = ShellState::new();
        s.set_var("x", "x + 1");
        assert!(eval_text(&mut s, "x").is_err());
    }

    #[test]
    fn array_elements() {
        let mut s = ShellState::new();
        s.set_var("a", "10");
        s.set_var("a[1]", "20");
        assert_eq!(eval_text(&mut s, "a[0] + a[1]").unwrap(), 30);
        assert_eq!(eval_text(&mut s, "a[2] = 5").unwrap(), 5);
        assert_eq!(s.get_var("a[2]"), Some("5".to_string()));
    }

    #[test]
    fn negative_exponent_is_error() {
        let mut s = ShellState::new();
        assert!(eval_text(&mut s, "2 ** -1").is_err());
    }
}
