//! `[[ ... ]]` evaluation.
//!
//! Success is `true`; the executor maps it to status 0/1. `=~` compiles
//! the right-hand side as an unanchored regex and records captures in
//! `BASH_REMATCH`. Glob comparisons against `==`/`!=` are anchored
//! full-string matches; `<` and `>` compare byte order.

use crate::ast::types::{CondBinOp, CondExpr, CondUnOp, Word};
use crate::interpreter::engine::Engine;
use crate::interpreter::expansion::{
    expand_word_as_pattern, expand_word_single, ExpCtx, ExpandError,
};
use crate::interpreter::pattern;
use crate::interpreter::types::{CommandOutput, ShellState};
use regex_lite::Regex;

pub fn eval_cond(
    engine: &Engine,
    state: &mut ShellState,
    expr: &CondExpr,
    ctx: &mut ExpCtx,
) -> Result<bool, ExpandError> {
    match expr {
        CondExpr::Not(inner) => Ok(!eval_cond(engine, state, inner, ctx)?),
        CondExpr::And(lhs, rhs) => {
            Ok(eval_cond(engine, state, lhs, ctx)? && eval_cond(engine, state, rhs, ctx)?)
        }
        CondExpr::Or(lhs, rhs) => {
            Ok(eval_cond(engine, state, lhs, ctx)? || eval_cond(engine, state, rhs, ctx)?)
        }
        CondExpr::Group(inner) => eval_cond(engine, state, inner, ctx),
        CondExpr::Word(word) => {
            let value = expand_word_single(engine, state, word, ctx)?;
            Ok(!value.is_empty())
        }
        CondExpr::Unary { op, operand } => eval_unary(engine, state, *op, operand, ctx),
        CondExpr::Binary { op, lhs, rhs } => eval_binary(engine, state, *op, lhs, rhs, ctx),
    }
}

fn eval_unary(
    engine: &Engine,
    state: &mut ShellState,
    op: CondUnOp,
    operand: &Word,
    ctx: &mut ExpCtx,
) -> Result<bool, ExpandError> {
    let value = expand_word_single(engine, state, operand, ctx)?;

    match op {
        CondUnOp::ZeroLength => return Ok(value.is_empty()),
        CondUnOp::NonZeroLength => return Ok(!value.is_empty()),
        CondUnOp::VarSet => return Ok(state.is_var_set(&value) && state.get_var(&value).is_some()),
        _ => {}
    }

    let fs = engine.fs();
    let path = fs.resolve(&state.cwd, &value);
    let stat = fs.stat(&path);

    Ok(match op {
        CondUnOp::Exists => stat.is_ok(),
        CondUnOp::IsFile => stat.map(|s| s.is_file).unwrap_or(false),
        CondUnOp::IsDir => stat.map(|s| s.is_directory).unwrap_or(false),
        CondUnOp::IsSymlink => stat.map(|s| s.is_symlink).unwrap_or(false),
        CondUnOp::NonEmptyFile => stat.map(|s| s.size > 0).unwrap_or(false),
        CondUnOp::Readable | CondUnOp::Writable => stat.is_ok(),
        CondUnOp::Executable => stat.map(|s| s.mode & 0o111 != 0).unwrap_or(false),
        CondUnOp::ZeroLength | CondUnOp::NonZeroLength | CondUnOp::VarSet => unreachable!(),
    })
}

fn eval_binary(
    engine: &Engine,
    state: &mut ShellState,
    op: CondBinOp,
    lhs: &Word,
    rhs: &Word,
    ctx: &mut ExpCtx,
) -> Result<bool, ExpandError> {
    match op {
        CondBinOp::StrEq | CondBinOp::StrNe => {
            let left = expand_word_single(engine, state, lhs, ctx)?;
            let pat = expand_word_as_pattern(engine, state, rhs, ctx)?;
            let matched = pattern::matches_glob(&pat, &left);
            Ok(if op == CondBinOp::StrEq { matched } else { !matched })
        }
        CondBinOp::Match => {
            let left = expand_word_single(engine, state, lhs, ctx)?;
            let regex_text = expand_word_single(engine, state, rhs, ctx)?;
            let re = Regex::new(&regex_text).map_err(|_| ExpandError {
                out: CommandOutput::failure(
                    format!("bash: invalid regular expression `{}'\n", regex_text),
                    2,
                ),
            })?;
            match re.captures(&left) {
                Some(caps) => {
                    for i in 0..caps.len() {
                        let text = caps.get(i).map(|m| m.as_str()).unwrap_or("");
                        let key = if i == 0 {
                            "BASH_REMATCH".to_string()
                        } else {
                            format!("BASH_REMATCH[{}]", i)
                        };
                        state.set_var(&key, text);
                    }
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        CondBinOp::StrLt | CondBinOp::StrGt => {
            let left = expand_word_single(engine, state, lhs, ctx)?;
            let right = expand_word_single(engine, state, rhs, ctx)?;
            Ok(if op == CondBinOp::StrLt { left < right } else { left > right })
        }
        CondBinOp::IntEq
        | CondBinOp::IntNe
        | CondBinOp::IntLt
        | CondBinOp::IntLe
        | CondBinOp::IntGt
        | CondBinOp::IntGe => {
            let left = int_operand(engine, state, lhs, ctx)?;
            let right = int_operand(engine, state, rhs, ctx)?;
            Ok(match op {
                CondBinOp::IntEq => left == right,
                CondBinOp::IntNe => left != right,
                CondBinOp::IntLt => left < right,
                CondBinOp::IntLe => left <= right,
                CondBinOp::IntGt => left > right,
                CondBinOp::IntGe => left >= right,
                _ => unreachable!(),
            })
        }
        CondBinOp::NewerThan | CondBinOp::OlderThan | CondBinOp::SameFile => {
            let fs = engine.fs();
            let left = expand_word_single(engine, state, lhs, ctx)?;
            let right = expand_word_single(engine, state, rhs, ctx)?;
            let lpath = fs.resolve(&state.cwd, &left);
            let rpath = fs.resolve(&state.cwd, &right);
            let lexists = fs.exists(&lpath);
            let rexists = fs.exists(&rpath);
            Ok(match op {
                // The virtual filesystem carries no mtimes; newer/older
                // degrade to existence comparison.
                CondBinOp::NewerThan => lexists && !rexists,
                CondBinOp::OlderThan => !lexists && rexists,
                CondBinOp::SameFile => lexists && lpath == rpath,
                _ => unreachable!(),
            })
        }
    }
}

/// `-eq` family operands are arithmetic expressions.
fn int_operand(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<i64, ExpandError> {
    let text = expand_word_single(engine, state, word, ctx)?;
    let expr = crate::parser::arithmetic_parser::parse_arithmetic(&text).map_err(|_| {
        ExpandError {
            out: CommandOutput::failure(
                format!("bash: integer expression expected: {}\n", text),
                2,
            ),
        }
    })?;
    crate::interpreter::arithmetic::eval_arith(state, &expr).map_err(|e| ExpandError {
        out: CommandOutput::failure(format!("bash: {}\n", e.message), 2),
    })
}
