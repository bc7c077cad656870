//! The word expansion pipeline.
//!
//! Phases, in order: brace expansion, tilde expansion, parameter
//! expansion, command substitution, arithmetic expansion, word
//! splitting, pathname expansion, quote removal. A word expands to zero
//! or more argv fields; `${v:=d}` assignments are applied to the state
//! as they are encountered, before the enclosing command runs.

pub mod brace;
pub mod glob;
pub mod param;
pub mod split;

use crate::ast::types::{Word, WordPart};
use crate::interpreter::arithmetic::eval_arith;
use crate::interpreter::engine::Engine;
use crate::interpreter::pattern;
use crate::interpreter::types::{CommandOutput, ShellState};
use self::split::FieldAccumulator;

/// Expansion failure that fails the enclosing command: nounset, `${v:?}`,
/// arithmetic errors, bad subscripts.
#[derive(Debug, Clone)]
pub struct ExpandError {
    pub out: CommandOutput,
}

/// Side-channel accumulated during expansion.
#[derive(Debug, Default)]
pub struct ExpCtx {
    /// stderr produced by command substitutions.
    pub stderr: String,
    /// Exit status of the last command substitution, if any ran.
    pub last_subst_status: Option<i32>,
}

/// A fragment of expanded text on its way to field assembly.
pub enum Piece {
    Text { text: String, quoted: bool },
    /// Hard separator between `"$@"` elements.
    Break,
}

/// Result of expanding words to argv.
#[derive(Debug, Default)]
pub struct Expanded {
    pub fields: Vec<String>,
    pub stderr: String,
    pub last_subst_status: Option<i32>,
}

/// Full pipeline for a list of words (command name + args).
pub fn expand_words(
    engine: &Engine,
    state: &mut ShellState,
    words: &[Word],
) -> Result<Expanded, ExpandError> {
    let mut ctx = ExpCtx::default();
    let mut fields = Vec::new();
    for word in words {
        fields.extend(expand_word_into_fields(engine, state, word, &mut ctx)?);
    }
    Ok(Expanded {
        fields,
        stderr: ctx.stderr,
        last_subst_status: ctx.last_subst_status,
    })
}

fn expand_word_into_fields(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<Vec<String>, ExpandError> {
    let ifs = state.env.get("IFS").cloned().unwrap_or_else(|| " \t\n".to_string());
    let mut out = Vec::new();

    for branch in brace::expand_braces(word) {
        let pieces = pieces_of_parts(engine, state, &branch.parts, false, ctx)?;

        let mut acc = FieldAccumulator::new();
        for piece in pieces {
            match piece {
                Piece::Text { text, quoted: true } => acc.push_quoted(&text),
                Piece::Text { text, quoted: false } => acc.push_split(&text, &ifs),
                Piece::Break => acc.force_break(),
            }
        }

        for field in acc.finish() {
            // Pathname expansion: only unquoted glob characters count.
            if !state.opts.noglob && pattern::has_glob_chars(&field.pattern) {
                match glob::expand(engine.fs(), &state.cwd, &field.pattern) {
                    Some(matches) => {
                        out.extend(matches);
                        continue;
                    }
                    None => {
                        // No match: the pattern stays, quote-removed.
                        out.push(field.text);
                        continue;
                    }
                }
            }
            out.push(field.text);
        }
    }
    Ok(out)
}

/// Expansion to a single string: no splitting, no globbing. Used for
/// redirection targets, heredoc bodies, `case` subjects, conditional
/// operands, and assignment values.
pub fn expand_word_single(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    let pieces = pieces_of_parts(engine, state, &word.parts, false, ctx)?;
    Ok(join_pieces(pieces))
}

/// Like [`expand_word_single`] but quoted characters come back escaped
/// so they match literally when the result is used as a glob pattern.
pub fn expand_word_as_pattern(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    pattern_text_parts(engine, state, &word.parts, ctx)
}

/// Assignment values: no splitting, and tildes after `:` or `=` expand.
pub fn expand_assignment_value(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    let text = expand_word_single(engine, state, word, ctx)?;
    // PATH-style values: expand `~` right after a separator.
    if let Some(home) = state.get_var("HOME") {
        let mut out = String::new();
        let mut prev: Option<char> = None;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '~'
                && matches!(prev, Some(':') | Some('='))
                && matches!(chars.peek(), None | Some(':') | Some('/'))
            {
                out.push_str(&home);
            } else {
                out.push(c);
            }
            prev = Some(c);
        }
        return Ok(out);
    }
    Ok(text)
}

pub(crate) fn join_pieces(pieces: Vec<Piece>) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text { text, .. } => out.push_str(&text),
            Piece::Break => out.push(' '),
        }
    }
    out
}

/// Word expanded for use inside an operator pattern (`${v#pat}` etc.):
/// quoted text is escaped, unquoted glob characters stay live.
pub(crate) fn pattern_text(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    pattern_text_parts(engine, state, &word.parts, ctx)
}

fn pattern_text_parts(
    engine: &Engine,
    state: &mut ShellState,
    parts: &[WordPart],
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    let pieces = pieces_of_parts(engine, state, parts, false, ctx)?;
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text { text, quoted: true } => out.push_str(&pattern::escape_literal(&text)),
            Piece::Text { text, quoted: false } => out.push_str(&text),
            Piece::Break => out.push(' '),
        }
    }
    Ok(out)
}

/// Scalar expansion of an operator word (`${v:=word}` right-hand sides).
pub(crate) fn single_text(
    engine: &Engine,
    state: &mut ShellState,
    word: &Word,
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    let pieces = pieces_of_parts(engine, state, &word.parts, false, ctx)?;
    Ok(join_pieces(pieces))
}

/// Phases 2-5 for a part list: everything between brace expansion and
/// field assembly.
pub(crate) fn pieces_of_parts(
    engine: &Engine,
    state: &mut ShellState,
    parts: &[WordPart],
    in_dquotes: bool,
    ctx: &mut ExpCtx,
) -> Result<Vec<Piece>, ExpandError> {
    let mut pieces = Vec::new();

    for part in parts {
        match part {
            WordPart::Literal(text) | WordPart::Glob(text) => {
                pieces.push(Piece::Text { text: text.clone(), quoted: in_dquotes });
            }
            WordPart::SingleQuoted(text) => {
                pieces.push(Piece::Text { text: text.clone(), quoted: true });
            }
            WordPart::Escaped(text) => {
                pieces.push(Piece::Text { text: text.clone(), quoted: true });
            }
            WordPart::DoubleQuoted(inner) => {
                let inner_pieces = pieces_of_parts(engine, state, inner, true, ctx)?;
                // "" produces (or joins) a field, but a "$@" that
                // expanded to zero elements produces none at all.
                let vanishing_at = inner.iter().any(|p| {
                    matches!(p, WordPart::ParamExpansion(pe)
                        if pe.name == "@" || pe.name == "*"
                            || pe.name.ends_with("[@]") || pe.name.ends_with("[*]"))
                });
                if inner_pieces.is_empty() && !vanishing_at {
                    pieces.push(Piece::Text { text: String::new(), quoted: true });
                } else {
                    pieces.extend(inner_pieces);
                }
            }
            WordPart::TildeExpansion { user } => {
                let text = match user {
                    None => state.get_var("HOME").unwrap_or_else(|| "~".to_string()),
                    // ~user is not resolved in this shell; it stays as
                    // written.
                    Some(u) => format!("~{}", u),
                };
                pieces.push(Piece::Text { text, quoted: true });
            }
            WordPart::ParamExpansion(pe) => {
                pieces.extend(param::expand_param(engine, state, pe, in_dquotes, ctx)?);
            }
            WordPart::CommandSubstitution { body, .. } => {
                let (stdout, stderr, status) = engine.command_substitution(state, body);
                ctx.stderr.push_str(&stderr);
                ctx.last_subst_status = Some(status);
                state.set_status(status);
                let trimmed = stdout.trim_end_matches('\n').to_string();
                pieces.push(Piece::Text { text: trimmed, quoted: in_dquotes });
            }
            WordPart::ArithExpansion(expr) => {
                let value = eval_arith(state, expr).map_err(|e| ExpandError {
                    out: CommandOutput::failure(format!("bash: {}\n", e.message), 1),
                })?;
                pieces.push(Piece::Text { text: value.to_string(), quoted: in_dquotes });
            }
            WordPart::ProcessSubstitution { body, direction } => {
                let path = engine.process_substitution(state, body, *direction, ctx)?;
                pieces.push(Piece::Text { text: path, quoted: true });
            }
            WordPart::BraceExpansion(items) => {
                // Reached only through nested positions the brace phase
                // does not multiply (e.g. operator words); render the
                // first alternative literally.
                let word = Word::new(vec![WordPart::BraceExpansion(items.clone())]);
                for branch in brace::expand_braces(&word) {
                    let inner = pieces_of_parts(engine, state, &branch.parts, in_dquotes, ctx)?;
                    pieces.extend(inner);
                    break;
                }
            }
        }
    }

    Ok(pieces)
}
