//! Parameter expansion: `$name` and every `${...}` operator.

use crate::ast::types::{ParamExpansion, ParamOp, PatternAnchor, PatternSide};
use crate::interpreter::arithmetic::eval_arith;
use crate::interpreter::engine::Engine;
use crate::interpreter::expansion::{pattern_text, pieces_of_parts, single_text, ExpCtx, ExpandError, Piece};
use crate::interpreter::pattern;
use crate::interpreter::types::{CommandOutput, ShellState};

/// The resolved value of a parameter name, before any operator.
pub enum ParamValue {
    Unset,
    Scalar(String),
    /// `$@`, `$*`, `${a[@]}`, `${a[*]}`: one entry per element.
    Fields(Vec<String>),
}

impl ParamValue {
    fn is_unset(&self) -> bool {
        matches!(self, ParamValue::Unset)
    }

    fn is_empty(&self) -> bool {
        match self {
            ParamValue::Unset => true,
            ParamValue::Scalar(s) => s.is_empty(),
            ParamValue::Fields(f) => f.iter().all(|s| s.is_empty()),
        }
    }

    fn joined(&self) -> String {
        match self {
            ParamValue::Unset => String::new(),
            ParamValue::Scalar(s) => s.clone(),
            ParamValue::Fields(f) => f.join(" "),
        }
    }
}

/// Resolve a parameter name, including `name[subscript]` array forms.
pub fn param_value(state: &mut ShellState, name: &str) -> Result<ParamValue, ExpandError> {
    if name == "@" || name == "*" {
        return Ok(ParamValue::Fields(state.positional.clone()));
    }

    if let Some(open) = name.find('[') {
        let base = &name[..open];
        let subscript = &name[open + 1..name.len() - 1];
        return match subscript {
            "@" | "*" => Ok(ParamValue::Fields(array_elements(state, base))),
            _ => {
                let expr = crate::parser::arithmetic_parser::parse_arithmetic(subscript)
                    .map_err(|_| bad_subscript(name))?;
                let idx = eval_arith(state, &expr).map_err(|_| bad_subscript(name))?;
                let key = if idx == 0 { base.to_string() } else { format!("{}[{}]", base, idx) };
                Ok(match state.get_var(&key) {
                    Some(v) => ParamValue::Scalar(v),
                    None => ParamValue::Unset,
                })
            }
        };
    }

    Ok(match state.get_var(name) {
        Some(v) => ParamValue::Scalar(v),
        None => ParamValue::Unset,
    })
}

fn bad_subscript(name: &str) -> ExpandError {
    ExpandError {
        out: CommandOutput::failure(format!("bash: {}: bad array subscript\n", name), 1),
    }
}

/// Elements of array `base`, index order. The bare key is element 0.
pub fn array_elements(state: &ShellState, base: &str) -> Vec<String> {
    let mut indexed: Vec<(i64, String)> = Vec::new();
    if let Some(v) = state.env.get(base) {
        indexed.push((0, v.clone()));
    }
    let prefix = format!("{}[", base);
    for (key, value) in &state.env {
        if let Some(rest) = key.strip_prefix(&prefix) {
            if let Some(idx_text) = rest.strip_suffix(']') {
                if let Ok(idx) = idx_text.parse::<i64>() {
                    if idx != 0 {
                        indexed.push((idx, value.clone()));
                    }
                }
            }
        }
    }
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, v)| v).collect()
}

fn unbound(name: &str) -> ExpandError {
    ExpandError {
        out: CommandOutput::failure(format!("bash: {}: unbound variable\n", name), 1),
    }
}

/// Expand one `$name` / `${name op}` occurrence into pieces.
pub fn expand_param(
    engine: &Engine,
    state: &mut ShellState,
    pe: &ParamExpansion,
    in_dquotes: bool,
    ctx: &mut ExpCtx,
) -> Result<Vec<Piece>, ExpandError> {
    let value = param_value(state, &pe.name)?;

    // Operators of the `:-` family handle unset themselves; everything
    // else trips nounset.
    let tolerant = matches!(
        pe.op,
        Some(ParamOp::DefaultValue { .. })
            | Some(ParamOp::AssignDefault { .. })
            | Some(ParamOp::ErrorIfUnset { .. })
            | Some(ParamOp::UseAlternative { .. })
    );
    if value.is_unset() && state.opts.nounset && !tolerant && !state.is_var_set(&pe.name) {
        return Err(unbound(&pe.name));
    }

    let op = match &pe.op {
        None => return Ok(value_pieces(state, &pe.name, value, in_dquotes)),
        Some(op) => op,
    };

    match op {
        ParamOp::DefaultValue { word, check_empty } => {
            let takes_default = if *check_empty { value.is_empty() } else { value.is_unset() };
            if takes_default {
                pieces_of_parts(engine, state, &word.parts, in_dquotes, ctx)
            } else {
                Ok(value_pieces(state, &pe.name, value, in_dquotes))
            }
        }
        ParamOp::AssignDefault { word, check_empty } => {
            let assigns = if *check_empty { value.is_empty() } else { value.is_unset() };
            if assigns {
                if pe.name == "@" || pe.name == "*" || pe.name.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ExpandError {
                        out: CommandOutput::failure(
                            format!("bash: ${{{}}}: cannot assign in this way\n", pe.name),
                            1,
                        ),
                    });
                }
                let text = single_text(engine, state, word, ctx)?;
                state.set_var(&pe.name, text.clone());
                Ok(vec![Piece::Text { text, quoted: in_dquotes }])
            } else {
                Ok(value_pieces(state, &pe.name, value, in_dquotes))
            }
        }
        ParamOp::ErrorIfUnset { word, check_empty } => {
            let errors = if *check_empty { value.is_empty() } else { value.is_unset() };
            if errors {
                let message = match word {
                    Some(w) => single_text(engine, state, w, ctx)?,
                    None => "parameter null or not set".to_string(),
                };
                return Err(ExpandError {
                    out: CommandOutput::failure(format!("bash: {}: {}\n", pe.name, message), 1),
                });
            }
            Ok(value_pieces(state, &pe.name, value, in_dquotes))
        }
        ParamOp::UseAlternative { word, check_empty } => {
            let uses = if *check_empty { !value.is_empty() } else { !value.is_unset() };
            if uses {
                pieces_of_parts(engine, state, &word.parts, in_dquotes, ctx)
            } else {
                Ok(vec![])
            }
        }
        ParamOp::Length => {
            let n = match &value {
                ParamValue::Fields(f) => f.len(),
                ParamValue::Scalar(s) => s.chars().count(),
                ParamValue::Unset => 0,
            };
            Ok(vec![Piece::Text { text: n.to_string(), quoted: in_dquotes }])
        }
        ParamOp::Substring { offset, length } => {
            let text = value.joined();
            let chars: Vec<char> = text.chars().collect();
            let len = chars.len() as i64;

            let off = eval_arith(state, offset).map_err(arith_failure)?;
            let start = if off < 0 { len + off } else { off };
            if start < 0 || start > len {
                return Ok(vec![Piece::Text { text: String::new(), quoted: in_dquotes }]);
            }

            let end = match length {
                None => len,
                Some(l) => {
                    let n = eval_arith(state, l).map_err(arith_failure)?;
                    if n < 0 {
                        // Negative length counts back from the end.
                        len + n
                    } else {
                        (start + n).min(len)
                    }
                }
            };
            let slice: String = if end <= start {
                String::new()
            } else {
                chars[start as usize..end as usize].iter().collect()
            };
            Ok(vec![Piece::Text { text: slice, quoted: in_dquotes }])
        }
        ParamOp::PatternRemoval { pattern: pat, side, greedy } => {
            let pat_text = pattern_text(engine, state, pat, ctx)?;
            let apply = |s: &str| remove_pattern(s, &pat_text, *side, *greedy);
            Ok(map_value(state, &pe.name, value, in_dquotes, apply))
        }
        ParamOp::PatternReplacement { pattern: pat, replacement, all, anchor } => {
            let pat_text = pattern_text(engine, state, pat, ctx)?;
            let repl = match replacement {
                Some(w) => single_text(engine, state, w, ctx)?,
                None => String::new(),
            };
            let apply = |s: &str| replace_pattern(s, &pat_text, &repl, *all, *anchor);
            Ok(map_value(state, &pe.name, value, in_dquotes, apply))
        }
        ParamOp::CaseModification { upper, all, pattern: pat } => {
            let pat_text = match pat {
                Some(w) => Some(pattern_text(engine, state, w, ctx)?),
                None => None,
            };
            let apply = |s: &str| modify_case(s, *upper, *all, pat_text.as_deref());
            Ok(map_value(state, &pe.name, value, in_dquotes, apply))
        }
        ParamOp::Indirection => {
            let target = value.joined();
            if target.is_empty() {
                return Ok(vec![]);
            }
            let resolved = param_value(state, &target)?;
            if resolved.is_unset() && state.opts.nounset && !state.is_var_set(&target) {
                return Err(unbound(&target));
            }
            Ok(value_pieces(state, &target, resolved, in_dquotes))
        }
    }
}

fn arith_failure(e: crate::interpreter::arithmetic::ArithError) -> ExpandError {
    ExpandError {
        out: CommandOutput::failure(format!("bash: {}\n", e.message), 1),
    }
}

/// Pieces for a plain parameter value, with the `$@`/`$*` quoting rules.
fn value_pieces(
    state: &ShellState,
    name: &str,
    value: ParamValue,
    in_dquotes: bool,
) -> Vec<Piece> {
    match value {
        ParamValue::Unset => vec![],
        ParamValue::Scalar(s) => vec![Piece::Text { text: s, quoted: in_dquotes }],
        ParamValue::Fields(items) => {
            let star = name == "*" || name.ends_with("[*]");
            if in_dquotes && star {
                // "$*": join on the first IFS character
                let sep = state
                    .env
                    .get("IFS")
                    .map(|s| s.chars().next().map(|c| c.to_string()).unwrap_or_default())
                    .unwrap_or_else(|| " ".to_string());
                return vec![Piece::Text { text: items.join(&sep), quoted: true }];
            }
            let mut pieces = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                if i > 0 {
                    pieces.push(Piece::Break);
                }
                pieces.push(Piece::Text { text: item, quoted: in_dquotes });
            }
            pieces
        }
    }
}

/// Apply a string transform to the value, element-wise for `@`/`*`.
fn map_value<F: Fn(&str) -> String>(
    state: &ShellState,
    name: &str,
    value: ParamValue,
    in_dquotes: bool,
    f: F,
) -> Vec<Piece> {
    match value {
        ParamValue::Unset => vec![Piece::Text { text: String::new(), quoted: in_dquotes }],
        ParamValue::Scalar(s) => vec![Piece::Text { text: f(&s), quoted: in_dquotes }],
        ParamValue::Fields(items) => {
            let mapped = ParamValue::Fields(items.iter().map(|s| f(s)).collect());
            value_pieces(state, name, mapped, in_dquotes)
        }
    }
}

/// `${v#p}` family: anchored removal of the shortest or longest match.
fn remove_pattern(value: &str, pattern: &str, side: PatternSide, greedy: bool) -> String {
    let re = match pattern::compile_anchored(pattern) {
        Some(re) => re,
        None => return value.to_string(),
    };
    let chars: Vec<char> = value.chars().collect();
    let n = chars.len();

    match side {
        PatternSide::Prefix => {
            let lengths: Box<dyn Iterator<Item = usize>> = if greedy {
                Box::new((0..=n).rev())
            } else {
                Box::new(0..=n)
            };
            for take in lengths {
                let prefix: String = chars[..take].iter().collect();
                if re.is_match(&prefix) {
                    return chars[take..].iter().collect();
                }
            }
            value.to_string()
        }
        PatternSide::Suffix => {
            let lengths: Box<dyn Iterator<Item = usize>> = if greedy {
                Box::new((0..=n).rev())
            } else {
                Box::new(0..=n)
            };
            for take in lengths {
                let suffix: String = chars[n - take..].iter().collect();
                if re.is_match(&suffix) {
                    return chars[..n - take].iter().collect();
                }
            }
            value.to_string()
        }
    }
}

/// `${v/p/r}` family.
fn replace_pattern(value: &str, pattern: &str, repl: &str, all: bool, anchor: PatternAnchor) -> String {
    if pattern.is_empty() {
        return value.to_string();
    }
    let body = pattern::glob_to_regex(pattern);
    let regex_text = match anchor {
        PatternAnchor::Start => format!("^(?s:{})", body),
        PatternAnchor::End => format!("(?s:{})$", body),
        PatternAnchor::None => format!("(?s:{})", body),
    };
    let re = match regex_lite::Regex::new(&regex_text) {
        Ok(re) => re,
        Err(_) => return value.to_string(),
    };

    let mut out = String::new();
    let mut last = 0;
    for m in re.find_iter(value) {
        out.push_str(&value[last..m.start()]);
        out.push_str(repl);
        last = m.end();
        if !all {
            break;
        }
    }
    out.push_str(&value[last..]);
    out
}

/// `${v^}` / `${v^^}` / `${v,}` / `${v,,}`.
fn modify_case(value: &str, upper: bool, all: bool, pattern: Option<&str>) -> String {
    let matches = |c: char| match pattern {
        None | Some("?") | Some("") => true,
        Some(p) => pattern::matches_glob(p, &c.to_string()),
    };
    let convert = |c: char| -> String {
        if upper {
            c.to_uppercase().to_string()
        } else {
            c.to_lowercase().to_string()
        }
    };

    let mut out = String::new();
    for (i, c) in value.chars().enumerate() {
        if (all || i == 0) && matches(c) {
            out.push_str(&convert(c));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_shortest_and_longest() {
        assert_eq!(remove_pattern("/a/b.c", "*/", PatternSide::Prefix, false), "a/b.c");
        assert_eq!(remove_pattern("/a/b.c", "*/", PatternSide::Prefix, true), "b.c");
        assert_eq!(remove_pattern("/a/b.c", ".*", PatternSide::Suffix, false), "/a/b");
        assert_eq!(remove_pattern("/a/b.c", ".*", PatternSide::Suffix, true), "/a/b");
    }

    #[test]
    fn removal_without_match_is_identity() {
        assert_eq!(remove_pattern("hello", "x*", PatternSide::Prefix, true), "hello");
    }

    #[test]
    fn replacement_forms() {
        assert_eq!(replace_pattern("banana", "a", "o", false, PatternAnchor::None), "bonana");
        assert_eq!(replace_pattern("banana", "a", "o", true, PatternAnchor::None), "bonono");
        assert_eq!(replace_pattern("banana", "ba", "x", false, PatternAnchor::Start), "xnana");
        assert_eq!(replace_pattern("banana", "na", "x", false, PatternAnchor::End), "banax");
        assert_eq!(replace_pattern("banana", "na", "x", false, PatternAnchor::Start), "banana");
    }

    #[test]
    fn replacement_with_globs() {
        assert_eq!(replace_pattern("a1b2c", "[0-9]", "#", true, PatternAnchor::None), "a#b#c");
    }

    #[test]
    fn case_modification() {
        assert_eq!(modify_case("hello", true, false, None), "Hello");
        assert_eq!(modify_case("hello", true, true, None), "HELLO");
        assert_eq!(modify_case("HELLO", false, false, None), "hELLO");
        assert_eq!(modify_case("HELLO", false, true, None), "hello");
        assert_eq!(modify_case("hello", true, true, Some("l")), "heLLo");
    }

    #[test]
    fn array_element_collection() {
        let mut state = ShellState::new();
        state.set_var("a", "zero");
        state.set_var("a[2]", "two");
        state.set_var("a[1]", "one");
        assert_eq!(array_elements(&state, "a"), vec!["zero", "one", "two"]);
    }
}
