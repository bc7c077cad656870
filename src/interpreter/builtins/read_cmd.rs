//! `read`: one line from the pending stdin buffer into variables.

use crate::interpreter::errors::RunResult;
use crate::interpreter::types::{CommandOutput, ShellState};

pub fn run(state: &mut ShellState, args: &[String]) -> RunResult {
    let mut raw = false;
    let mut names: Vec<&String> = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-r" => raw = true,
            _ => names.push(arg),
        }
    }

    // No input left: variables are cleared and status is 1.
    if state.stdin_buffer.is_empty() {
        for name in &names {
            state.set_var(name, "");
        }
        return Ok(CommandOutput { stdout: String::new(), stderr: String::new(), status: 1 });
    }

    let line = match state.stdin_buffer.find('\n') {
        Some(i) => {
            let line: String = state.stdin_buffer[..i].to_string();
            state.stdin_buffer.drain(..=i);
            line
        }
        None => std::mem::take(&mut state.stdin_buffer),
    };

    let line = if raw {
        line
    } else {
        // Without -r a backslash escapes the next character.
        let mut out = String::new();
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(n) = chars.next() {
                    out.push(n);
                }
            } else {
                out.push(c);
            }
        }
        out
    };

    if names.is_empty() {
        state.set_var("REPLY", line);
        return Ok(CommandOutput::ok());
    }

    let ifs = state.env.get("IFS").cloned().unwrap_or_else(|| " \t\n".to_string());
    let trimmed = line.trim_matches(|c: char| ifs.contains(c) && c.is_whitespace());
    let is_sep = |c: char| ifs.contains(c);

    let mut fields: Vec<String> = Vec::new();
    let mut rest = trimmed;
    while fields.len() + 1 < names.len() {
        match rest.find(is_sep) {
            Some(i) => {
                fields.push(rest[..i].to_string());
                rest = rest[i..].trim_start_matches(is_sep);
            }
            None => break,
        }
    }
    // The last variable takes everything left over.
    fields.push(rest.to_string());

    for (i, name) in names.iter().enumerate() {
        state.set_var(name, fields.get(i).cloned().unwrap_or_default());
    }
    Ok(CommandOutput::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn read_splits_into_variables() {
        let mut state = ShellState::new();
        state.stdin_buffer = "one two three\n".to_string();
        run(&mut state, &[s("a"), s("b")]).unwrap();
        assert_eq!(state.get_var("a"), Some("one".to_string()));
        assert_eq!(state.get_var("b"), Some("two three".to_string()));
    }

    #[test]
    fn read_consumes_one_line() {
        let mut state = ShellState::new();
        state.stdin_buffer = "first\nsecond\n".to_string();
        run(&mut state, &[s("x")]).unwrap();
        assert_eq!(state.get_var("x"), Some("first".to_string()));
        run(&mut state, &[s("x")]).unwrap();
        assert_eq!(state.get_var("x"), Some("second".to_string()));
    }

    #[test]
    fn read_empty_stdin_fails() {
        let mut state = ShellState::new();
        let r = run(&mut state, &[s("x")]).unwrap();
        assert_eq!(r.status, 1);
        assert_eq!(state.get_var("x"), Some(String::new()));
    }

    #[test]
    fn read_without_names_uses_reply() {
        let mut state = ShellState::new();
        state.stdin_buffer = "hello world\n".to_string();
        run(&mut state, &[]).unwrap();
        assert_eq!(state.get_var("REPLY"), Some("hello world".to_string()));
    }

    #[test]
    fn read_r_keeps_backslashes() {
        let mut state = ShellState::new();
        state.stdin_buffer = "a\\nb\n".to_string();
        run(&mut state, &[s("-r"), s("x")]).unwrap();
        assert_eq!(state.get_var("x"), Some("a\\nb".to_string()));
    }
}
