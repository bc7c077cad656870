//! `source` / `.` and `eval`: re-entering the interpreter on new text.

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::{Flow, RunResult};
use crate::interpreter::types::{CommandOutput, ShellState};

pub fn source(engine: &Engine, state: &mut ShellState, args: &[String]) -> RunResult {
    let path_arg = match args.first() {
        Some(p) => p,
        None => {
            return Ok(CommandOutput::failure(
                "bash: source: filename argument required\n".to_string(),
                2,
            ));
        }
    };

    let fs = engine.fs();
    let path = fs.resolve(&state.cwd, path_arg);
    let text = match fs.read_file(&path) {
        Ok(text) => text,
        Err(_) => {
            return Ok(CommandOutput::failure(
                format!("bash: source: {}: No such file or directory\n", path_arg),
                1,
            ));
        }
    };

    // Extra arguments become the sourced script's positional parameters.
    let saved_positional = if args.len() > 1 {
        Some(std::mem::replace(&mut state.positional, args[1..].to_vec()))
    } else {
        None
    };

    let result = engine.run_text(state, &text);

    if let Some(saved) = saved_positional {
        state.positional = saved;
    }

    // `return` inside a sourced file ends the source, not the caller.
    match result {
        Err(Flow::Return { out }) => Ok(out),
        other => other,
    }
}

pub fn eval(engine: &Engine, state: &mut ShellState, args: &[String]) -> RunResult {
    if args.is_empty() {
        return Ok(CommandOutput::ok());
    }
    let text = args.join(" ");
    engine.run_text(state, &text)
}
