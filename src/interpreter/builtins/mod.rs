//! Shell builtins.
//!
//! These are the commands that must run inside the interpreter because
//! they mutate shell state or raise control-flow signals. The external
//! utility catalogue lives in `crate::commands` behind its own trait.

mod cd_cmd;
mod read_cmd;
mod set_cmd;
mod source_cmd;
mod test_cmd;

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::{Flow, RunResult};
use crate::interpreter::types::{CommandOutput, ShellState};

const SHELL_BUILTINS: &[&str] = &[
    ":", ".", "[", "break", "cd", "continue", "eval", "exit", "export", "local", "read",
    "return", "set", "shift", "source", "test", "trap", "type", "unset",
];

pub fn is_shell_builtin(name: &str) -> bool {
    SHELL_BUILTINS.contains(&name)
}

pub fn run(engine: &Engine, state: &mut ShellState, argv: &[String]) -> RunResult {
    let args = &argv[1..];
    match argv[0].as_str() {
        ":" => Ok(CommandOutput::ok()),
        "cd" => cd_cmd::run(engine, state, args),
        "export" => set_cmd::export(state, args),
        "unset" => set_cmd::unset(state, args),
        "set" => set_cmd::set(state, args),
        "shift" => set_cmd::shift(state, args),
        "local" => set_cmd::local(state, args),
        "source" | "." => source_cmd::source(engine, state, args),
        "eval" => source_cmd::eval(engine, state, args),
        "read" => read_cmd::run(state, args),
        "test" => test_cmd::run(engine, state, args, false),
        "[" => test_cmd::run(engine, state, args, true),
        "exit" => exit_cmd(state, args),
        "break" => flow_cmd(state, args, true),
        "continue" => flow_cmd(state, args, false),
        "return" => return_cmd(state, args),
        "trap" => trap_cmd(state, args),
        "type" => type_cmd(engine, state, args),
        other => Ok(CommandOutput::failure(
            format!("bash: {}: command not found\n", other),
            127,
        )),
    }
}

fn exit_cmd(state: &mut ShellState, args: &[String]) -> RunResult {
    let status = match args.first() {
        None => state.last_exit_code,
        Some(text) => match text.parse::<i64>() {
            Ok(n) => (n.rem_euclid(256)) as i32,
            Err(_) => {
                return Err(Flow::Exit {
                    out: CommandOutput::failure(
                        format!("bash: exit: {}: numeric argument required\n", text),
                        2,
                    ),
                });
            }
        },
    };
    Err(Flow::Exit {
        out: CommandOutput { stdout: String::new(), stderr: String::new(), status },
    })
}

fn flow_cmd(state: &ShellState, args: &[String], is_break: bool) -> RunResult {
    let name = if is_break { "break" } else { "continue" };
    let levels = match args.first() {
        None => 1,
        Some(text) => match text.parse::<i64>() {
            Ok(n) if n >= 1 => n as u32,
            Ok(n) => {
                return Ok(CommandOutput::failure(
                    format!("bash: {}: {}: loop count out of range\n", name, n),
                    1,
                ));
            }
            Err(_) => {
                return Ok(CommandOutput::failure(
                    format!("bash: {}: {}: numeric argument required\n", name, text),
                    128,
                ));
            }
        },
    };

    if state.loop_depth == 0 {
        return Ok(CommandOutput::failure(
            format!("bash: {}: only meaningful in a `for', `while', or `until' loop\n", name),
            1,
        ));
    }

    let out = CommandOutput::ok();
    if is_break {
        Err(Flow::Break { levels, out })
    } else {
        Err(Flow::Continue { levels, out })
    }
}

fn return_cmd(state: &mut ShellState, args: &[String]) -> RunResult {
    let status = match args.first() {
        None => state.last_exit_code,
        Some(text) => match text.parse::<i64>() {
            Ok(n) => (n.rem_euclid(256)) as i32,
            Err(_) => {
                return Ok(CommandOutput::failure(
                    format!("bash: return: {}: numeric argument required\n", text),
                    2,
                ));
            }
        },
    };
    Err(Flow::Return {
        out: CommandOutput { stdout: String::new(), stderr: String::new(), status },
    })
}

fn trap_cmd(state: &mut ShellState, args: &[String]) -> RunResult {
    if args.is_empty() {
        let mut listing = String::new();
        let mut names: Vec<&String> = state.traps.keys().collect();
        names.sort();
        for name in names {
            listing.push_str(&format!("trap -- '{}' {}\n", state.traps[name], name));
        }
        return Ok(CommandOutput::with_stdout(listing));
    }

    if args[0] == "-" {
        for signal in &args[1..] {
            state.traps.remove(&normalize_signal(signal));
        }
        return Ok(CommandOutput::ok());
    }

    let action = &args[0];
    if args.len() < 2 {
        return Ok(CommandOutput::failure(
            "bash: trap: usage: trap action signal\n".to_string(),
            2,
        ));
    }
    for signal in &args[1..] {
        state.traps.insert(normalize_signal(signal), action.clone());
    }
    Ok(CommandOutput::ok())
}

fn normalize_signal(name: &str) -> String {
    match name {
        "0" => "EXIT".to_string(),
        other => other.trim_start_matches("SIG").to_uppercase(),
    }
}

fn type_cmd(engine: &Engine, state: &ShellState, args: &[String]) -> RunResult {
    let mut out = CommandOutput::ok();
    for name in args {
        if state.functions.contains_key(name) {
            out.stdout.push_str(&format!("{} is a function\n", name));
        } else if is_shell_builtin(name) || engine_has_command(engine, name) {
            out.stdout.push_str(&format!("{} is a shell builtin\n", name));
        } else {
            out.stderr.push_str(&format!("bash: type: {}: not found\n", name));
            out.status = 1;
        }
    }
    Ok(out)
}

fn engine_has_command(engine: &Engine, name: &str) -> bool {
    engine.has_registered_command(name)
}
