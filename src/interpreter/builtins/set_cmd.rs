//! Variable and option builtins: `set`, `export`, `unset`, `shift`,
//! `local`.

use crate::interpreter::errors::RunResult;
use crate::interpreter::types::{CommandOutput, ShellState};

pub fn set(state: &mut ShellState, args: &[String]) -> RunResult {
    if args.is_empty() {
        let mut names: Vec<&String> = state.env.keys().collect();
        names.sort();
        let mut listing = String::new();
        for name in names {
            listing.push_str(&format!("{}={}\n", name, state.env[name]));
        }
        return Ok(CommandOutput::with_stdout(listing));
    }

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--" => {
                state.positional = args[i + 1..].to_vec();
                return Ok(CommandOutput::ok());
            }
            "-o" | "+o" => {
                let enable = arg == "-o";
                i += 1;
                let option = match args.get(i) {
                    Some(o) => o.as_str(),
                    None => return Ok(list_options(state)),
                };
                if let Some(out) = set_named_option(state, option, enable) {
                    return Ok(out);
                }
            }
            _ if arg.starts_with('-') || arg.starts_with('+') => {
                let enable = arg.starts_with('-');
                for flag in arg[1..].chars() {
                    match flag {
                        'e' => state.opts.errexit = enable,
                        'u' => state.opts.nounset = enable,
                        'x' => state.opts.xtrace = enable,
                        'f' => state.opts.noglob = enable,
                        'o' => {
                            // handled above when standalone; -eo style
                            i += 1;
                            let option = match args.get(i) {
                                Some(o) => o.as_str(),
                                None => return Ok(list_options(state)),
                            };
                            if let Some(out) = set_named_option(state, option, enable) {
                                return Ok(out);
                            }
                        }
                        other => {
                            return Ok(CommandOutput::failure(
                                format!("bash: set: -{}: invalid option\n", other),
                                2,
                            ));
                        }
                    }
                }
            }
            _ => {
                state.positional = args[i..].to_vec();
                return Ok(CommandOutput::ok());
            }
        }
        i += 1;
    }
    Ok(CommandOutput::ok())
}

fn set_named_option(state: &mut ShellState, option: &str, enable: bool) -> Option<CommandOutput> {
    match option {
        "errexit" => state.opts.errexit = enable,
        "nounset" => state.opts.nounset = enable,
        "pipefail" => state.opts.pipefail = enable,
        "xtrace" => state.opts.xtrace = enable,
        "noglob" => state.opts.noglob = enable,
        other => {
            return Some(CommandOutput::failure(
                format!("bash: set: {}: invalid option name\n", other),
                2,
            ));
        }
    }
    None
}

fn list_options(state: &ShellState) -> CommandOutput {
    let onoff = |b: bool| if b { "on" } else { "off" };
    CommandOutput::with_stdout(format!(
        "errexit        {}\nnoglob         {}\nnounset        {}\npipefail       {}\nxtrace         {}\n",
        onoff(state.opts.errexit),
        onoff(state.opts.noglob),
        onoff(state.opts.nounset),
        onoff(state.opts.pipefail),
        onoff(state.opts.xtrace),
    ))
}

pub fn export(state: &mut ShellState, args: &[String]) -> RunResult {
    if args.is_empty() || args[0] == "-p" {
        let mut names: Vec<&String> = state.exported.iter().collect();
        names.sort();
        let mut listing = String::new();
        for name in names {
            match state.env.get(name) {
                Some(value) => listing.push_str(&format!("declare -x {}=\"{}\"\n", name, value)),
                None => listing.push_str(&format!("declare -x {}\n", name)),
            }
        }
        return Ok(CommandOutput::with_stdout(listing));
    }

    for arg in args {
        match arg.split_once('=') {
            Some((name, value)) => {
                state.set_var(name, value);
                state.exported.insert(name.to_string());
            }
            None => {
                state.exported.insert(arg.clone());
            }
        }
    }
    Ok(CommandOutput::ok())
}

pub fn unset(state: &mut ShellState, args: &[String]) -> RunResult {
    let mut functions_only = false;
    let mut names = args;
    if let Some(first) = args.first() {
        match first.as_str() {
            "-f" => {
                functions_only = true;
                names = &args[1..];
            }
            "-v" => {
                names = &args[1..];
            }
            _ => {}
        }
    }

    for name in names {
        if functions_only {
            state.functions.remove(name);
            continue;
        }
        state.env.remove(name);
        state.exported.remove(name);
        // unset a removes the whole array
        let prefix = format!("{}[", name);
        let elements: Vec<String> =
            state.env.keys().filter(|k| k.starts_with(&prefix)).cloned().collect();
        for key in elements {
            state.env.remove(&key);
        }
    }
    Ok(CommandOutput::ok())
}

pub fn shift(state: &mut ShellState, args: &[String]) -> RunResult {
    let n = match args.first() {
        None => 1,
        Some(text) => match text.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return Ok(CommandOutput::failure(
                    format!("bash: shift: {}: numeric argument required\n", text),
                    1,
                ));
            }
        },
    };
    if n > state.positional.len() {
        return Ok(CommandOutput { stdout: String::new(), stderr: String::new(), status: 1 });
    }
    state.positional.drain(..n);
    Ok(CommandOutput::ok())
}

pub fn local(state: &mut ShellState, args: &[String]) -> RunResult {
    if state.local_scopes.is_empty() {
        return Ok(CommandOutput::failure(
            "bash: local: can only be used in a function\n".to_string(),
            1,
        ));
    }
    for arg in args {
        match arg.split_once('=') {
            Some((name, value)) => {
                state.declare_local(name);
                state.set_var(name, value);
            }
            None => {
                state.declare_local(arg);
                state.env.remove(arg.as_str());
            }
        }
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
    fn set_flags_toggle() {
        let mut state = ShellState::new();
        set(&mut state, &[s("-eu")]).unwrap();
        assert!(state.opts.errexit);
        assert!(state.opts.nounset);
        set(&mut state, &[s("+e")]).unwrap();
        assert!(!state.opts.errexit);
    }

    #[test]
    fn set_o_pipefail() {
        let mut state = ShellState::new();
        set(&mut state, &[s("-o"), s("pipefail")]).unwrap();
        assert!(state.opts.pipefail);
        set(&mut state, &[s("+o"), s("pipefail")]).unwrap();
        assert!(!state.opts.pipefail);
    }

    #[test]
    fn set_eo_combined() {
        let mut state = ShellState::new();
        set(&mut state, &[s("-eo"), s("pipefail")]).unwrap();
        assert!(state.opts.errexit);
        assert!(state.opts.pipefail);
    }

    #[test]
    fn set_replaces_positional() {
        let mut state = ShellState::new();
        set(&mut state, &[s("--"), s("a"), s("b")]).unwrap();
        assert_eq!(state.positional, vec!["a", "b"]);
    }

    #[test]
    fn export_marks_and_sets() {
        let mut state = ShellState::new();
        export(&mut state, &[s("FOO=bar")]).unwrap();
        assert_eq!(state.get_var("FOO"), Some("bar".to_string()));
        assert!(state.exported.contains("FOO"));
    }

    #[test]
    fn unset_removes_array() {
        let mut state = ShellState::new();
        state.set_var("a", "0");
        state.set_var("a[1]", "1");
        unset(&mut state, &[s("a")]).unwrap();
        assert_eq!(state.get_var("a"), None);
        assert_eq!(state.get_var("a[1]"), None);
    }

    #[test]
    fn shift_drops_leading_params() {
        let mut state = ShellState::new();
        state.positional = vec![s("a"), s("b"), s("c")];
        shift(&mut state, &[]).unwrap();
        assert_eq!(state.positional, vec!["b", "c"]);
        let r = shift(&mut state, &[s("5")]).unwrap();
        assert_eq!(r.status, 1);
    }

    #[test]
    fn local_outside_function_fails() {
        let mut state = ShellState::new();
        let r = local(&mut state, &[s("x=1")]).unwrap();
        assert_eq!(r.status, 1);
    }
}
