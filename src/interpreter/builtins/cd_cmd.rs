//! `cd`: working-directory changes, `cd -`, `OLDPWD`/`PWD` upkeep.

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::RunResult;
use crate::interpreter::types::{CommandOutput, ShellState};

pub fn run(engine: &Engine, state: &mut ShellState, args: &[String]) -> RunResult {
    let fs = engine.fs();

    let (target, echo_target) = match args.first().map(|s| s.as_str()) {
        None | Some("--") => {
            let home = state.get_var("HOME").unwrap_or_else(|| "/".to_string());
            (home, false)
        }
        Some("-") => {
            let prev = state.previous_dir.clone();
            (prev, true)
        }
        Some(path) => (path.to_string(), false),
    };

    let resolved = fs.resolve(&state.cwd, &target);
    if !fs.is_dir(&resolved) {
        let reason = if fs.exists(&resolved) {
            "Not a directory"
        } else {
            "No such file or directory"
        };
        return Ok(CommandOutput::failure(
            format!("bash: cd: {}: {}\n", target, reason),
            1,
        ));
    }

    state.previous_dir = state.cwd.clone();
    state.env.insert("OLDPWD".to_string(), state.cwd.clone());
    state.cwd = resolved.clone();
    state.env.insert("PWD".to_string(), resolved.clone());

    // `cd -` echoes the directory it lands in.
    if echo_target {
        return Ok(CommandOutput::with_stdout(format!("{}\n", resolved)));
    }
    Ok(CommandOutput::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandRegistry;
    use crate::fs::{FileSystem, MemFs, MkdirOpts};
    use crate::interpreter::sync_fs::SyncFs;
    use crate::interpreter::types::ExecLimits;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread")]
    async fn cd_updates_pwd_and_oldpwd() {
        let mem = Arc::new(MemFs::new());
        mem.mkdir("/home/user", MkdirOpts { recursive: true }).await.unwrap();
        mem.mkdir("/tmp", MkdirOpts { recursive: true }).await.unwrap();

        let limits = ExecLimits::default();
        let registry = CommandRegistry::new();
        let fs = SyncFs::new(mem, tokio::runtime::Handle::current());
        let engine = Engine::new(&limits, fs, None, &registry);

        let mut state = ShellState::new();
        state.cwd = "/home/user".to_string();

        let r = run(&engine, &mut state, &["/tmp".to_string()]).unwrap();
        assert_eq!(r.status, 0);
        assert_eq!(state.cwd, "/tmp");
        assert_eq!(state.env.get("PWD"), Some(&"/tmp".to_string()));
        assert_eq!(state.env.get("OLDPWD"), Some(&"/home/user".to_string()));

        // cd - goes back and echoes
        let r = run(&engine, &mut state, &["-".to_string()]).unwrap();
        assert_eq!(r.stdout, "/home/user\n");
        assert_eq!(state.cwd, "/home/user");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cd_missing_directory_fails() {
        let mem = Arc::new(MemFs::new());
        let limits = ExecLimits::default();
        let registry = CommandRegistry::new();
        let fs = SyncFs::new(mem, tokio::runtime::Handle::current());
        let engine = Engine::new(&limits, fs, None, &registry);

        let mut state = ShellState::new();
        let r = run(&engine, &mut state, &["/nope".to_string()]).unwrap();
        assert_eq!(r.status, 1);
        assert!(r.stderr.contains("No such file or directory"));
    }
}
