//! Shell environment: the consumer-visible entry point.
//!
//! Ties together the parser, the interpreter engine, the virtual
//! filesystem, the command catalogue, and the optional HTTP client.
//! `exec` never fails: parse errors, runtime errors, and limit stops
//! all come back as an `ExecResult`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::{standard_registry, CommandRegistry};
use crate::fs::{parent_of, FileSystem, MemFs, MkdirOpts};
use crate::interpreter::engine::Engine;
use crate::interpreter::errors::Flow;
use crate::interpreter::sync_fs::SyncFs;
use crate::interpreter::types::{CommandOutput, ExecLimits, ExecResult, ShellOpts, ShellState};
use crate::network::{HttpClient, NetworkConfig};

/// Options for constructing a [`Shell`].
#[derive(Default)]
pub struct ShellOptions {
    /// Initial files: absolute path to text content.
    pub files: Option<HashMap<String, String>>,
    /// Extra environment variables, merged over the defaults.
    pub env: Option<HashMap<String, String>>,
    /// Working directory; defaults to `/home/user`.
    pub cwd: Option<String>,
    pub network: Option<NetworkConfig>,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub shell_opts: Option<ShellOpts>,
    pub limits: Option<ExecLimits>,
    /// Filesystem backend; defaults to a fresh [`MemFs`].
    pub fs: Option<Arc<dyn FileSystem>>,
}

pub struct Shell {
    pub fs: Arc<dyn FileSystem>,
    http: Option<Arc<dyn HttpClient>>,
    limits: ExecLimits,
    registry: CommandRegistry,
    state: ShellState,
}

impl Shell {
    pub async fn new(options: ShellOptions) -> Self {
        let cwd = options.cwd.unwrap_or_else(|| "/home/user".to_string());
        let fs: Arc<dyn FileSystem> = options.fs.unwrap_or_else(|| Arc::new(MemFs::new()));
        let limits = options.limits.unwrap_or_default();

        // Standard tree, then the caller's files.
        for dir in ["/bin", "/usr/bin", "/tmp", "/dev", cwd.as_str()] {
            let _ = fs.mkdir(dir, MkdirOpts { recursive: true }).await;
        }
        let _ = fs.write_file("/dev/null", b"").await;
        if let Some(files) = &options.files {
            for (path, content) in files {
                let mut dir = parent_of(path);
                let mut missing = Vec::new();
                while dir != "/" && !fs.exists(&dir).await {
                    missing.push(dir.clone());
                    dir = parent_of(&dir);
                }
                for d in missing.into_iter().rev() {
                    let _ = fs.mkdir(&d, MkdirOpts { recursive: false }).await;
                }
                let _ = fs.write_file(path, content.as_bytes()).await;
            }
        }

        let mut state = ShellState::new();
        state.cwd = cwd.clone();
        state.previous_dir = cwd.clone();
        state.env.insert("HOME".to_string(), cwd.clone());
        state.env.insert("PATH".to_string(), "/bin:/usr/bin".to_string());
        state.env.insert("IFS".to_string(), " \t\n".to_string());
        state.env.insert("PWD".to_string(), cwd.clone());
        state.env.insert("OLDPWD".to_string(), cwd.clone());
        state.env.insert("?".to_string(), "0".to_string());

        for name in ["HOME", "PATH", "PWD", "OLDPWD"] {
            state.exported.insert(name.to_string());
        }

        if let Some(user_env) = options.env {
            for (name, value) in user_env {
                state.exported.insert(name.clone());
                state.env.insert(name, value);
            }
        }
        if let Some(opts) = options.shell_opts {
            state.opts = opts;
        }
        if let Some(network) = options.network {
            state.network = network;
        }

        Self {
            fs,
            http: options.http_client,
            limits,
            registry: standard_registry(),
            state,
        }
    }

    /// Execute a script against the current state. Never fails; every
    /// error becomes stderr text plus a nonzero exit code.
    pub async fn exec(&mut self, source: &str) -> ExecResult {
        if source.trim().is_empty() {
            return self.result(CommandOutput::ok());
        }

        let script = match crate::parser::parse(source) {
            Ok(script) => script,
            Err(e) => {
                self.state.set_status(2);
                return self.result(CommandOutput::failure(
                    format!("bash: syntax error: {}\n", e.message),
                    2,
                ));
            }
        };

        let handle = tokio::runtime::Handle::current();
        let fs = SyncFs::new(self.fs.clone(), handle);
        let engine = Engine::new(&self.limits, fs, self.http.clone(), &self.registry);

        let out = tokio::task::block_in_place(|| {
            let mut out = match engine.run_script(&mut self.state, &script) {
                Ok(out) => out,
                Err(Flow::Exit { out })
                | Err(Flow::Errexit { out })
                | Err(Flow::Limit { out })
                | Err(Flow::Break { out, .. })
                | Err(Flow::Continue { out, .. }) => out,
                Err(Flow::Return { mut out }) => {
                    out.stderr.push_str(
                        "bash: return: can only `return' from a function or sourced script\n",
                    );
                    out.status = 1;
                    out
                }
            };
            self.state.set_status(out.status);

            // EXIT trap: runs once after the script, output appended,
            // the script's own status preserved.
            if let Some(action) = self.state.traps.remove("EXIT") {
                let status = out.status;
                match engine.run_text(&mut self.state, &action) {
                    Ok(trap_out) => {
                        out.stdout.push_str(&trap_out.stdout);
                        out.stderr.push_str(&trap_out.stderr);
                    }
                    Err(flow) => {
                        out.stdout.push_str(&flow.out().stdout);
                        out.stderr.push_str(&flow.out().stderr);
                    }
                }
                out.status = status;
                self.state.set_status(status);
            }
            out
        });

        self.result(out)
    }

    pub fn cwd(&self) -> &str {
        &self.state.cwd
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.state.env
    }

    fn result(&self, out: CommandOutput) -> ExecResult {
        ExecResult {
            stdout: out.stdout,
            stderr: out.stderr,
            exit_code: out.status.rem_euclid(256),
            env: self.state.env.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn shell() -> Shell {
        Shell::new(ShellOptions::default()).await
    }

    async fn run(source: &str) -> ExecResult {
        shell().await.exec(source).await
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hello_world() {
        let r = run("echo 'Hello World'").await;
        assert_eq!(r.stdout, "Hello World\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_file_error() {
        let r = run("cat nonexistent").await;
        assert_eq!(r.stdout, "");
        assert!(r.stderr.contains("No such file or directory"));
        assert_eq!(r.exit_code, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn for_loop() {
        let r = run("for i in 1 2 3; do echo $i; done").await;
        assert_eq!(r.stdout, "1\n2\n3\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn errexit_with_pipefail() {
        let r = run("set -eo pipefail; echo before; true | false | true; echo after").await;
        assert_eq!(r.stdout, "before\n");
        assert_eq!(r.exit_code, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn while_with_arithmetic() {
        let r = run("i=0; while [ $i -lt 3 ]; do echo $i; i=$((i+1)); done").await;
        assert_eq!(r.stdout, "0\n1\n2\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn assign_default_expansion() {
        let r = run("unset X; echo \"${X:=hi}\"; echo \"$X\"").await;
        assert_eq!(r.stdout, "hi\nhi\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn source_script_from_files_option() {
        let mut files = HashMap::new();
        files.insert("/script.sh".to_string(), "A=1\nB=2\n".to_string());
        let mut sh = Shell::new(ShellOptions { files: Some(files), ..Default::default() }).await;
        let r = sh.exec("source /script.sh; echo $((A+B))").await;
        assert_eq!(r.stdout, "3\n");
        assert_eq!(r.exit_code, 0);
    }

    // ------------------------------------------------------------------------
    // Spec properties
    // ------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread")]
    async fn exit_code_mirrors_status_var() {
        let mut sh = shell().await;
        let r = sh.exec("false").await;
        assert_eq!(r.exit_code, 1);
        let r = sh.exec("echo $?").await;
        assert_eq!(r.stdout, "1\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pipeline_status_rules() {
        let mut sh = shell().await;
        let r = sh.exec("false | true").await;
        assert_eq!(r.exit_code, 0);
        let r = sh.exec("set -o pipefail; false | true").await;
        assert_eq!(r.exit_code, 1);
        let r = sh.exec("true | true").await;
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn errexit_gating() {
        // LHS of && / ||, conditions, and negation do not trip errexit
        let r = run("set -e; false || echo rescued; echo done").await;
        assert_eq!(r.stdout, "rescued\ndone\n");
        let r = run("set -e; if false; then echo no; fi; echo alive").await;
        assert_eq!(r.stdout, "alive\n");
        let r = run("set -e; ! false; echo alive").await;
        assert_eq!(r.stdout, "alive\n");
        let r = run("set -e; false; echo unreachable").await;
        assert_eq!(r.stdout, "");
        assert_eq!(r.exit_code, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prefix_assignments_are_ordered_and_scoped() {
        let r = run("a=1 a=2 echo $a").await;
        assert_eq!(r.stdout, "2\n");
        // ...and do not leak past the command
        let r = run("a=1 a=2 true; echo [$a]").await;
        assert_eq!(r.stdout, "[]\n");
        // cross-command ordering is left to right
        let r = run("x=$y y=hi; echo [$x]").await;
        assert_eq!(r.stdout, "[]\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn quoting_controls_word_splitting() {
        let mut sh = shell().await;
        sh.exec("v='a  b'").await;
        let r = sh.exec("printf '[%s]' \"$v\"").await;
        assert_eq!(r.stdout, "[a  b]");
        let r = sh.exec("printf '[%s]' $v").await;
        assert_eq!(r.stdout, "[a][b]");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn glob_matches_and_literal_fallback() {
        let mut files = HashMap::new();
        files.insert("/home/user/a.txt".to_string(), String::new());
        files.insert("/home/user/.hidden".to_string(), String::new());
        let mut sh = Shell::new(ShellOptions { files: Some(files), ..Default::default() }).await;
        let r = sh.exec("echo *.txt").await;
        assert_eq!(r.stdout, "a.txt\n");
        let r = sh.exec("echo *").await;
        assert!(!r.stdout.contains(".hidden"));
        let r = sh.exec("echo *.zip").await;
        assert_eq!(r.stdout, "*.zip\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn parameter_operator_examples() {
        let mut sh = shell().await;
        sh.exec("v=/a/b.c").await;
        assert_eq!(sh.exec("echo ${v#*/}").await.stdout, "a/b.c\n");
        assert_eq!(sh.exec("echo ${v##*/}").await.stdout, "b.c\n");
        assert_eq!(sh.exec("echo ${v%.*}").await.stdout, "/a/b\n");
        assert_eq!(sh.exec("echo ${v%%.*}").await.stdout, "/a/b\n");
        assert_eq!(sh.exec("echo ${#v}").await.stdout, "6\n");
        // Zero-based substring offsets: position 1 holds the `a`.
        assert_eq!(sh.exec("echo ${v:1:1}").await.stdout, "a\n");
        assert_eq!(sh.exec("echo ${v:3}").await.stdout, "b.c\n");
        assert_eq!(sh.exec("echo ${v: -3}").await.stdout, "b.c\n");
    }

    // ------------------------------------------------------------------------
    // Broader behavior
    // ------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread")]
    async fn command_not_found_is_127() {
        let r = run("no_such_cmd_xyz").await;
        assert_eq!(r.exit_code, 127);
        assert!(r.stderr.contains("command not found"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn syntax_error_is_2() {
        let r = run("if true; then").await;
        assert_eq!(r.exit_code, 2);
        assert!(r.stderr.contains("syntax error"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn functions_with_args_and_return() {
        let r = run("f() { echo got:$1:$2; return 3; }; f a b; echo status=$?").await;
        assert_eq!(r.stdout, "got:a:b\nstatus=3\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_variables_restore() {
        let r = run("x=outer; f() { local x=inner; echo $x; }; f; echo $x").await;
        assert_eq!(r.stdout, "inner\nouter\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subshell_discards_state() {
        let r = run("x=1; (x=2; echo in:$x); echo out:$x").await;
        assert_eq!(r.stdout, "in:2\nout:1\n");
        let r = run("cd /tmp; (cd /); pwd").await;
        assert_eq!(r.stdout, "/tmp\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn command_substitution() {
        let r = run("echo a$(echo b)c").await;
        assert_eq!(r.stdout, "abc\n");
        let r = run("echo `echo legacy`").await;
        assert_eq!(r.stdout, "legacy\n");
        let r = run("files=$(echo 1; echo 2); echo \"$files\"").await;
        assert_eq!(r.stdout, "1\n2\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn arithmetic_everywhere() {
        let r = run("echo $((2 ** 8)) $((010)) $((0x10))").await;
        assert_eq!(r.stdout, "256 8 16\n");
        let r = run("(( 5 > 3 )) && echo yes").await;
        assert_eq!(r.stdout, "yes\n");
        let r = run("for ((i=0; i<3; i++)); do echo $i; done").await;
        assert_eq!(r.stdout, "0\n1\n2\n");
        let r = run("echo $((1/0))").await;
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("division by 0"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn conditional_command() {
        let r = run("[[ abc == a* ]] && echo glob").await;
        assert_eq!(r.stdout, "glob\n");
        let r = run("[[ 2 -lt 10 ]] && echo num").await;
        assert_eq!(r.stdout, "num\n");
        let r = run("x=ab12; [[ $x =~ [0-9]+ ]] && echo $BASH_REMATCH").await;
        assert_eq!(r.stdout, "12\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn case_statement() {
        let script = "case $1 in a) echo A ;; b|c) echo BC ;; *) echo other ;; esac";
        let r = run(&format!("set -- b; {}", script)).await;
        assert_eq!(r.stdout, "BC\n");
        let r = run(&format!("set -- z; {}", script)).await;
        assert_eq!(r.stdout, "other\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn case_fallthrough() {
        let r = run("case a in a) echo one ;& b) echo two ;; c) echo three ;; esac").await;
        assert_eq!(r.stdout, "one\ntwo\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn redirections_roundtrip() {
        let mut sh = shell().await;
        let r = sh.exec("echo hi > out.txt; cat out.txt").await;
        assert_eq!(r.stdout, "hi\n");
        let r = sh.exec("echo more >> out.txt; wc -l out.txt").await;
        assert!(r.stdout.starts_with("2"));
        let r = sh.exec("cat missing 2>/dev/null; echo rc=$?").await;
        assert_eq!(r.stdout, "rc=1\n");
        assert_eq!(r.stderr, "");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stderr_merging() {
        let r = run("cat missing 2>&1").await;
        assert!(r.stdout.contains("No such file or directory"));
        assert_eq!(r.stderr, "");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn heredocs_and_herestrings() {
        let r = run("cat <<EOF\nval=$HOME\nEOF").await;
        assert_eq!(r.stdout, "val=/home/user\n");
        let r = run("cat <<'EOF'\nval=$HOME\nEOF").await;
        assert_eq!(r.stdout, "val=$HOME\n");
        let r = run("cat <<< hello").await;
        assert_eq!(r.stdout, "hello\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pipeline_threading() {
        let r = run("printf 'c\\nb\\na\\n' | sort | head -n 1").await;
        assert_eq!(r.stdout, "a\n");
        let r = run("echo hello world | wc -w").await;
        assert_eq!(r.stdout.trim(), "2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn read_from_pipe() {
        let r = run("echo 'one two' | { read a b; echo a=$a b=$b; }").await;
        assert_eq!(r.stdout, "a=one b=two\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn break_and_continue() {
        let r = run("for i in 1 2 3 4; do if [ $i = 3 ]; then break; fi; echo $i; done").await;
        assert_eq!(r.stdout, "1\n2\n");
        let r = run("for i in 1 2 3; do if [ $i = 2 ]; then continue; fi; echo $i; done").await;
        assert_eq!(r.stdout, "1\n3\n");
        let r =
            run("for i in 1 2; do for j in a b; do break 2; done; echo inner; done; echo done").await;
        assert_eq!(r.stdout, "done\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exit_trap_runs_with_status_preserved() {
        let r = run("trap 'echo cleanup' EXIT; echo body; exit 3").await;
        assert_eq!(r.stdout, "body\ncleanup\n");
        assert_eq!(r.exit_code, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_iteration_limit() {
        let mut sh = Shell::new(ShellOptions {
            limits: Some(ExecLimits { max_loop_iterations: 10, ..Default::default() }),
            ..Default::default()
        })
        .await;
        let r = sh.exec("while true; do :; done; echo unreachable").await;
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("maximum loop iterations"));
        assert!(!r.stdout.contains("unreachable"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn nounset_errors() {
        let r = run("set -u; echo $UNDEFINED_VAR").await;
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("unbound variable"));
        // special names stay usable
        let r = run("set -u; echo $?$#").await;
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn brace_expansion() {
        let r = run("echo {a,b}{1,2}").await;
        assert_eq!(r.stdout, "a1 a2 b1 b2\n");
        let r = run("echo file{1..3}.txt").await;
        assert_eq!(r.stdout, "file1.txt file2.txt file3.txt\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tilde_expansion() {
        let r = run("echo ~").await;
        assert_eq!(r.stdout, "/home/user\n");
        let r = run("echo ~/docs").await;
        assert_eq!(r.stdout, "/home/user/docs\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn arrays_flat_encoding() {
        let r = run("a=(x y z); echo ${a[1]} ${a[@]} ${#a[@]}").await;
        assert_eq!(r.stdout, "y x y z 3\n");
        let r = run("a=(x); a+=(y); echo ${a[@]}").await;
        assert_eq!(r.stdout, "x y\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn positional_parameters() {
        let r = run("set -- one two; echo $1-$2-$#").await;
        assert_eq!(r.stdout, "one-two-2\n");
        let r = run("set -- a b c; shift; echo $1").await;
        assert_eq!(r.stdout, "b\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn quoted_at_preserves_fields() {
        let r = run("f() { printf '[%s]' \"$@\"; }; f 'a b' c").await;
        assert_eq!(r.stdout, "[a b][c]");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn eval_and_exit() {
        let r = run("eval 'echo evaluated'").await;
        assert_eq!(r.stdout, "evaluated\n");
        let r = run("exit 42").await;
        assert_eq!(r.exit_code, 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ifs_empty_disables_splitting() {
        let r = run("v='a b'; IFS=''; printf '[%s]' $v").await;
        assert_eq!(r.stdout, "[a b]");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn custom_ifs_splitting() {
        let r = run("IFS=:; v=a:b:c; printf '[%s]' $v").await;
        assert_eq!(r.stdout, "[a][b][c]");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cd_tracks_pwd_invariant() {
        let mut sh = shell().await;
        sh.exec("cd /tmp").await;
        let r = sh.exec("echo $PWD; pwd").await;
        assert_eq!(r.stdout, "/tmp\n/tmp\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exec_result_env_snapshot() {
        let r = run("MY_VAR=42").await;
        assert_eq!(r.env.get("MY_VAR"), Some(&"42".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_script_is_ok() {
        let r = run("").await;
        assert_eq!(r.exit_code, 0);
        let r = run("   \n  ").await;
        assert_eq!(r.exit_code, 0);
    }
}
