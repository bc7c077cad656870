//! Redirection planning and application.
//!
//! Redirections are resolved to a plan before the command runs (stdin
//! content, an fd table over shared sinks) and routed afterwards. Dup
//! operators point two fds at the same sink; file sinks are written to
//! the virtual filesystem when the plan is applied, so the unwind
//! happens on every exit path.

use std::collections::HashMap;

use crate::ast::types::{RedirOp, RedirTarget, Redirection};
use crate::interpreter::engine::Engine;
use crate::interpreter::expansion::{expand_word_single, ExpCtx, ExpandError};
use crate::interpreter::types::{CommandOutput, ShellState};

#[derive(Debug, Clone)]
enum Sink {
    Stdout,
    Stderr,
    File { path: String, append: bool },
    Discard,
}

#[derive(Debug)]
pub struct RedirPlan {
    /// Stdin override from `<`, `<<`, `<<<`, `<>`.
    pub stdin: Option<String>,
    fd_map: HashMap<i32, usize>,
    sinks: Vec<Sink>,
}

impl Default for RedirPlan {
    fn default() -> Self {
        let mut fd_map = HashMap::new();
        fd_map.insert(1, 0);
        fd_map.insert(2, 1);
        Self { stdin: None, fd_map, sinks: vec![Sink::Stdout, Sink::Stderr] }
    }
}

impl RedirPlan {
    pub fn is_passthrough(&self) -> bool {
        self.stdin.is_none()
            && self.sinks.len() == 2
            && self.fd_map.get(&1) == Some(&0)
            && self.fd_map.get(&2) == Some(&1)
    }
}

/// Expand targets and build the plan, honoring order.
pub fn build_plan(
    engine: &Engine,
    state: &mut ShellState,
    redirections: &[Redirection],
    ctx: &mut ExpCtx,
) -> Result<RedirPlan, ExpandError> {
    let mut plan = RedirPlan::default();
    let fs = engine.fs();

    for redir in redirections {
        match redir.op {
            RedirOp::HereDoc | RedirOp::HereDocDash => {
                let heredoc = match &redir.target {
                    RedirTarget::HereDoc(h) => h,
                    RedirTarget::Word(_) => continue,
                };
                let body = expand_word_single(engine, state, &heredoc.body, ctx)?;
                plan.stdin = Some(body);
            }
            RedirOp::HereString => {
                let text = target_text(engine, state, redir, ctx)?;
                plan.stdin = Some(format!("{}\n", text));
            }
            RedirOp::Read => {
                let target = target_text(engine, state, redir, ctx)?;
                let path = fs.resolve(&state.cwd, &target);
                match fs.read_file(&path) {
                    Ok(content) => plan.stdin = Some(content),
                    Err(_) => {
                        return Err(ExpandError {
                            out: CommandOutput::failure(
                                format!("bash: {}: No such file or directory\n", target),
                                1,
                            ),
                        });
                    }
                }
            }
            RedirOp::ReadWrite => {
                let target = target_text(engine, state, redir, ctx)?;
                let path = fs.resolve(&state.cwd, &target);
                let content = fs.read_file(&path).unwrap_or_default();
                if !fs.exists(&path) {
                    let _ = fs.write_file(&path, b"");
                }
                plan.stdin = Some(content);
            }
            RedirOp::Write | RedirOp::Clobber | RedirOp::Append => {
                let target = target_text(engine, state, redir, ctx)?;
                let path = fs.resolve(&state.cwd, &target);
                let fd = redir.fd.unwrap_or(1);
                let sink = plan.sinks.len();
                plan.sinks.push(Sink::File { path, append: redir.op == RedirOp::Append });
                plan.fd_map.insert(fd, sink);
            }
            RedirOp::AllOut | RedirOp::AllAppend => {
                let target = target_text(engine, state, redir, ctx)?;
                let path = fs.resolve(&state.cwd, &target);
                let sink = plan.sinks.len();
                plan.sinks.push(Sink::File { path, append: redir.op == RedirOp::AllAppend });
                plan.fd_map.insert(1, sink);
                plan.fd_map.insert(2, sink);
            }
            RedirOp::DupOut => {
                let target = target_text(engine, state, redir, ctx)?;
                let fd = redir.fd.unwrap_or(1);
                if target == "-" {
                    let sink = plan.sinks.len();
                    plan.sinks.push(Sink::Discard);
                    plan.fd_map.insert(fd, sink);
                } else if let Ok(src) = target.parse::<i32>() {
                    let sink = match plan.fd_map.get(&src) {
                        Some(s) => *s,
                        None => {
                            return Err(ExpandError {
                                out: CommandOutput::failure(
                                    format!("bash: {}: Bad file descriptor\n", src),
                                    1,
                                ),
                            });
                        }
                    };
                    plan.fd_map.insert(fd, sink);
                } else {
                    return Err(ExpandError {
                        out: CommandOutput::failure(
                            format!("bash: {}: ambiguous redirect\n", target),
                            1,
                        ),
                    });
                }
            }
            RedirOp::DupIn => {
                let target = target_text(engine, state, redir, ctx)?;
                if target == "-" {
                    plan.stdin = Some(String::new());
                }
                // Numeric input dups collapse onto fd 0 in this model.
            }
        }
    }
    Ok(plan)
}

fn target_text(
    engine: &Engine,
    state: &mut ShellState,
    redir: &Redirection,
    ctx: &mut ExpCtx,
) -> Result<String, ExpandError> {
    match &redir.target {
        RedirTarget::Word(w) => expand_word_single(engine, state, w, ctx),
        RedirTarget::HereDoc(h) => Ok(h.delimiter.clone()),
    }
}

/// Route a command's output through the plan: write file sinks, return
/// what still reaches the caller's stdout/stderr.
pub fn apply_plan(engine: &Engine, plan: &RedirPlan, out: CommandOutput) -> CommandOutput {
    if plan.is_passthrough() {
        return out;
    }

    let mut buffers: Vec<String> = vec![String::new(); plan.sinks.len()];
    if let Some(&sink) = plan.fd_map.get(&1) {
        buffers[sink].push_str(&out.stdout);
    }
    if let Some(&sink) = plan.fd_map.get(&2) {
        buffers[sink].push_str(&out.stderr);
    }

    let fs = engine.fs();
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut status = out.status;

    for (i, sink) in plan.sinks.iter().enumerate() {
        match sink {
            Sink::Stdout => stdout.push_str(&buffers[i]),
            Sink::Stderr => stderr.push_str(&buffers[i]),
            Sink::Discard => {}
            Sink::File { path, append } => {
                let result = if *append {
                    fs.append_file(path, buffers[i].as_bytes())
                } else {
                    fs.write_file(path, buffers[i].as_bytes())
                };
                if let Err(e) = result {
                    stderr.push_str(&format!("bash: {}\n", e));
                    status = 1;
                }
            }
        }
    }

    CommandOutput { stdout, stderr, status }
}
