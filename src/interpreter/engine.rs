//! The execution engine.
//!
//! Walks the AST: scripts, statements with `&&`/`||` gating and errexit,
//! pipelines over in-memory buffers, simple command dispatch
//! (function, then builtin, then utility command), compound commands,
//! and the clone-based subshell model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ast::types::*;
use crate::commands::Command as _;
use crate::commands::{CommandContext, CommandRegistry};
use crate::interpreter::builtins;
use crate::interpreter::conditionals::eval_cond;
use crate::interpreter::errors::{Flow, RunResult};
use crate::interpreter::expansion::{
    self, expand_assignment_value, expand_word_as_pattern, expand_word_single, ExpCtx,
    ExpandError,
};
use crate::interpreter::redirections::{apply_plan, build_plan, RedirPlan};
use crate::interpreter::sync_fs::SyncFs;
use crate::interpreter::types::{CommandOutput, ExecLimits, ShellState};
use crate::network::HttpClient;

pub struct Engine<'a> {
    pub limits: &'a ExecLimits,
    fs: SyncFs,
    http: Option<Arc<dyn HttpClient>>,
    registry: &'a CommandRegistry,
    psub_counter: AtomicU64,
}

impl<'a> Engine<'a> {
    pub fn new(
        limits: &'a ExecLimits,
        fs: SyncFs,
        http: Option<Arc<dyn HttpClient>>,
        registry: &'a CommandRegistry,
    ) -> Self {
        Self { limits, fs, http, registry, psub_counter: AtomicU64::new(10) }
    }

    pub fn fs(&self) -> &SyncFs {
        &self.fs
    }

    pub fn http(&self) -> Option<Arc<dyn HttpClient>> {
        self.http.clone()
    }

    pub fn has_registered_command(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    // -------------------------------------------------------------------------
    // Scripts and statements
    // -------------------------------------------------------------------------

    /// Run a statement list, threading `$?` and accumulating output.
    /// Control-flow signals unwind through here with output attached.
    pub fn run_script(&self, state: &mut ShellState, script: &Script) -> RunResult {
        let mut out = CommandOutput::ok();
        for statement in &script.statements {
            match self.run_statement(state, statement) {
                Ok(r) => {
                    out.merge(&r);
                    state.set_status(r.status);
                }
                Err(flow) => return Err(flow.prepend(&out.stdout, &out.stderr)),
            }
        }
        out.status = state.last_exit_code;
        Ok(out)
    }

    /// Parse and run source text (eval, source, traps).
    pub fn run_text(&self, state: &mut ShellState, source: &str) -> RunResult {
        match crate::parser::parse(source) {
            Ok(script) => self.run_script(state, &script),
            Err(e) => Ok(CommandOutput::failure(
                format!("bash: syntax error: {}\n", e.message),
                2,
            )),
        }
    }

    fn run_statement(&self, state: &mut ShellState, stmt: &Statement) -> RunResult {
        let mut out = CommandOutput::ok();

        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            if i > 0 {
                match stmt.operators[i - 1] {
                    ListOp::And if out.status != 0 => continue,
                    ListOp::Or if out.status == 0 => continue,
                    _ => {}
                }
            }

            let r = self
                .run_pipeline(state, pipeline)
                .map_err(|f| f.prepend(&out.stdout, &out.stderr))?;
            out.merge(&r);
            state.set_status(r.status);

            // errexit: a failing pipeline stops the script unless its
            // status is being tested by a following && / ||, it is
            // negated, or we are inside a condition.
            let tested = stmt
                .operators
                .get(i)
                .map(|op| matches!(op, ListOp::And | ListOp::Or))
                .unwrap_or(false);
            if state.opts.errexit
                && r.status != 0
                && !pipeline.negated
                && !state.in_condition
                && !tested
            {
                return Err(Flow::Errexit { out });
            }
        }
        Ok(out)
    }

    fn run_pipeline(&self, state: &mut ShellState, pipeline: &Pipeline) -> RunResult {
        let mut out = if pipeline.commands.len() == 1 {
            self.run_command(state, &pipeline.commands[0])?
        } else {
            self.run_multi_stage(state, pipeline)?
        };

        if pipeline.negated {
            out.status = if out.status == 0 { 1 } else { 0 };
        }
        Ok(out)
    }

    /// Stages run sequentially over byte buffers; each stage works on a
    /// clone of the state, so stage-local mutations stay local.
    fn run_multi_stage(&self, state: &mut ShellState, pipeline: &Pipeline) -> RunResult {
        let mut stdin = String::new();
        let mut stderr = String::new();
        let mut statuses = Vec::with_capacity(pipeline.commands.len());

        for command in &pipeline.commands {
            let mut stage_state = state.clone();
            stage_state.stdin_buffer = std::mem::take(&mut stdin);

            let result = match self.run_command(&mut stage_state, command) {
                Ok(r) => r,
                // A stage is a subshell: exit and friends end the stage,
                // not the pipeline's caller.
                Err(Flow::Limit { out }) => {
                    return Err(Flow::Limit { out }.prepend("", &stderr));
                }
                Err(flow) => flow.out().clone(),
            };

            stdin = result.stdout;
            stderr.push_str(&result.stderr);
            statuses.push(result.status);
        }

        let status = if state.opts.pipefail {
            statuses.iter().rev().find(|s| **s != 0).copied().unwrap_or(0)
        } else {
            *statuses.last().unwrap_or(&0)
        };

        Ok(CommandOutput { stdout: stdin, stderr, status })
    }

    // -------------------------------------------------------------------------
    // Command dispatch
    // -------------------------------------------------------------------------

    pub fn run_command(&self, state: &mut ShellState, command: &Command) -> RunResult {
        if !state.charge_command(self.limits) {
            return Err(Flow::limit_exceeded(format!(
                "maximum command count ({}) exceeded",
                self.limits.max_commands
            )));
        }

        match command {
            Command::Simple(simple) => self.run_simple(state, simple),
            Command::Compound(compound) => self.run_compound(state, compound),
            Command::FunctionDef(def) => {
                state.functions.insert(def.name.clone(), def.clone());
                Ok(CommandOutput::ok())
            }
        }
    }

    fn run_simple(&self, state: &mut ShellState, cmd: &SimpleCommand) -> RunResult {
        let mut ctx = ExpCtx::default();

        // Assignment-only commands mutate the shell; status is that of
        // the last command substitution, if any.
        if cmd.name.is_none() {
            for assignment in &cmd.assignments {
                if let Err(e) = self.apply_assignment(state, assignment, &mut ctx, false) {
                    return Ok(with_expansion_stderr(e.out, &ctx));
                }
            }
            let plan = match build_plan(self, state, &cmd.redirections, &mut ctx) {
                Ok(plan) => plan,
                Err(e) => return Ok(with_expansion_stderr(e.out, &ctx)),
            };
            let status = ctx.last_subst_status.unwrap_or(0);
            let out = CommandOutput { stdout: String::new(), stderr: ctx.stderr.clone(), status };
            return Ok(apply_plan(self, &plan, out));
        }

        // Prefix assignments scope to this command only.
        let mut saved_env: Vec<(String, Option<String>)> = Vec::new();
        for assignment in &cmd.assignments {
            match self.apply_assignment(state, assignment, &mut ctx, true) {
                Ok(mut saved) => saved_env.append(&mut saved),
                Err(e) => {
                    restore_env(state, saved_env);
                    return Ok(with_expansion_stderr(e.out, &ctx));
                }
            }
        }

        // Expand command word and arguments into argv.
        let mut words = vec![cmd.name.clone().unwrap()];
        words.extend(cmd.args.iter().cloned());
        let expanded = match expansion::expand_words(self, state, &words) {
            Ok(e) => e,
            Err(e) => {
                restore_env(state, saved_env);
                return Ok(with_expansion_stderr(e.out, &ctx));
            }
        };
        ctx.stderr.push_str(&expanded.stderr);
        if expanded.last_subst_status.is_some() {
            ctx.last_subst_status = expanded.last_subst_status;
        }

        let plan = match build_plan(self, state, &cmd.redirections, &mut ctx) {
            Ok(plan) => plan,
            Err(e) => {
                restore_env(state, saved_env);
                return Ok(with_expansion_stderr(e.out, &ctx));
            }
        };

        if expanded.fields.is_empty() {
            // The command word expanded away entirely.
            restore_env(state, saved_env);
            let status = ctx.last_subst_status.unwrap_or(0);
            let out = CommandOutput { stdout: String::new(), stderr: ctx.stderr, status };
            return Ok(apply_plan(self, &plan, out));
        }

        let argv = expanded.fields;
        let trace = if state.opts.xtrace {
            Some(format!("+ {}\n", argv.join(" ")))
        } else {
            None
        };

        let result = self.dispatch(state, &argv, &plan);
        restore_env(state, saved_env);

        match result {
            Ok(mut out) => {
                out.stderr = format!("{}{}{}", trace.unwrap_or_default(), ctx.stderr, out.stderr);
                Ok(apply_plan(self, &plan, out))
            }
            Err(flow) => Err(flow.prepend("", &ctx.stderr)),
        }
    }

    /// Resolution order: user function, shell builtin, utility command.
    fn dispatch(&self, state: &mut ShellState, argv: &[String], plan: &RedirPlan) -> RunResult {
        let name = argv[0].as_str();

        let saved_stdin = match &plan.stdin {
            Some(content) => {
                Some(std::mem::replace(&mut state.stdin_buffer, content.clone()))
            }
            None => None,
        };

        let result = if let Some(def) = state.functions.get(name).cloned() {
            self.call_function(state, &def, &argv[1..])
        } else if builtins::is_shell_builtin(name) {
            builtins::run(self, state, argv)
        } else if let Some(command) = self.registry.get(name) {
            let ctx = CommandContext {
                args: argv[1..].to_vec(),
                stdin: std::mem::take(&mut state.stdin_buffer),
                cwd: state.cwd.clone(),
                env: state.env.clone(),
                fs: self.fs.shared(),
                http: self.http.clone(),
                network: state.network.clone(),
            };
            let r = self.fs.block_on(command.execute(ctx));
            Ok(CommandOutput { stdout: r.stdout, stderr: r.stderr, status: r.exit_code })
        } else {
            Ok(CommandOutput::failure(
                format!("bash: {}: command not found\n", name),
                127,
            ))
        };

        if let Some(old) = saved_stdin {
            state.stdin_buffer = old;
        }
        result
    }

    pub fn call_function(
        &self,
        state: &mut ShellState,
        def: &FunctionDef,
        args: &[String],
    ) -> RunResult {
        if state.call_depth >= self.limits.max_call_depth {
            return Err(Flow::limit_exceeded(format!(
                "maximum function nesting level exceeded ({})",
                self.limits.max_call_depth
            )));
        }

        let saved_positional = std::mem::replace(&mut state.positional, args.to_vec());
        let saved_name = std::mem::replace(&mut state.script_name, def.name.clone());
        state.local_scopes.push(Default::default());
        state.call_depth += 1;

        let mut result = self.with_redirections(state, &def.redirections, |engine, state| {
            engine.run_compound(state, &def.body)
        });

        state.call_depth -= 1;
        state.pop_scope();
        state.positional = saved_positional;
        state.script_name = saved_name;

        if let Err(Flow::Return { out }) = result {
            result = Ok(out);
        }
        result
    }

    // -------------------------------------------------------------------------
    // Compound commands
    // -------------------------------------------------------------------------

    fn run_compound(&self, state: &mut ShellState, compound: &CompoundCommand) -> RunResult {
        let redirections = compound_redirections(compound);
        self.with_redirections(state, redirections, |engine, state| {
            engine.run_compound_inner(state, compound)
        })
    }

    fn with_redirections<F>(
        &self,
        state: &mut ShellState,
        redirections: &[Redirection],
        f: F,
    ) -> RunResult
    where
        F: FnOnce(&Self, &mut ShellState) -> RunResult,
    {
        if redirections.is_empty() {
            return f(self, state);
        }

        let mut ctx = ExpCtx::default();
        let plan = match build_plan(self, state, redirections, &mut ctx) {
            Ok(plan) => plan,
            Err(e) => return Ok(with_expansion_stderr(e.out, &ctx)),
        };

        let saved_stdin = plan
            .stdin
            .as_ref()
            .map(|content| std::mem::replace(&mut state.stdin_buffer, content.clone()));

        let result = f(self, state);

        if let Some(old) = saved_stdin {
            state.stdin_buffer = old;
        }

        match result {
            Ok(out) => Ok(apply_plan(self, &plan, out)),
            Err(mut flow) => {
                let routed = apply_plan(self, &plan, flow.out().clone());
                *flow.out_mut() = routed;
                Err(flow)
            }
        }
    }

    fn run_compound_inner(&self, state: &mut ShellState, compound: &CompoundCommand) -> RunResult {
        match compound {
            CompoundCommand::If(node) => self.run_if(state, node),
            CompoundCommand::For(node) => self.run_for(state, node),
            CompoundCommand::CStyleFor(node) => self.run_cstyle_for(state, node),
            CompoundCommand::While(node) => {
                self.run_while_until(state, &node.condition, &node.body, false)
            }
            CompoundCommand::Until(node) => {
                self.run_while_until(state, &node.condition, &node.body, true)
            }
            CompoundCommand::Case(node) => self.run_case(state, node),
            CompoundCommand::Subshell(node) => self.run_subshell(state, &node.body),
            CompoundCommand::Group(node) => {
                self.run_statements(state, &node.body)
            }
            CompoundCommand::Arith(node) => {
                match crate::interpreter::arithmetic::eval_arith(state, &node.expr) {
                    Ok(value) => Ok(CommandOutput {
                        stdout: String::new(),
                        stderr: String::new(),
                        status: if value != 0 { 0 } else { 1 },
                    }),
                    Err(e) => Ok(CommandOutput::failure(format!("bash: {}\n", e.message), 1)),
                }
            }
            CompoundCommand::Cond(node) => {
                let mut ctx = ExpCtx::default();
                match eval_cond(self, state, &node.expr, &mut ctx) {
                    Ok(truth) => Ok(CommandOutput {
                        stdout: String::new(),
                        stderr: ctx.stderr,
                        status: if truth { 0 } else { 1 },
                    }),
                    Err(e) => Ok(with_expansion_stderr(e.out, &ctx)),
                }
            }
        }
    }

    fn run_statements(&self, state: &mut ShellState, statements: &[Statement]) -> RunResult {
        let script = Script { statements: statements.to_vec() };
        self.run_script(state, &script)
    }

    /// Run a condition list with errexit suppressed.
    fn run_condition(&self, state: &mut ShellState, statements: &[Statement]) -> RunResult {
        let was = state.in_condition;
        state.in_condition = true;
        let result = self.run_statements(state, statements);
        state.in_condition = was;
        result
    }

    fn run_if(&self, state: &mut ShellState, node: &IfCommand) -> RunResult {
        let mut out = CommandOutput::ok();

        for branch in &node.branches {
            let cond = self
                .run_condition(state, &branch.condition)
                .map_err(|f| f.prepend(&out.stdout, &out.stderr))?;
            let taken = cond.status == 0;
            out.stdout.push_str(&cond.stdout);
            out.stderr.push_str(&cond.stderr);

            if taken {
                let body = self
                    .run_statements(state, &branch.body)
                    .map_err(|f| f.prepend(&out.stdout, &out.stderr))?;
                out.merge(&body);
                return Ok(out);
            }
        }

        if let Some(else_body) = &node.else_body {
            let body = self
                .run_statements(state, else_body)
                .map_err(|f| f.prepend(&out.stdout, &out.stderr))?;
            out.merge(&body);
            return Ok(out);
        }

        out.status = 0;
        Ok(out)
    }

    fn run_for(&self, state: &mut ShellState, node: &ForCommand) -> RunResult {
        let items = match &node.words {
            Some(words) => match expansion::expand_words(self, state, words) {
                Ok(expanded) => expanded.fields,
                Err(e) => return Ok(e.out),
            },
            None => state.positional.clone(),
        };

        let mut out = CommandOutput::ok();
        let mut body_status = 0;
        state.loop_depth += 1;

        let mut iterations: u64 = 0;
        'iteration: for item in items {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                state.loop_depth -= 1;
                return Err(Flow::limit_exceeded(format!(
                    "maximum loop iterations ({}) exceeded",
                    self.limits.max_loop_iterations
                ))
                .prepend(&out.stdout, &out.stderr));
            }
            state.set_var(&node.variable, item);

            match self.run_statements(state, &node.body) {
                Ok(r) => {
                    out.stdout.push_str(&r.stdout);
                    out.stderr.push_str(&r.stderr);
                    body_status = r.status;
                }
                Err(flow) => match self.loop_signal(state, flow, &mut out)? {
                    LoopSignal::Break => break 'iteration,
                    LoopSignal::Continue => continue 'iteration,
                },
            }
        }

        state.loop_depth -= 1;
        out.status = body_status;
        Ok(out)
    }

    fn run_cstyle_for(&self, state: &mut ShellState, node: &CStyleForCommand) -> RunResult {
        use crate::interpreter::arithmetic::eval_arith;

        if let Some(init) = &node.init {
            if let Err(e) = eval_arith(state, init) {
                return Ok(CommandOutput::failure(format!("bash: {}\n", e.message), 1));
            }
        }

        let mut out = CommandOutput::ok();
        let mut body_status = 0;
        state.loop_depth += 1;
        let mut iterations: u64 = 0;

        'iteration: loop {
            if let Some(cond) = &node.condition {
                match eval_arith(state, cond) {
                    Ok(v) if v == 0 => break,
                    Ok(_) => {}
                    Err(e) => {
                        state.loop_depth -= 1;
                        out.stderr.push_str(&format!("bash: {}\n", e.message));
                        out.status = 1;
                        return Ok(out);
                    }
                }
            }

            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                state.loop_depth -= 1;
                return Err(Flow::limit_exceeded(format!(
                    "maximum loop iterations ({}) exceeded",
                    self.limits.max_loop_iterations
                ))
                .prepend(&out.stdout, &out.stderr));
            }

            match self.run_statements(state, &node.body) {
                Ok(r) => {
                    out.stdout.push_str(&r.stdout);
                    out.stderr.push_str(&r.stderr);
                    body_status = r.status;
                }
                Err(flow) => match self.loop_signal(state, flow, &mut out)? {
                    LoopSignal::Break => break 'iteration,
                    LoopSignal::Continue => {}
                },
            }

            if let Some(update) = &node.update {
                if let Err(e) = eval_arith(state, update) {
                    state.loop_depth -= 1;
                    out.stderr.push_str(&format!("bash: {}\n", e.message));
                    out.status = 1;
                    return Ok(out);
                }
            }
        }

        state.loop_depth -= 1;
        out.status = body_status;
        Ok(out)
    }

    fn run_while_until(
        &self,
        state: &mut ShellState,
        condition: &[Statement],
        body: &[Statement],
        until: bool,
    ) -> RunResult {
        let mut out = CommandOutput::ok();
        let mut body_status = 0;
        state.loop_depth += 1;
        let mut iterations: u64 = 0;

        'iteration: loop {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                state.loop_depth -= 1;
                return Err(Flow::limit_exceeded(format!(
                    "maximum loop iterations ({}) exceeded",
                    self.limits.max_loop_iterations
                ))
                .prepend(&out.stdout, &out.stderr));
            }

            let cond = match self.run_condition(state, condition) {
                Ok(r) => r,
                Err(flow) => {
                    state.loop_depth -= 1;
                    return Err(flow.prepend(&out.stdout, &out.stderr));
                }
            };
            out.stdout.push_str(&cond.stdout);
            out.stderr.push_str(&cond.stderr);

            let proceed = if until { cond.status != 0 } else { cond.status == 0 };
            if !proceed {
                break;
            }

            match self.run_statements(state, body) {
                Ok(r) => {
                    out.stdout.push_str(&r.stdout);
                    out.stderr.push_str(&r.stderr);
                    body_status = r.status;
                }
                Err(flow) => match self.loop_signal(state, flow, &mut out)? {
                    LoopSignal::Break => break 'iteration,
                    LoopSignal::Continue => continue 'iteration,
                },
            }
        }

        state.loop_depth -= 1;
        out.status = body_status;
        Ok(out)
    }

    /// Intercept break/continue aimed at this loop; rethrow anything
    /// aimed further out.
    fn loop_signal(
        &self,
        state: &mut ShellState,
        flow: Flow,
        out: &mut CommandOutput,
    ) -> Result<LoopSignal, Flow> {
        match flow {
            Flow::Break { levels, out: o } => {
                out.stdout.push_str(&o.stdout);
                out.stderr.push_str(&o.stderr);
                if levels > 1 {
                    state.loop_depth -= 1;
                    return Err(Flow::Break { levels: levels - 1, out: out.clone() });
                }
                Ok(LoopSignal::Break)
            }
            Flow::Continue { levels, out: o } => {
                out.stdout.push_str(&o.stdout);
                out.stderr.push_str(&o.stderr);
                if levels > 1 {
                    state.loop_depth -= 1;
                    return Err(Flow::Continue { levels: levels - 1, out: out.clone() });
                }
                Ok(LoopSignal::Continue)
            }
            other => {
                state.loop_depth -= 1;
                Err(other.prepend(&out.stdout, &out.stderr))
            }
        }
    }

    fn run_case(&self, state: &mut ShellState, node: &CaseCommand) -> RunResult {
        let mut ctx = ExpCtx::default();
        let subject = match expand_word_single(self, state, &node.subject, &mut ctx) {
            Ok(s) => s,
            Err(e) => return Ok(with_expansion_stderr(e.out, &ctx)),
        };

        let mut out = CommandOutput::ok();
        out.stderr.push_str(&ctx.stderr);
        let mut fall_through = false;

        for arm in &node.arms {
            let mut matched = fall_through;
            if !matched {
                for pattern_word in &arm.patterns {
                    let mut pctx = ExpCtx::default();
                    let pattern = match expand_word_as_pattern(self, state, pattern_word, &mut pctx)
                    {
                        Ok(p) => p,
                        Err(e) => return Ok(with_expansion_stderr(e.out, &pctx)),
                    };
                    if crate::interpreter::pattern::matches_glob(&pattern, &subject) {
                        matched = true;
                        break;
                    }
                }
            }
            if !matched {
                continue;
            }

            let body = self
                .run_statements(state, &arm.body)
                .map_err(|f| f.prepend(&out.stdout, &out.stderr))?;
            out.merge(&body);

            match arm.terminator {
                CaseTerminator::Break => return Ok(out),
                CaseTerminator::FallThrough => {
                    fall_through = true;
                }
                CaseTerminator::Continue => {
                    fall_through = false;
                }
            }
        }
        Ok(out)
    }

    /// `( ... )`: body runs on a clone; mutations vanish, output stays.
    /// The filesystem is shared by reference, so file changes are
    /// visible outside, unlike a real fork.
    fn run_subshell(&self, state: &mut ShellState, body: &[Statement]) -> RunResult {
        let mut sub = state.clone();
        match self.run_statements(&mut sub, body) {
            Ok(out) => Ok(out),
            Err(Flow::Exit { out }) => Ok(out),
            Err(Flow::Errexit { out }) => Ok(out),
            Err(Flow::Break { out, .. }) | Err(Flow::Continue { out, .. }) => Ok(out),
            Err(flow @ Flow::Limit { .. }) => Err(flow),
            Err(Flow::Return { out }) => Ok(out),
        }
    }

    // -------------------------------------------------------------------------
    // Substitutions
    // -------------------------------------------------------------------------

    /// `$( ... )`: run on a clone of the state, capture stdout.
    pub fn command_substitution(
        &self,
        state: &ShellState,
        script: &Script,
    ) -> (String, String, i32) {
        let mut sub = state.clone();
        match self.run_script(&mut sub, script) {
            Ok(out) => (out.stdout, out.stderr, out.status),
            Err(flow) => {
                let out = flow.out();
                (out.stdout.clone(), out.stderr.clone(), out.status)
            }
        }
    }

    /// `<( ... )` materializes the body's output as a file and expands
    /// to its path. `>( ... )` yields a fresh path; its body is not
    /// executed in this shell.
    pub fn process_substitution(
        &self,
        state: &mut ShellState,
        script: &Script,
        direction: ProcessDirection,
        ctx: &mut ExpCtx,
    ) -> Result<String, ExpandError> {
        let n = self.psub_counter.fetch_add(1, Ordering::Relaxed);
        let path = format!("/dev/fd/{}", n);
        let _ = self.fs.mkdir("/dev/fd", crate::fs::MkdirOpts { recursive: true });

        match direction {
            ProcessDirection::In => {
                let (stdout, stderr, _status) = self.command_substitution(state, script);
                ctx.stderr.push_str(&stderr);
                let _ = self.fs.write_file(&path, stdout.as_bytes());
            }
            ProcessDirection::Out => {
                let _ = self.fs.write_file(&path, b"");
            }
        }
        Ok(path)
    }

    // -------------------------------------------------------------------------
    // Assignments
    // -------------------------------------------------------------------------

    /// Apply one assignment. When `transient` the previous values are
    /// returned for restoration after the command.
    fn apply_assignment(
        &self,
        state: &mut ShellState,
        assignment: &Assignment,
        ctx: &mut ExpCtx,
        transient: bool,
    ) -> Result<Vec<(String, Option<String>)>, ExpandError> {
        let mut saved = Vec::new();
        let mut remember = |state: &ShellState, key: &str, saved: &mut Vec<(String, Option<String>)>| {
            if transient {
                saved.push((key.to_string(), state.env.get(key).cloned()));
            }
        };

        if let Some(elements) = &assignment.array {
            let mut values = Vec::new();
            for word in elements {
                let expanded = expansion::expand_words(self, state, std::slice::from_ref(word))?;
                ctx.stderr.push_str(&expanded.stderr);
                values.extend(expanded.fields);
            }

            let base = &assignment.name;
            let start = if assignment.append {
                crate::interpreter::expansion::param::array_elements(state, base).len() as i64
            } else {
                // Reassignment clears the old elements.
                let prefix = format!("{}[", base);
                let stale: Vec<String> = state
                    .env
                    .keys()
                    .filter(|k| *k == base || k.starts_with(&prefix))
                    .cloned()
                    .collect();
                for key in stale {
                    remember(state, &key, &mut saved);
                    state.env.remove(&key);
                }
                0
            };

            for (i, value) in values.into_iter().enumerate() {
                let idx = start + i as i64;
                let key = if idx == 0 { base.clone() } else { format!("{}[{}]", base, idx) };
                remember(state, &key, &mut saved);
                state.set_var(&key, value);
            }
            return Ok(saved);
        }

        let key = self.assignment_key(state, &assignment.name)?;
        let value = match &assignment.value {
            Some(word) => expand_assignment_value(self, state, word, ctx)?,
            None => String::new(),
        };

        remember(state, &key, &mut saved);
        if assignment.append {
            let existing = state.get_var(&key).unwrap_or_default();
            state.set_var(&key, format!("{}{}", existing, value));
        } else {
            state.set_var(&key, value);
        }
        Ok(saved)
    }

    /// `name` or `name[subscript]` with the subscript evaluated.
    fn assignment_key(&self, state: &mut ShellState, name: &str) -> Result<String, ExpandError> {
        let open = match name.find('[') {
            Some(i) => i,
            None => return Ok(name.to_string()),
        };
        let base = &name[..open];
        let subscript = &name[open + 1..name.len() - 1];
        let expr = crate::parser::arithmetic_parser::parse_arithmetic(subscript).map_err(|_| {
            ExpandError {
                out: CommandOutput::failure(format!("bash: {}: bad array subscript\n", name), 1),
            }
        })?;
        let idx = crate::interpreter::arithmetic::eval_arith(state, &expr).map_err(|e| {
            ExpandError { out: CommandOutput::failure(format!("bash: {}\n", e.message), 1) }
        })?;
        Ok(if idx == 0 { base.to_string() } else { format!("{}[{}]", base, idx) })
    }
}

enum LoopSignal {
    Break,
    Continue,
}

fn compound_redirections(compound: &CompoundCommand) -> &[Redirection] {
    match compound {
        CompoundCommand::If(n) => &n.redirections,
        CompoundCommand::For(n) => &n.redirections,
        CompoundCommand::CStyleFor(n) => &n.redirections,
        CompoundCommand::While(n) => &n.redirections,
        CompoundCommand::Until(n) => &n.redirections,
        CompoundCommand::Case(n) => &n.redirections,
        CompoundCommand::Subshell(n) => &n.redirections,
        CompoundCommand::Group(n) => &n.redirections,
        CompoundCommand::Arith(n) => &n.redirections,
        CompoundCommand::Cond(n) => &n.redirections,
    }
}

fn restore_env(state: &mut ShellState, saved: Vec<(String, Option<String>)>) {
    for (key, old) in saved.into_iter().rev() {
        match old {
            Some(value) => {
                state.env.insert(key, value);
            }
            None => {
                state.env.remove(&key);
            }
        }
    }
}

fn with_expansion_stderr(mut out: CommandOutput, ctx: &ExpCtx) -> CommandOutput {
    if !ctx.stderr.is_empty() && !out.stderr.starts_with(&ctx.stderr) {
        out.stderr = format!("{}{}", ctx.stderr, out.stderr);
    }
    out
}
