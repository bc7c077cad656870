//! `test` / `[`: POSIX test over already-expanded arguments.
//!
//! Unlike `[[ ... ]]` the operands arrive fully expanded, `=` compares
//! literally (no glob), and `-a`/`-o` provide conjunction. The grammar
//! here is the pragmatic one real shells use: recursive descent over
//! argv with lookahead for binary operators.

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::RunResult;
use crate::interpreter::types::{CommandOutput, ShellState};

pub fn run(engine: &Engine, state: &mut ShellState, args: &[String], bracket: bool) -> RunResult {
    let mut args = args.to_vec();
    if bracket {
        match args.pop() {
            Some(last) if last == "]" => {}
            _ => {
                return Ok(CommandOutput::failure(
                    "bash: [: missing `]'\n".to_string(),
                    2,
                ));
            }
        }
    }

    if args.is_empty() {
        return Ok(CommandOutput { stdout: String::new(), stderr: String::new(), status: 1 });
    }

    let mut p = TestParser { engine, state, args: &args, pos: 0 };
    match p.parse_or() {
        Ok(truth) if p.pos == args.len() => Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            status: if truth { 0 } else { 1 },
        }),
        Ok(_) => Ok(CommandOutput::failure(
            format!("bash: test: {}: unexpected argument\n", args[p.pos]),
            2,
        )),
        Err(message) => Ok(CommandOutput::failure(format!("bash: test: {}\n", message), 2)),
    }
}

struct TestParser<'a, 'e> {
    engine: &'a Engine<'e>,
    state: &'a ShellState,
    args: &'a [String],
    pos: usize,
}

impl TestParser<'_, '_> {
    fn cur(&self) -> Option<&str> {
        self.args.get(self.pos).map(|s| s.as_str())
    }

    fn parse_or(&mut self) -> Result<bool, String> {
        let mut truth = self.parse_and()?;
        while self.cur() == Some("-o") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            truth = truth || rhs;
        }
        Ok(truth)
    }

    fn parse_and(&mut self) -> Result<bool, String> {
        let mut truth = self.parse_term()?;
        while self.cur() == Some("-a") {
            self.pos += 1;
            let rhs = self.parse_term()?;
            truth = truth && rhs;
        }
        Ok(truth)
    }

    fn parse_term(&mut self) -> Result<bool, String> {
        match self.cur() {
            Some("!") => {
                self.pos += 1;
                Ok(!self.parse_term()?)
            }
            Some("(") => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.cur() != Some(")") {
                    return Err("`)' expected".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(_) => self.parse_primary(),
            None => Err("argument expected".to_string()),
        }
    }

    fn parse_primary(&mut self) -> Result<bool, String> {
        let first = self.args[self.pos].clone();

        // Binary operator lookahead: `a OP b`.
        if let Some(op) = self.args.get(self.pos + 1) {
            if let Some(result) = self.try_binary(&first, op.clone())? {
                return Ok(result);
            }
        }

        // Unary operator with operand.
        if first.starts_with('-') && first.len() == 2 && self.pos + 1 < self.args.len() {
            let operand = self.args[self.pos + 1].clone();
            self.pos += 2;
            return self.eval_unary(&first, &operand);
        }

        // Bare string: true when non-empty.
        self.pos += 1;
        Ok(!first.is_empty())
    }

    fn try_binary(&mut self, lhs: &str, op: String) -> Result<Option<bool>, String> {
        let rhs = match self.args.get(self.pos + 2) {
            Some(r) => r.clone(),
            None => return Ok(None),
        };

        let result = match op.as_str() {
            "=" | "==" => lhs == rhs,
            "!=" => lhs != rhs,
            "<" => lhs < rhs.as_str(),
            ">" => lhs > rhs.as_str(),
            "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge" => {
                let a = int_of(lhs)?;
                let b = int_of(&rhs)?;
                match op.as_str() {
                    "-eq" => a == b,
                    "-ne" => a != b,
                    "-lt" => a < b,
                    "-le" => a <= b,
                    "-gt" => a > b,
                    "-ge" => a >= b,
                    _ => unreachable!(),
                }
            }
            "-nt" | "-ot" | "-ef" => {
                let fs = self.engine.fs();
                let lp = fs.resolve(&self.state.cwd, lhs);
                let rp = fs.resolve(&self.state.cwd, &rhs);
                match op.as_str() {
                    "-nt" => fs.exists(&lp) && !fs.exists(&rp),
                    "-ot" => !fs.exists(&lp) && fs.exists(&rp),
                    _ => lp == rp && fs.exists(&lp),
                }
            }
            _ => return Ok(None),
        };
        self.pos += 3;
        Ok(Some(result))
    }

    fn eval_unary(&self, op: &str, operand: &str) -> Result<bool, String> {
        match op {
            "-z" => return Ok(operand.is_empty()),
            "-n" => return Ok(!operand.is_empty()),
            "-v" => return Ok(self.state.is_var_set(operand) && self.state.get_var(operand).is_some()),
            "-t" => return Ok(false),
            _ => {}
        }

        let fs = self.engine.fs();
        let path = fs.resolve(&self.state.cwd, operand);
        let stat = fs.stat(&path);
        match op {
            "-e" | "-a" => Ok(stat.is_ok()),
            "-f" => Ok(stat.map(|s| s.is_file).unwrap_or(false)),
            "-d" => Ok(stat.map(|s| s.is_directory).unwrap_or(false)),
            "-L" | "-h" => Ok(stat.map(|s| s.is_symlink).unwrap_or(false)),
            "-s" => Ok(stat.map(|s| s.size > 0).unwrap_or(false)),
            "-r" | "-w" => Ok(stat.is_ok()),
            "-x" => Ok(stat.map(|s| s.mode & 0o111 != 0).unwrap_or(false)),
            other => Err(format!("{}: unary operator expected", other)),
        }
    }
}

fn int_of(text: &str) -> Result<i64, String> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| format!("{}: integer expression expected", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandRegistry;
    use crate::fs::{FileSystem, MemFs};
    use crate::interpreter::sync_fs::SyncFs;
    use crate::interpreter::types::ExecLimits;
    use std::sync::Arc;

    fn s(text: &str) -> String {
        text.to_string()
    }

    async fn check(args: &[String]) -> i32 {
        let mem = Arc::new(MemFs::new());
        mem.write_file("/data.txt", b"content").await.unwrap();
        let limits = ExecLimits::default();
        let registry = CommandRegistry::new();
        let fs = SyncFs::new(mem, tokio::runtime::Handle::current());
        let engine = Engine::new(&limits, fs, None, &registry);
        let mut state = ShellState::new();
        run(&engine, &mut state, args, false).unwrap().status
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn string_tests() {
        assert_eq!(check(&[s("hello")]).await, 0);
        assert_eq!(check(&[s("")]).await, 1);
        assert_eq!(check(&[s("-z"), s("")]).await, 0);
        assert_eq!(check(&[s("-n"), s("x")]).await, 0);
        assert_eq!(check(&[s("a"), s("="), s("a")]).await, 0);
        assert_eq!(check(&[s("a"), s("!="), s("b")]).await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn integer_tests() {
        assert_eq!(check(&[s("3"), s("-lt"), s("5")]).await, 0);
        assert_eq!(check(&[s("5"), s("-lt"), s("3")]).await, 1);
        assert_eq!(check(&[s("2"), s("-eq"), s("2")]).await, 0);
        // Non-numeric operand is a usage error
        assert_eq!(check(&[s("x"), s("-eq"), s("2")]).await, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn file_tests() {
        assert_eq!(check(&[s("-f"), s("/data.txt")]).await, 0);
        assert_eq!(check(&[s("-d"), s("/")]).await, 0);
        assert_eq!(check(&[s("-e"), s("/nope")]).await, 1);
        assert_eq!(check(&[s("-s"), s("/data.txt")]).await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn negation_and_connectives() {
        assert_eq!(check(&[s("!"), s("")]).await, 0);
        assert_eq!(check(&[s("a"), s("-a"), s("b")]).await, 0);
        assert_eq!(check(&[s(""), s("-o"), s("b")]).await, 0);
        assert_eq!(check(&[s(""), s("-a"), s("b")]).await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bracket_requires_closer() {
        let mem = Arc::new(MemFs::new());
        let limits = ExecLimits::default();
        let registry = CommandRegistry::new();
        let fs = SyncFs::new(mem, tokio::runtime::Handle::current());
        let engine = Engine::new(&limits, fs, None, &registry);
        let mut state = ShellState::new();
        let r = run(&engine, &mut state, &[s("x")], true).unwrap();
        assert_eq!(r.status, 2);
        let r = run(&engine, &mut state, &[s("x"), s("]")], true).unwrap();
        assert_eq!(r.status, 0);
    }
}
