//! Control-flow signals.
//!
//! `break`, `continue`, `return`, `exit`, errexit termination, and the
//! execution-limit stop all travel on the executor's `Err` path as plain
//! values carrying the output accumulated so far. Loops and function
//! frames intercept what belongs to them; everything else unwinds to the
//! top, where it becomes an `ExecResult`. Nothing here is a panic.

use crate::interpreter::types::CommandOutput;

#[derive(Debug, Clone)]
pub enum Flow {
    /// `break N`: terminate N enclosing loops.
    Break { levels: u32, out: CommandOutput },
    /// `continue N`: next iteration of the Nth enclosing loop.
    Continue { levels: u32, out: CommandOutput },
    /// `return N`: leave the current function or sourced script.
    Return { out: CommandOutput },
    /// `exit N`: leave the whole script.
    Exit { out: CommandOutput },
    /// errexit fired on an uncaught nonzero status.
    Errexit { out: CommandOutput },
    /// Statement or iteration budget exhausted.
    Limit { out: CommandOutput },
}

pub type RunResult = Result<CommandOutput, Flow>;

impl Flow {
    pub fn out(&self) -> &CommandOutput {
        match self {
            Flow::Break { out, .. }
            | Flow::Continue { out, .. }
            | Flow::Return { out }
            | Flow::Exit { out }
            | Flow::Errexit { out }
            | Flow::Limit { out } => out,
        }
    }

    pub fn out_mut(&mut self) -> &mut CommandOutput {
        match self {
            Flow::Break { out, .. }
            | Flow::Continue { out, .. }
            | Flow::Return { out }
            | Flow::Exit { out }
            | Flow::Errexit { out }
            | Flow::Limit { out } => out,
        }
    }

    /// Prepend output gathered before the signal was raised, so nothing
    /// printed so far is lost while unwinding.
    pub fn prepend(mut self, stdout: &str, stderr: &str) -> Self {
        {
            let out = self.out_mut();
            out.stdout = format!("{}{}", stdout, out.stdout);
            out.stderr = format!("{}{}", stderr, out.stderr);
        }
        self
    }

    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        Flow::Limit {
            out: CommandOutput::failure(format!("bash: {}\n", message.into()), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_keeps_order() {
        let flow = Flow::Exit { out: CommandOutput::with_stdout("late\n") };
        let flow = flow.prepend("early\n", "");
        assert_eq!(flow.out().stdout, "early\nlate\n");
    }

    #[test]
    fn limit_has_status_one() {
        let flow = Flow::limit_exceeded("maximum loop iterations (5) exceeded");
        assert_eq!(flow.out().status, 1);
        assert!(flow.out().stderr.contains("maximum loop iterations"));
    }
}
