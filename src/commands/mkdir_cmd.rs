use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::MkdirOpts;

pub struct MkdirCommand;

#[async_trait]
impl Command for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut recursive = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-p" => recursive = true,
                _ => paths.push(arg.clone()),
            }
        }
        if paths.is_empty() {
            return CommandResult::error("mkdir: missing operand\n");
        }

        let mut stderr = String::new();
        let mut status = 0;
        for path in &paths {
            let resolved = ctx.resolve(path);
            if let Err(e) = ctx.fs.mkdir(&resolved, MkdirOpts { recursive }).await {
                stderr.push_str(&format!("mkdir: cannot create directory '{}': {}\n", path, e));
                status = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, status)
    }
}
