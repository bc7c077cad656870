use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::RemoveOpts;

pub struct RmdirCommand;

#[async_trait]
impl Command for RmdirCommand {
    fn name(&self) -> &'static str {
        "rmdir"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.is_empty() {
            return CommandResult::error("rmdir: missing operand\n");
        }
        let mut stderr = String::new();
        let mut status = 0;
        for path in &ctx.args {
            let resolved = ctx.resolve(path);
            let is_dir = ctx
                .fs
                .stat(&resolved)
                .await
                .map(|s| s.is_directory)
                .unwrap_or(false);
            if !is_dir {
                stderr.push_str(&format!("rmdir: failed to remove '{}': Not a directory\n", path));
                status = 1;
                continue;
            }
            if let Err(e) = ctx.fs.remove(&resolved, RemoveOpts::default()).await {
                stderr.push_str(&format!("rmdir: failed to remove '{}': {}\n", path, e));
                status = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, status)
    }
}
