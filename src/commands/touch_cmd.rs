use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TouchCommand;

#[async_trait]
impl Command for TouchCommand {
    fn name(&self) -> &'static str {
        "touch"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.is_empty() {
            return CommandResult::error("touch: missing file operand\n");
        }
        let mut stderr = String::new();
        let mut status = 0;
        for path in &ctx.args {
            let resolved = ctx.resolve(path);
            if ctx.fs.exists(&resolved).await {
                continue;
            }
            if let Err(e) = ctx.fs.write_file(&resolved, b"").await {
                stderr.push_str(&format!("touch: cannot touch '{}': {}\n", path, e));
                status = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, status)
    }
}
