use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::RemoveOpts;

pub struct RmCommand;

#[async_trait]
impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut recursive = false;
        let mut force = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "-R" => recursive = true,
                "-f" => force = true,
                "-rf" | "-fr" => {
                    recursive = true;
                    force = true;
                }
                _ => paths.push(arg.clone()),
            }
        }
        if paths.is_empty() {
            if force {
                return CommandResult::success("");
            }
            return CommandResult::error("rm: missing operand\n");
        }

        let mut stderr = String::new();
        let mut status = 0;
        for path in &paths {
            let resolved = ctx.resolve(path);
            if !recursive {
                if let Ok(stat) = ctx.fs.stat(&resolved).await {
                    if stat.is_directory {
                        stderr.push_str(&format!("rm: cannot remove '{}': Is a directory\n", path));
                        status = 1;
                        continue;
                    }
                }
            }
            if let Err(e) = ctx.fs.remove(&resolved, RemoveOpts { recursive, force }).await {
                stderr.push_str(&format!("rm: cannot remove '{}': {}\n", path, e));
                status = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, status)
    }
}
