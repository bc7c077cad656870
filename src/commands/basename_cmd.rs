use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct BasenameCommand;

#[async_trait]
impl Command for BasenameCommand {
    fn name(&self) -> &'static str {
        "basename"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let path = match ctx.args.first() {
            Some(p) => p,
            None => return CommandResult::error("basename: missing operand\n"),
        };
        let trimmed = path.trim_end_matches('/');
        let mut base = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
        };
        // Optional suffix removal: basename file.txt .txt
        if let Some(suffix) = ctx.args.get(1) {
            if base.len() > suffix.len() {
                if let Some(stripped) = base.strip_suffix(suffix.as_str()) {
                    base = stripped.to_string();
                }
            }
        }
        CommandResult::success(format!("{}\n", base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn strips_directories() {
        let r = BasenameCommand.execute(ctx(vec!["/a/b/c.txt"])).await;
        assert_eq!(r.stdout, "c.txt\n");
    }

    #[tokio::test]
    async fn strips_suffix() {
        let r = BasenameCommand.execute(ctx(vec!["/a/b/c.txt", ".txt"])).await;
        assert_eq!(r.stdout, "c\n");
    }

    #[tokio::test]
    async fn root_stays_root() {
        let r = BasenameCommand.execute(ctx(vec!["/"])).await;
        assert_eq!(r.stdout, "/\n");
    }
}
