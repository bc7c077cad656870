use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct DirnameCommand;

#[async_trait]
impl Command for DirnameCommand {
    fn name(&self) -> &'static str {
        "dirname"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let path = match ctx.args.first() {
            Some(p) => p,
            None => return CommandResult::error("dirname: missing operand\n"),
        };
        let trimmed = path.trim_end_matches('/');
        let dir = match trimmed.rfind('/') {
            Some(0) => "/",
            Some(i) => &trimmed[..i],
            None => ".",
        };
        let dir = if dir.is_empty() { "/" } else { dir };
        CommandResult::success(format!("{}\n", dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn keeps_directory_part() {
        let r = DirnameCommand.execute(ctx(vec!["/a/b/c.txt"])).await;
        assert_eq!(r.stdout, "/a/b\n");
    }

    #[tokio::test]
    async fn bare_name_gives_dot() {
        let r = DirnameCommand.execute(ctx(vec!["file"])).await;
        assert_eq!(r.stdout, ".\n");
    }

    #[tokio::test]
    async fn top_level_gives_root() {
        let r = DirnameCommand.execute(ctx(vec!["/file"])).await;
        assert_eq!(r.stdout, "/\n");
    }
}
