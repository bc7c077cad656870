use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::base_name;

pub struct MvCommand;

#[async_trait]
impl Command for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let paths: Vec<String> = ctx.args.iter().filter(|a| !a.starts_with('-')).cloned().collect();
        if paths.len() < 2 {
            return CommandResult::error("mv: missing file operand\n");
        }

        let dest_arg = paths.last().unwrap().clone();
        let dest = ctx.resolve(&dest_arg);
        let dest_is_dir = ctx.fs.stat(&dest).await.map(|s| s.is_directory).unwrap_or(false);
        let sources = &paths[..paths.len() - 1];
        if sources.len() > 1 && !dest_is_dir {
            return CommandResult::error(format!("mv: target '{}' is not a directory\n", dest_arg));
        }

        let mut stderr = String::new();
        let mut status = 0;
        for src_arg in sources {
            let src = ctx.resolve(src_arg);
            let target = if dest_is_dir {
                format!("{}/{}", dest.trim_end_matches('/'), base_name(&src))
            } else {
                dest.clone()
            };
            if let Err(e) = ctx.fs.rename(&src, &target).await {
                stderr.push_str(&format!("mv: cannot move '{}': {}\n", src_arg, e));
                status = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx_with_fs;
    use crate::fs::{FileSystem, MemFs, MkdirOpts};
    use std::sync::Arc;

    #[tokio::test]
    async fn renames_file() {
        let fs = Arc::new(MemFs::new());
        fs.write_file("/a", b"1").await.unwrap();
        let r = MvCommand.execute(ctx_with_fs(vec!["/a", "/b"], fs.clone())).await;
        assert_eq!(r.exit_code, 0);
        assert!(!fs.exists("/a").await);
        assert_eq!(fs.read_file("/b").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn moves_into_directory() {
        let fs = Arc::new(MemFs::new());
        fs.write_file("/a", b"1").await.unwrap();
        fs.mkdir("/d", MkdirOpts::default()).await.unwrap();
        let r = MvCommand.execute(ctx_with_fs(vec!["/a", "/d"], fs.clone())).await;
        assert_eq!(r.exit_code, 0);
        assert_eq!(fs.read_file("/d/a").await.unwrap(), "1");
    }
}
