//! `cp` with `-r`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::{base_name, MkdirOpts};

pub struct CpCommand;

#[async_trait]
impl Command for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut recursive = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "-R" | "-a" => recursive = true,
                _ => paths.push(arg.clone()),
            }
        }
        if paths.len() < 2 {
            return CommandResult::error("cp: missing file operand\n");
        }

        let dest_arg = paths.pop().unwrap();
        let dest = ctx.resolve(&dest_arg);
        let dest_is_dir = ctx.fs.stat(&dest).await.map(|s| s.is_directory).unwrap_or(false);
        if paths.len() > 1 && !dest_is_dir {
            return CommandResult::error(format!("cp: target '{}' is not a directory\n", dest_arg));
        }

        let mut stderr = String::new();
        let mut status = 0;
        for src_arg in &paths {
            let src = ctx.resolve(src_arg);
            let target = if dest_is_dir {
                format!("{}/{}", dest.trim_end_matches('/'), base_name(&src))
            } else {
                dest.clone()
            };
            if let Err(e) = copy_tree(&ctx, &src, &target, recursive).await {
                stderr.push_str(&format!("cp: {}\n", e));
                status = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, status)
    }
}

async fn copy_tree(
    ctx: &CommandContext,
    src: &str,
    dest: &str,
    recursive: bool,
) -> Result<(), String> {
    let stat = ctx
        .fs
        .stat(src)
        .await
        .map_err(|_| format!("cannot stat '{}': No such file or directory", src))?;

    if stat.is_directory {
        if !recursive {
            return Err(format!("-r not specified; omitting directory '{}'", src));
        }
        ctx.fs
            .mkdir(dest, MkdirOpts { recursive: true })
            .await
            .map_err(|e| e.to_string())?;
        let names = ctx.fs.readdir(src).await.map_err(|e| e.to_string())?;
        for name in names {
            let child_src = format!("{}/{}", src.trim_end_matches('/'), name);
            let child_dest = format!("{}/{}", dest.trim_end_matches('/'), name);
            Box::pin(copy_tree(ctx, &child_src, &child_dest, recursive)).await?;
        }
        return Ok(());
    }

    let bytes = ctx.fs.read_file_bytes(src).await.map_err(|e| e.to_string())?;
    ctx.fs.write_file(dest, &bytes).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx_with_fs;
    use crate::fs::{FileSystem, MemFs};
    use std::sync::Arc;

    #[tokio::test]
    async fn copies_file() {
        let fs = Arc::new(MemFs::new());
        fs.write_file("/a", b"data").await.unwrap();
        let r = CpCommand.execute(ctx_with_fs(vec!["/a", "/b"], fs.clone())).await;
        assert_eq!(r.exit_code, 0);
        assert_eq!(fs.read_file("/b").await.unwrap(), "data");
        assert!(fs.exists("/a").await);
    }

    #[tokio::test]
    async fn copies_tree_recursively() {
        let fs = Arc::new(MemFs::new());
        fs.mkdir("/src", MkdirOpts::default()).await.unwrap();
        fs.write_file("/src/f", b"x").await.unwrap();
        let r = CpCommand.execute(ctx_with_fs(vec!["-r", "/src", "/dst"], fs.clone())).await;
        assert_eq!(r.exit_code, 0);
        assert_eq!(fs.read_file("/dst/f").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn directory_without_r_fails() {
        let fs = Arc::new(MemFs::new());
        fs.mkdir("/src", MkdirOpts::default()).await.unwrap();
        let r = CpCommand.execute(ctx_with_fs(vec!["/src", "/dst"], fs)).await;
        assert_eq!(r.exit_code, 1);
    }
}
