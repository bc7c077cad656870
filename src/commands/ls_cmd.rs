//! `ls` with `-a` and `-1` (output is one-per-line either way; there is
//! no terminal width to wrap to).

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct LsCommand;

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut show_hidden = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-a" | "-A" => show_hidden = true,
                "-1" | "-la" | "-al" => {
                    if arg.contains('a') {
                        show_hidden = true;
                    }
                }
                _ if arg.starts_with('-') => {}
                _ => paths.push(arg.clone()),
            }
        }
        if paths.is_empty() {
            paths.push(".".to_string());
        }

        let mut out = String::new();
        let mut stderr = String::new();
        let mut status = 0;
        let label = paths.len() > 1;

        for (i, path) in paths.iter().enumerate() {
            let resolved = ctx.resolve(path);
            match ctx.fs.stat(&resolved).await {
                Ok(stat) if stat.is_directory => {
                    if label {
                        if i > 0 {
                            out.push('\n');
                        }
                        out.push_str(&format!("{}:\n", path));
                    }
                    match ctx.fs.readdir(&resolved).await {
                        Ok(names) => {
                            for name in names {
                                if !show_hidden && name.starts_with('.') {
                                    continue;
                                }
                                out.push_str(&name);
                                out.push('\n');
                            }
                        }
                        Err(e) => {
                            stderr.push_str(&format!("ls: {}\n", e));
                            status = 1;
                        }
                    }
                }
                Ok(_) => {
                    out.push_str(path);
                    out.push('\n');
                }
                Err(_) => {
                    stderr.push_str(&format!(
                        "ls: cannot access '{}': No such file or directory\n",
                        path
                    ));
                    status = 2;
                }
            }
        }

        CommandResult::with_exit_code(out, stderr, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx_with_fs;
    use crate::fs::{FileSystem, MemFs, MkdirOpts};
    use std::sync::Arc;

    async fn fixture() -> Arc<MemFs> {
        let fs = Arc::new(MemFs::new());
        fs.mkdir("/d", MkdirOpts::default()).await.unwrap();
        fs.write_file("/d/b.txt", b"").await.unwrap();
        fs.write_file("/d/a.txt", b"").await.unwrap();
        fs.write_file("/d/.hidden", b"").await.unwrap();
        fs
    }

    #[tokio::test]
    async fn lists_sorted_without_hidden() {
        let r = LsCommand.execute(ctx_with_fs(vec!["/d"], fixture().await)).await;
        assert_eq!(r.stdout, "a.txt\nb.txt\n");
    }

    #[tokio::test]
    async fn dash_a_shows_hidden() {
        let r = LsCommand.execute(ctx_with_fs(vec!["-a", "/d"], fixture().await)).await;
        assert_eq!(r.stdout, ".hidden\na.txt\nb.txt\n");
    }

    #[tokio::test]
    async fn missing_path_fails() {
        let r = LsCommand.execute(ctx_with_fs(vec!["/nope"], fixture().await)).await;
        assert_eq!(r.exit_code, 2);
    }
}
