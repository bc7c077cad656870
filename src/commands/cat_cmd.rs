//! `cat` with `-n`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct CatCommand;

#[async_trait]
impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut number = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-n" => number = true,
                _ => paths.push(arg.clone()),
            }
        }

        let mut out = String::new();
        let mut status = 0;
        let mut stderr = String::new();

        if paths.is_empty() {
            out.push_str(&ctx.stdin);
        } else {
            for path in &paths {
                if path == "-" {
                    out.push_str(&ctx.stdin);
                    continue;
                }
                match ctx.fs.read_file(&ctx.resolve(path)).await {
                    Ok(text) => out.push_str(&text),
                    Err(e) => {
                        stderr.push_str(&format!("cat: {}\n", e));
                        status = 1;
                    }
                }
            }
        }

        if number {
            let mut numbered = String::new();
            for (i, line) in out.split_inclusive('\n').enumerate() {
                numbered.push_str(&format!("{:6}\t{}", i + 1, line));
            }
            out = numbered;
        }

        CommandResult::with_exit_code(out, stderr, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{ctx, ctx_with_fs};
    use crate::fs::{FileSystem, MemFs};
    use std::sync::Arc;

    #[tokio::test]
    async fn reads_files_in_order() {
        let fs = Arc::new(MemFs::new());
        fs.write_file("/a", b"one\n").await.unwrap();
        fs.write_file("/b", b"two\n").await.unwrap();
        let r = CatCommand.execute(ctx_with_fs(vec!["/a", "/b"], fs)).await;
        assert_eq!(r.stdout, "one\ntwo\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn missing_file_reports_and_fails() {
        let r = CatCommand.execute(ctx(vec!["nonexistent"])).await;
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("No such file or directory"));
        assert_eq!(r.stdout, "");
    }

    #[tokio::test]
    async fn no_args_reads_stdin() {
        let mut c = ctx(vec![]);
        c.stdin = "from stdin".to_string();
        let r = CatCommand.execute(c).await;
        assert_eq!(r.stdout, "from stdin");
    }

    #[tokio::test]
    async fn numbering() {
        let mut c = ctx(vec!["-n"]);
        c.stdin = "a\nb\n".to_string();
        let r = CatCommand.execute(c).await;
        assert_eq!(r.stdout, "     1\ta\n     2\tb\n");
    }
}
