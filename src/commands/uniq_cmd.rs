//! `uniq` with `-c`, `-d`, `-u`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct UniqCommand;

#[async_trait]
impl Command for UniqCommand {
    fn name(&self) -> &'static str {
        "uniq"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut count = false;
        let mut dupes_only = false;
        let mut unique_only = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-c" => count = true,
                "-d" => dupes_only = true,
                "-u" => unique_only = true,
                _ => paths.push(arg.clone()),
            }
        }

        let input = match ctx.gather_input(&paths).await {
            Ok(i) => i,
            Err(mut e) => {
                e.stderr = format!("uniq: {}", e.stderr);
                return e;
            }
        };

        let mut groups: Vec<(usize, &str)> = Vec::new();
        for line in input.lines() {
            match groups.last_mut() {
                Some((n, prev)) if *prev == line => *n += 1,
                _ => groups.push((1, line)),
            }
        }

        let mut out = String::new();
        for (n, line) in groups {
            if dupes_only && n < 2 {
                continue;
            }
            if unique_only && n > 1 {
                continue;
            }
            if count {
                out.push_str(&format!("{:7} {}\n", n, line));
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        CommandResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    fn with_stdin(args: Vec<&str>, stdin: &str) -> CommandContext {
        let mut c = ctx(args);
        c.stdin = stdin.to_string();
        c
    }

    #[tokio::test]
    async fn collapses_adjacent() {
        let r = UniqCommand.execute(with_stdin(vec![], "a\na\nb\na\n")).await;
        assert_eq!(r.stdout, "a\nb\na\n");
    }

    #[tokio::test]
    async fn counts() {
        let r = UniqCommand.execute(with_stdin(vec!["-c"], "a\na\nb\n")).await;
        assert_eq!(r.stdout, "      2 a\n      1 b\n");
    }

    #[tokio::test]
    async fn dupes_and_uniques() {
        let r = UniqCommand.execute(with_stdin(vec!["-d"], "a\na\nb\n")).await;
        assert_eq!(r.stdout, "a\n");
        let r = UniqCommand.execute(with_stdin(vec!["-u"], "a\na\nb\n")).await;
        assert_eq!(r.stdout, "b\n");
    }
}
