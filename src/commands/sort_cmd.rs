//! `sort` with `-r`, `-n`, `-u`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct SortCommand;

#[async_trait]
impl Command for SortCommand {
    fn name(&self) -> &'static str {
        "sort"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut reverse = false;
        let mut numeric = false;
        let mut unique = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" => reverse = true,
                "-n" => numeric = true,
                "-u" => unique = true,
                "-rn" | "-nr" => {
                    reverse = true;
                    numeric = true;
                }
                _ => paths.push(arg.clone()),
            }
        }

        let input = match ctx.gather_input(&paths).await {
            Ok(i) => i,
            Err(mut e) => {
                e.stderr = format!("sort: {}", e.stderr);
                e.exit_code = 2;
                return e;
            }
        };

        let mut lines: Vec<&str> = input.lines().collect();
        if numeric {
            lines.sort_by(|a, b| {
                let na = leading_number(a);
                let nb = leading_number(b);
                na.partial_cmp(&nb).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.cmp(b))
            });
        } else {
            lines.sort();
        }
        if reverse {
            lines.reverse();
        }
        if unique {
            lines.dedup();
        }

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        CommandResult::success(out)
    }
}

fn leading_number(line: &str) -> f64 {
    let trimmed = line.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0.0)
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
    async fn lexicographic_sort() {
        let r = SortCommand.execute(with_stdin(vec![], "b\na\nc\n")).await;
        assert_eq!(r.stdout, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn numeric_sort() {
        let r = SortCommand.execute(with_stdin(vec!["-n"], "10\n2\n1\n")).await;
        assert_eq!(r.stdout, "1\n2\n10\n");
    }

    #[tokio::test]
    async fn reverse_and_unique() {
        let r = SortCommand.execute(with_stdin(vec!["-r"], "a\nc\nb\n")).await;
        assert_eq!(r.stdout, "c\nb\na\n");
        let r = SortCommand.execute(with_stdin(vec!["-u"], "b\na\nb\n")).await;
        assert_eq!(r.stdout, "a\nb\n");
    }
}
