//! `head` with `-n` and `-c`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct HeadCommand;

#[async_trait]
impl Command for HeadCommand {
    fn name(&self) -> &'static str {
        "head"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let (lines, bytes, paths) = match parse_count_args(&ctx.args, "head") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let input = match ctx.gather_input(&paths).await {
            Ok(i) => i,
            Err(e) => return e,
        };

        if let Some(n) = bytes {
            let taken: String = input.chars().take(n).collect();
            return CommandResult::success(taken);
        }

        let n = lines.unwrap_or(10);
        let out: String = input.split_inclusive('\n').take(n).collect();
        CommandResult::success(out)
    }
}

/// Shared `-n N` / `-c N` / `-N` parsing for head and tail.
#[allow(clippy::type_complexity)]
pub(crate) fn parse_count_args(
    args: &[String],
    tool: &str,
) -> Result<(Option<usize>, Option<usize>, Vec<String>), CommandResult> {
    let mut lines = None;
    let mut bytes = None;
    let mut paths = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-n" | "-c" => {
                let value = args.get(i + 1).ok_or_else(|| {
                    CommandResult::error(format!("{}: option requires an argument -- {}\n", tool, &arg[1..]))
                })?;
                let n: usize = value.parse().map_err(|_| {
                    CommandResult::error(format!("{}: invalid number of lines: '{}'\n", tool, value))
                })?;
                if arg == "-n" {
                    lines = Some(n);
                } else {
                    bytes = Some(n);
                }
                i += 2;
            }
            _ if arg.starts_with('-') && arg.len() > 1 && arg[1..].chars().all(|c| c.is_ascii_digit()) => {
                lines = Some(arg[1..].parse().unwrap_or(10));
                i += 1;
            }
            _ => {
                paths.push(args[i].clone());
                i += 1;
            }
        }
    }
    Ok((lines, bytes, paths))
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
    async fn default_ten_lines() {
        let input: String = (1..=15).map(|i| format!("{}\n", i)).collect();
        let r = HeadCommand.execute(with_stdin(vec![], &input)).await;
        assert_eq!(r.stdout.lines().count(), 10);
        assert!(r.stdout.starts_with("1\n"));
    }

    #[tokio::test]
    async fn n_limits_lines() {
        let r = HeadCommand.execute(with_stdin(vec!["-n", "2"], "a\nb\nc\n")).await;
        assert_eq!(r.stdout, "a\nb\n");
    }

    #[tokio::test]
    async fn dash_number_shorthand() {
        let r = HeadCommand.execute(with_stdin(vec!["-1"], "a\nb\n")).await;
        assert_eq!(r.stdout, "a\n");
    }

    #[tokio::test]
    async fn c_limits_bytes() {
        let r = HeadCommand.execute(with_stdin(vec!["-c", "3"], "abcdef")).await;
        assert_eq!(r.stdout, "abc");
    }
}
