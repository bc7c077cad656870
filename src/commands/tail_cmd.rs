//! `tail` with `-n` and `-c`.

use async_trait::async_trait;
use crate::commands::head_cmd::parse_count_args;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TailCommand;

#[async_trait]
impl Command for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let (lines, bytes, paths) = match parse_count_args(&ctx.args, "tail") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let input = match ctx.gather_input(&paths).await {
            Ok(i) => i,
            Err(e) => return e,
        };

        if let Some(n) = bytes {
            let chars: Vec<char> = input.chars().collect();
            let start = chars.len().saturating_sub(n);
            return CommandResult::success(chars[start..].iter().collect::<String>());
        }

        let n = lines.unwrap_or(10);
        let all: Vec<&str> = input.split_inclusive('\n').collect();
        let start = all.len().saturating_sub(n);
        CommandResult::success(all[start..].concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn last_lines() {
        let mut c = ctx(vec!["-n", "2"]);
        c.stdin = "a\nb\nc\n".to_string();
        let r = TailCommand.execute(c).await;
        assert_eq!(r.stdout, "b\nc\n");
    }

    #[tokio::test]
    async fn last_bytes() {
        let mut c = ctx(vec!["-c", "2"]);
        c.stdin = "abcdef".to_string();
        let r = TailCommand.execute(c).await;
        assert_eq!(r.stdout, "ef");
    }
}
