//! `seq`: 1-3 numeric arguments, as in coreutils.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct SeqCommand;

#[async_trait]
impl Command for SeqCommand {
    fn name(&self) -> &'static str {
        "seq"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let nums: Result<Vec<i64>, _> = ctx.args.iter().map(|a| a.parse::<i64>()).collect();
        let nums = match nums {
            Ok(n) if !n.is_empty() && n.len() <= 3 => n,
            _ => return CommandResult::error("seq: usage: seq [first [increment]] last\n"),
        };

        let (first, step, last) = match nums.len() {
            1 => (1, 1, nums[0]),
            2 => (nums[0], 1, nums[1]),
            _ => (nums[0], nums[1], nums[2]),
        };
        if step == 0 {
            return CommandResult::error("seq: increment must not be 0\n");
        }

        let mut out = String::new();
        let mut n = first;
        if step > 0 {
            while n <= last {
                out.push_str(&format!("{}\n", n));
                n += step;
            }
        } else {
            while n >= last {
                out.push_str(&format!("{}\n", n));
                n += step;
            }
        }
        CommandResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn single_arg_counts_from_one() {
        let r = SeqCommand.execute(ctx(vec!["3"])).await;
        assert_eq!(r.stdout, "1\n2\n3\n");
    }

    #[tokio::test]
    async fn three_args_with_step() {
        let r = SeqCommand.execute(ctx(vec!["0", "2", "6"])).await;
        assert_eq!(r.stdout, "0\n2\n4\n6\n");
    }

    #[tokio::test]
    async fn descending() {
        let r = SeqCommand.execute(ctx(vec!["3", "-1", "1"])).await;
        assert_eq!(r.stdout, "3\n2\n1\n");
    }

    #[tokio::test]
    async fn empty_when_out_of_range() {
        let r = SeqCommand.execute(ctx(vec!["5", "1"])).await;
        assert_eq!(r.stdout, "");
    }
}
