//! `sleep`: validates its argument and returns immediately. Nothing in
//! the sandbox advances wall-clock time, so waiting would only burn the
//! caller's budget.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct SleepCommand;

#[async_trait]
impl Command for SleepCommand {
    fn name(&self) -> &'static str {
        "sleep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let arg = match ctx.args.first() {
            Some(a) => a,
            None => return CommandResult::error("sleep: missing operand\n"),
        };
        let trimmed = arg.trim_end_matches(['s', 'm', 'h', 'd']);
        if trimmed.parse::<f64>().is_err() {
            return CommandResult::error(format!("sleep: invalid time interval '{}'\n", arg));
        }
        CommandResult::success("")
    }
}
