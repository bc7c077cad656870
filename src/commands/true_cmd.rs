use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TrueCommand;

#[async_trait]
impl Command for TrueCommand {
    fn name(&self) -> &'static str {
        "true"
    }

    async fn execute(&self, _ctx: CommandContext) -> CommandResult {
        CommandResult::success("")
    }
}
