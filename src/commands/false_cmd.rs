use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct FalseCommand;

#[async_trait]
impl Command for FalseCommand {
    fn name(&self) -> &'static str {
        "false"
    }

    async fn execute(&self, _ctx: CommandContext) -> CommandResult {
        CommandResult::with_exit_code(String::new(), String::new(), 1)
    }
}
