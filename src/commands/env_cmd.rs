//! `env`: print the environment, sorted for determinism.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct EnvCommand;

#[async_trait]
impl Command for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut names: Vec<&String> = ctx
            .env
            .keys()
            .filter(|k| k.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false))
            .collect();
        names.sort();
        let mut out = String::new();
        for name in names {
            out.push_str(&format!("{}={}\n", name, ctx.env[name]));
        }
        CommandResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn prints_sorted_env() {
        let mut c = ctx(vec![]);
        c.env.insert("B".to_string(), "2".to_string());
        c.env.insert("A".to_string(), "1".to_string());
        c.env.insert("?".to_string(), "0".to_string());
        let r = EnvCommand.execute(c).await;
        assert_eq!(r.stdout, "A=1\nB=2\n");
    }
}
