//! `date` over chrono, with the `+FORMAT` strftime subset.

use async_trait::async_trait;
use chrono::Utc;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct DateCommand;

#[async_trait]
impl Command for DateCommand {
    fn name(&self) -> &'static str {
        "date"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let now = Utc::now();

        let format = ctx.args.iter().find(|a| a.starts_with('+'));
        let utc_flag = ctx.args.iter().any(|a| a == "-u" || a == "--utc");
        let _ = utc_flag; // the sandbox clock is always UTC

        let out = match format {
            Some(spec) => {
                let fmt = &spec[1..];
                if fmt == "%s" {
                    now.timestamp().to_string()
                } else {
                    // Validate up front: chrono's Display panics on bad
                    // format items.
                    use chrono::format::{Item, StrftimeItems};
                    let items: Vec<Item> = StrftimeItems::new(fmt).collect();
                    if items.iter().any(|i| matches!(i, Item::Error)) {
                        return CommandResult::error(format!(
                            "date: invalid format '{}'\n",
                            fmt
                        ));
                    }
                    now.format_with_items(items.into_iter()).to_string()
                }
            }
            None => now.format("%a %b %e %H:%M:%S UTC %Y").to_string(),
        };
        CommandResult::success(format!("{}\n", out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn iso_format() {
        let r = DateCommand.execute(ctx(vec!["+%Y-%m-%d"])).await;
        let line = r.stdout.trim();
        assert_eq!(line.len(), 10);
        assert_eq!(line.chars().filter(|c| *c == '-').count(), 2);
    }

    #[tokio::test]
    async fn epoch_seconds() {
        let r = DateCommand.execute(ctx(vec!["+%s"])).await;
        assert!(r.stdout.trim().parse::<i64>().unwrap() > 1_500_000_000);
    }
}
