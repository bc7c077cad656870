//! `wc` with `-l`, `-w`, `-c`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct WcCommand;

#[async_trait]
impl Command for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut show_lines = false;
        let mut show_words = false;
        let mut show_bytes = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-l" => show_lines = true,
                "-w" => show_words = true,
                "-c" | "-m" => show_bytes = true,
                _ => paths.push(arg.clone()),
            }
        }
        if !show_lines && !show_words && !show_bytes {
            show_lines = true;
            show_words = true;
            show_bytes = true;
        }

        let mut out = String::new();
        let mut totals = (0usize, 0usize, 0usize);
        let mut stderr = String::new();
        let mut status = 0;

        let mut count_one = |text: &str, label: Option<&str>, out: &mut String| {
            let lines = text.matches('\n').count();
            let words = text.split_whitespace().count();
            let bytes = text.len();
            totals.0 += lines;
            totals.1 += words;
            totals.2 += bytes;

            let mut cols = Vec::new();
            if show_lines {
                cols.push(lines.to_string());
            }
            if show_words {
                cols.push(words.to_string());
            }
            if show_bytes {
                cols.push(bytes.to_string());
            }
            match label {
                Some(name) => out.push_str(&format!("{} {}\n", cols.join(" "), name)),
                None => out.push_str(&format!("{}\n", cols.join(" "))),
            }
        };

        if paths.is_empty() {
            count_one(&ctx.stdin, None, &mut out);
        } else {
            for path in &paths {
                match ctx.fs.read_file(&ctx.resolve(path)).await {
                    Ok(text) => count_one(&text, Some(path), &mut out),
                    Err(e) => {
                        stderr.push_str(&format!("wc: {}\n", e));
                        status = 1;
                    }
                }
            }
        }

        CommandResult::with_exit_code(out, stderr, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn counts_lines() {
        let mut c = ctx(vec!["-l"]);
        c.stdin = "a\nb\nc\n".to_string();
        let r = WcCommand.execute(c).await;
        assert_eq!(r.stdout, "3\n");
    }

    #[tokio::test]
    async fn counts_words_and_bytes() {
        let mut c = ctx(vec![]);
        c.stdin = "one two\n".to_string();
        let r = WcCommand.execute(c).await;
        assert_eq!(r.stdout, "1 2 8\n");
    }
}
