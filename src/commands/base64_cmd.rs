//! `base64` encode/decode.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct Base64Command;

#[async_trait]
impl Command for Base64Command {
    fn name(&self) -> &'static str {
        "base64"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut decode = false;
        let mut paths = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-d" | "--decode" => decode = true,
                _ => paths.push(arg.clone()),
            }
        }

        let input = match ctx.gather_input(&paths).await {
            Ok(i) => i,
            Err(mut e) => {
                e.stderr = format!("base64: {}", e.stderr);
                return e;
            }
        };

        if decode {
            let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
            match STANDARD.decode(stripped.as_bytes()) {
                Ok(bytes) => CommandResult::success(String::from_utf8_lossy(&bytes).into_owned()),
                Err(_) => CommandResult::error("base64: invalid input\n"),
            }
        } else {
            CommandResult::success(format!("{}\n", STANDARD.encode(input.as_bytes())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn encode_and_decode_roundtrip() {
        let mut c = ctx(vec![]);
        c.stdin = "Hello, World!".to_string();
        let r = Base64Command.execute(c).await;
        assert_eq!(r.stdout, "SGVsbG8sIFdvcmxkIQ==\n");

        let mut c = ctx(vec!["-d"]);
        c.stdin = "SGVsbG8sIFdvcmxkIQ==\n".to_string();
        let r = Base64Command.execute(c).await;
        assert_eq!(r.stdout, "Hello, World!");
    }

    #[tokio::test]
    async fn invalid_decode_fails() {
        let mut c = ctx(vec!["-d"]);
        c.stdin = "!!!not base64!!!".to_string();
        let r = Base64Command.execute(c).await;
        assert_eq!(r.exit_code, 1);
    }
}
