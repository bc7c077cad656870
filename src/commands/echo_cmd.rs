//! `echo` with `-n`, `-e`, `-E`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut newline = true;
        let mut escapes = false;
        let mut start = 0;

        for arg in &ctx.args {
            match arg.as_str() {
                "-n" => newline = false,
                "-e" => escapes = true,
                "-E" => escapes = false,
                "-ne" | "-en" => {
                    newline = false;
                    escapes = true;
                }
                _ => break,
            }
            start += 1;
        }

        let mut output = ctx.args[start..].join(" ");
        if escapes {
            let (decoded, stop) = decode_escapes(&output);
            output = decoded;
            if stop {
                return CommandResult::success(output);
            }
        }
        if newline {
            output.push('\n');
        }
        CommandResult::success(output)
    }
}

/// `echo -e` escape handling; `\c` truncates output and suppresses the
/// trailing newline.
fn decode_escapes(input: &str) -> (String, bool) {
    let mut out = String::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars[i + 1] {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'e' | 'E' => out.push('\x1b'),
            '\\' => out.push('\\'),
            'c' => return (out, true),
            '0' => {
                let mut code = 0u32;
                let mut j = i + 2;
                while j < chars.len() && j < i + 5 && chars[j].is_digit(8) {
                    code = code * 8 + chars[j].to_digit(8).unwrap();
                    j += 1;
                }
                if let Some(c) = char::from_u32(code % 256) {
                    out.push(c);
                }
                i = j;
                continue;
            }
            'x' => {
                let mut code = 0u32;
                let mut j = i + 2;
                while j < chars.len() && j < i + 4 && chars[j].is_ascii_hexdigit() {
                    code = code * 16 + chars[j].to_digit(16).unwrap();
                    j += 1;
                }
                if j == i + 2 {
                    out.push_str("\\x");
                } else if let Some(c) = char::from_u32(code) {
                    out.push(c);
                }
                i = j;
                continue;
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        i += 2;
    }
    (out, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn plain_output() {
        let r = EchoCommand.execute(ctx(vec!["hello", "world"])).await;
        assert_eq!(r.stdout, "hello world\n");
    }

    #[tokio::test]
    async fn no_args_prints_newline() {
        let r = EchoCommand.execute(ctx(vec![])).await;
        assert_eq!(r.stdout, "\n");
    }

    #[tokio::test]
    async fn n_suppresses_newline() {
        let r = EchoCommand.execute(ctx(vec!["-n", "x"])).await;
        assert_eq!(r.stdout, "x");
    }

    #[tokio::test]
    async fn e_decodes_escapes() {
        let r = EchoCommand.execute(ctx(vec!["-e", "a\\tb\\nc"])).await;
        assert_eq!(r.stdout, "a\tb\nc\n");
    }

    #[tokio::test]
    async fn c_escape_stops_output() {
        let r = EchoCommand.execute(ctx(vec!["-e", "a\\cb"])).await;
        assert_eq!(r.stdout, "a");
    }

    #[tokio::test]
    async fn hex_and_octal() {
        let r = EchoCommand.execute(ctx(vec!["-e", "\\x41\\0102"])).await;
        assert_eq!(r.stdout, "AB\n");
    }
}
