//! `printf`: the directives scripts actually use — %s %d %i %x %o %c %%
//! with width/zero-pad flags, plus backslash escapes. The format string
//! is reapplied until the arguments run out, as POSIX requires.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct PrintfCommand;

#[async_trait]
impl Command for PrintfCommand {
    fn name(&self) -> &'static str {
        "printf"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let format = match ctx.args.first() {
            Some(f) => f.clone(),
            None => return CommandResult::error("printf: usage: printf format [arguments]\n"),
        };
        let mut args = ctx.args[1..].iter();
        let mut out = String::new();

        loop {
            let mut consumed_any = false;
            let chars: Vec<char> = format.chars().collect();
            let mut i = 0;

            while i < chars.len() {
                match chars[i] {
                    '\\' if i + 1 < chars.len() => {
                        match chars[i + 1] {
                            'n' => out.push('\n'),
                            't' => out.push('\t'),
                            'r' => out.push('\r'),
                            '\\' => out.push('\\'),
                            'a' => out.push('\x07'),
                            '0' => out.push('\0'),
                            other => {
                                out.push('\\');
                                out.push(other);
                            }
                        }
                        i += 2;
                    }
                    '%' if i + 1 < chars.len() && chars[i + 1] == '%' => {
                        out.push('%');
                        i += 2;
                    }
                    '%' => {
                        // %[-][0][width]conv
                        let mut j = i + 1;
                        let mut left = false;
                        let mut zero = false;
                        if chars.get(j) == Some(&'-') {
                            left = true;
                            j += 1;
                        }
                        if chars.get(j) == Some(&'0') {
                            zero = true;
                            j += 1;
                        }
                        let width_start = j;
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        let width: usize = chars[width_start..j]
                            .iter()
                            .collect::<String>()
                            .parse()
                            .unwrap_or(0);
                        let conv = match chars.get(j) {
                            Some(c) => *c,
                            None => {
                                out.push('%');
                                break;
                            }
                        };

                        let arg = args.next();
                        if arg.is_some() {
                            consumed_any = true;
                        }
                        let arg = arg.map(|s| s.as_str()).unwrap_or("");

                        let rendered = match conv {
                            's' => arg.to_string(),
                            'd' | 'i' => int_arg(arg).to_string(),
                            'x' => format!("{:x}", int_arg(arg)),
                            'X' => format!("{:X}", int_arg(arg)),
                            'o' => format!("{:o}", int_arg(arg)),
                            'c' => arg.chars().next().map(|c| c.to_string()).unwrap_or_default(),
                            'b' => {
                                let (decoded, _) = decode_percent_b(arg);
                                decoded
                            }
                            other => {
                                return CommandResult::error(format!(
                                    "printf: %{}: invalid directive\n",
                                    other
                                ));
                            }
                        };

                        out.push_str(&pad(&rendered, width, left, zero && !left));
                        i = j + 1;
                    }
                    c => {
                        out.push(c);
                        i += 1;
                    }
                }
            }

            // Reapply the format while arguments remain.
            if !consumed_any || args.len() == 0 {
                break;
            }
        }

        CommandResult::success(out)
    }
}

fn int_arg(text: &str) -> i64 {
    let t = text.trim();
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).unwrap_or(0);
    }
    t.parse().unwrap_or(0)
}

fn pad(text: &str, width: usize, left: bool, zero: bool) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let fill = if zero { '0' } else { ' ' };
    let padding: String = std::iter::repeat(fill).take(width - len).collect();
    if left {
        format!("{}{}", text, padding)
    } else if zero && text.starts_with('-') {
        format!("-{}{}", padding, &text[1..])
    } else {
        format!("{}{}", padding, text)
    }
}

fn decode_percent_b(text: &str) -> (String, bool) {
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('c') => return (out, true),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    (out, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    #[tokio::test]
    async fn string_and_int() {
        let r = PrintfCommand.execute(ctx(vec!["%s=%d\n", "n", "42"])).await;
        assert_eq!(r.stdout, "n=42\n");
    }

    #[tokio::test]
    async fn format_reapplies() {
        let r = PrintfCommand.execute(ctx(vec!["%s\n", "a", "b", "c"])).await;
        assert_eq!(r.stdout, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn width_and_zero_pad() {
        let r = PrintfCommand.execute(ctx(vec!["%5d|%-5s|%05d", "42", "ab", "7"])).await;
        assert_eq!(r.stdout, "   42|ab   |00007");
    }

    #[tokio::test]
    async fn hex_and_octal() {
        let r = PrintfCommand.execute(ctx(vec!["%x %o", "255", "8"])).await;
        assert_eq!(r.stdout, "ff 10");
    }

    #[tokio::test]
    async fn percent_literal() {
        let r = PrintfCommand.execute(ctx(vec!["100%%"])).await;
        assert_eq!(r.stdout, "100%");
    }

    #[tokio::test]
    async fn missing_args_become_empty() {
        let r = PrintfCommand.execute(ctx(vec!["[%s][%d]"])).await;
        assert_eq!(r.stdout, "[][0]");
    }
}
