//! `cut` with `-d`, `-f`, `-c`.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct CutCommand;

#[async_trait]
impl Command for CutCommand {
    fn name(&self) -> &'static str {
        "cut"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut delimiter = '\t';
        let mut fields: Option<Vec<(usize, usize)>> = None;
        let mut chars: Option<Vec<(usize, usize)>> = None;
        let mut paths = Vec::new();

        let mut i = 0;
        while i < ctx.args.len() {
            let arg = ctx.args[i].as_str();
            match arg {
                "-d" => {
                    let value = match ctx.args.get(i + 1) {
                        Some(v) => v,
                        None => return CommandResult::error("cut: option requires an argument -- d\n"),
                    };
                    delimiter = value.chars().next().unwrap_or('\t');
                    i += 2;
                }
                "-f" | "-c" => {
                    let value = match ctx.args.get(i + 1) {
                        Some(v) => v,
                        None => {
                            return CommandResult::error(format!(
                                "cut: option requires an argument -- {}\n",
                                &arg[1..]
                            ));
                        }
                    };
                    let ranges = match parse_ranges(value) {
                        Some(r) => r,
                        None => {
                            return CommandResult::error(format!(
                                "cut: invalid field list '{}'\n",
                                value
                            ));
                        }
                    };
                    if arg == "-f" {
                        fields = Some(ranges);
                    } else {
                        chars = Some(ranges);
                    }
                    i += 2;
                }
                _ if arg.starts_with("-d") => {
                    delimiter = arg[2..].chars().next().unwrap_or('\t');
                    i += 1;
                }
                _ if arg.starts_with("-f") || arg.starts_with("-c") => {
                    let ranges = match parse_ranges(&arg[2..]) {
                        Some(r) => r,
                        None => {
                            return CommandResult::error(format!(
                                "cut: invalid field list '{}'\n",
                                &arg[2..]
                            ));
                        }
                    };
                    if arg.starts_with("-f") {
                        fields = Some(ranges);
                    } else {
                        chars = Some(ranges);
                    }
                    i += 1;
                }
                _ => {
                    paths.push(ctx.args[i].clone());
                    i += 1;
                }
            }
        }

        if fields.is_none() && chars.is_none() {
            return CommandResult::error("cut: you must specify a list of bytes, characters, or fields\n");
        }

        let input = match ctx.gather_input(&paths).await {
            Ok(text) => text,
            Err(mut e) => {
                e.stderr = format!("cut: {}", e.stderr);
                return e;
            }
        };

        let mut out = String::new();
        for line in input.lines() {
            if let Some(ranges) = &chars {
                let cs: Vec<char> = line.chars().collect();
                for (a, b) in ranges {
                    for idx in *a..=(*b).min(cs.len()) {
                        if idx >= 1 {
                            out.push(cs[idx - 1]);
                        }
                    }
                }
                out.push('\n');
                continue;
            }

            let ranges = fields.as_ref().unwrap();
            if !line.contains(delimiter) {
                // Lines without the delimiter pass through whole.
                out.push_str(line);
                out.push('\n');
                continue;
            }
            let parts: Vec<&str> = line.split(delimiter).collect();
            let mut picked = Vec::new();
            for (a, b) in ranges {
                for idx in *a..=(*b).min(parts.len()) {
                    if idx >= 1 {
                        picked.push(parts[idx - 1]);
                    }
                }
            }
            out.push_str(&picked.join(&delimiter.to_string()));
            out.push('\n');
        }

        CommandResult::success(out)
    }
}

/// `1`, `1,3`, `2-4`, `3-` (open-ended).
fn parse_ranges(spec: &str) -> Option<Vec<(usize, usize)>> {
    let mut out = Vec::new();
    for part in spec.split(',') {
        if let Some((a, b)) = part.split_once('-') {
            let start: usize = a.parse().ok()?;
            let end: usize = if b.is_empty() { usize::MAX } else { b.parse().ok()? };
            out.push((start, end));
        } else {
            let n: usize = part.parse().ok()?;
            out.push((n, n));
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ctx;

    fn with_stdin(args: Vec<&str>, stdin: &str) -> CommandContext {
        let mut c = ctx(args);
        c.stdin = stdin.to_string();
        c
    }

    #[tokio::test]
    async fn fields_with_delimiter() {
        let r = CutCommand.execute(with_stdin(vec!["-d", ":", "-f", "1"], "a:b:c\n")).await;
        assert_eq!(r.stdout, "a\n");
    }

    #[tokio::test]
    async fn field_ranges() {
        let r = CutCommand.execute(with_stdin(vec!["-d", ":", "-f", "2-"], "a:b:c\n")).await;
        assert_eq!(r.stdout, "b:c\n");
    }

    #[tokio::test]
    async fn character_positions() {
        let r = CutCommand.execute(with_stdin(vec!["-c", "1-3"], "abcdef\n")).await;
        assert_eq!(r.stdout, "abc\n");
    }

    #[tokio::test]
    async fn line_without_delimiter_passes() {
        let r = CutCommand.execute(with_stdin(vec!["-d", ":", "-f", "2"], "nodelim\n")).await;
        assert_eq!(r.stdout, "nodelim\n");
    }
}
