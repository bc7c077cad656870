//! `tr`: character translation, `-d` deletion, `-s` squeezing.

use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TrCommand;

#[async_trait]
impl Command for TrCommand {
    fn name(&self) -> &'static str {
        "tr"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut delete = false;
        let mut squeeze = false;
        let mut sets = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-d" => delete = true,
                "-s" => squeeze = true,
                "-ds" | "-sd" => {
                    delete = true;
                    squeeze = true;
                }
                _ => sets.push(arg.clone()),
            }
        }

        let set1 = match sets.first() {
            Some(s) => expand_set(s),
            None => return CommandResult::error("tr: missing operand\n"),
        };

        let mut out = String::new();
        if delete {
            for c in ctx.stdin.chars() {
                if !set1.contains(&c) {
                    out.push(c);
                }
            }
        } else {
            let set2 = match sets.get(1) {
                Some(s) => expand_set(s),
                None => return CommandResult::error("tr: missing operand after set 1\n"),
            };
            for c in ctx.stdin.chars() {
                match set1.iter().position(|&x| x == c) {
                    Some(i) => {
                        // Set 2 extends with its final character.
                        let mapped = set2.get(i).or_else(|| set2.last());
                        if let Some(&m) = mapped {
                            out.push(m);
                        }
                    }
                    None => out.push(c),
                }
            }
        }

        if squeeze {
            let target: Vec<char> = if delete {
                set1.clone()
            } else {
                expand_set(sets.get(1).map(|s| s.as_str()).unwrap_or(""))
            };
            let mut squeezed = String::new();
            let mut prev: Option<char> = None;
            for c in out.chars() {
                if Some(c) == prev && target.contains(&c) {
                    continue;
                }
                squeezed.push(c);
                prev = Some(c);
            }
            out = squeezed;
        }

        CommandResult::success(out)
    }
}

/// `a-z` ranges and the common character classes.
fn expand_set(spec: &str) -> Vec<char> {
    match spec {
        "[:lower:]" => return ('a'..='z').collect(),
        "[:upper:]" => return ('A'..='Z').collect(),
        "[:digit:]" => return ('0'..='9').collect(),
        "[:space:]" => return vec![' ', '\t', '\n', '\r', '\x0b', '\x0c'],
        "[:alnum:]" => {
            let mut v: Vec<char> = ('0'..='9').collect();
            v.extend('A'..='Z');
            v.extend('a'..='z');
            return v;
        }
        _ => {}
    }

    let chars: Vec<char> = spec.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            out.push(match chars[i + 1] {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
            i += 2;
            continue;
        }
        if i + 2 < chars.len() && chars[i + 1] == '-' {
            let (a, b) = (chars[i], chars[i + 2]);
            if a <= b {
                out.extend((a..=b).collect::<Vec<char>>());
                i += 3;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
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
    async fn translate_ranges() {
        let r = TrCommand.execute(with_stdin(vec!["a-z", "A-Z"], "hello")).await;
        assert_eq!(r.stdout, "HELLO");
    }

    #[tokio::test]
    async fn character_classes() {
        let r = TrCommand.execute(with_stdin(vec!["[:lower:]", "[:upper:]"], "abc")).await;
        assert_eq!(r.stdout, "ABC");
    }

    #[tokio::test]
    async fn delete_set() {
        let r = TrCommand.execute(with_stdin(vec!["-d", "aeiou"], "education")).await;
        assert_eq!(r.stdout, "dctn");
    }

    #[tokio::test]
    async fn squeeze_repeats() {
        let r = TrCommand.execute(with_stdin(vec!["-s", "a", "a"], "aaabaa")).await;
        assert_eq!(r.stdout, "aba");
    }
}
