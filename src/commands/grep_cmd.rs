//! `grep` with `-i -v -n -c -q -E -F` over regex-lite.

use async_trait::async_trait;
use regex_lite::RegexBuilder;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct GrepCommand;

#[async_trait]
impl Command for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut ignore_case = false;
        let mut invert = false;
        let mut line_numbers = false;
        let mut count_only = false;
        let mut quiet = false;
        let mut fixed = false;
        let mut rest = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-i" => ignore_case = true,
                "-v" => invert = true,
                "-n" => line_numbers = true,
                "-c" => count_only = true,
                "-q" => quiet = true,
                "-F" => fixed = true,
                "-E" => {} // the engine is "extended" already
                _ if arg.starts_with('-') && arg.len() > 1 => {
                    return CommandResult::with_exit_code(
                        String::new(),
                        format!("grep: invalid option -- '{}'\n", &arg[1..]),
                        2,
                    );
                }
                _ => rest.push(arg.clone()),
            }
        }

        let pattern = match rest.first() {
            Some(p) => p.clone(),
            None => {
                return CommandResult::with_exit_code(
                    String::new(),
                    "usage: grep [-ivncqEF] pattern [file ...]\n".to_string(),
                    2,
                );
            }
        };
        let paths = rest[1..].to_vec();

        let regex_text = if fixed { regex_escape(&pattern) } else { pattern.clone() };
        let re = match RegexBuilder::new(&regex_text).case_insensitive(ignore_case).build() {
            Ok(re) => re,
            Err(_) => {
                return CommandResult::with_exit_code(
                    String::new(),
                    format!("grep: invalid pattern '{}'\n", pattern),
                    2,
                );
            }
        };

        let input = match ctx.gather_input(&paths).await {
            Ok(i) => i,
            Err(mut e) => {
                e.stderr = format!("grep: {}", e.stderr);
                e.exit_code = 2;
                return e;
            }
        };

        let label = paths.len() > 1;
        let mut out = String::new();
        let mut matched = 0usize;

        // With multiple files every match is prefixed by its file; we
        // re-read per file for that case.
        if label {
            let mut any = false;
            for path in &paths {
                let text = ctx.fs.read_file(&ctx.resolve(path)).await.unwrap_or_default();
                for (i, line) in text.lines().enumerate() {
                    if re.is_match(line) != invert {
                        any = true;
                        matched += 1;
                        if line_numbers {
                            out.push_str(&format!("{}:{}:{}\n", path, i + 1, line));
                        } else {
                            out.push_str(&format!("{}:{}\n", path, line));
                        }
                    }
                }
            }
            return finish(out, matched, any, count_only, quiet);
        }

        let mut any = false;
        for (i, line) in input.lines().enumerate() {
            if re.is_match(line) != invert {
                any = true;
                matched += 1;
                if line_numbers {
                    out.push_str(&format!("{}:{}\n", i + 1, line));
                } else {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        finish(out, matched, any, count_only, quiet)
    }
}

fn finish(out: String, matched: usize, any: bool, count_only: bool, quiet: bool) -> CommandResult {
    let status = if any { 0 } else { 1 };
    if quiet {
        return CommandResult::with_exit_code(String::new(), String::new(), status);
    }
    if count_only {
        return CommandResult::with_exit_code(format!("{}\n", matched), String::new(), status);
    }
    CommandResult::with_exit_code(out, String::new(), status)
}

fn regex_escape(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
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
    async fn matches_lines() {
        let r = GrepCommand.execute(with_stdin(vec!["b"], "abc\nxyz\nbcd\n")).await;
        assert_eq!(r.stdout, "abc\nbcd\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn no_match_status_one() {
        let r = GrepCommand.execute(with_stdin(vec!["zz"], "abc\n")).await;
        assert_eq!(r.exit_code, 1);
        assert_eq!(r.stdout, "");
    }

    #[tokio::test]
    async fn invert_and_count() {
        let r = GrepCommand.execute(with_stdin(vec!["-v", "a"], "ab\ncd\n")).await;
        assert_eq!(r.stdout, "cd\n");
        let r = GrepCommand.execute(with_stdin(vec!["-c", "a"], "ab\nac\nxx\n")).await;
        assert_eq!(r.stdout, "2\n");
    }

    #[tokio::test]
    async fn case_insensitive() {
        let r = GrepCommand.execute(with_stdin(vec!["-i", "HELLO"], "hello world\n")).await;
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn quiet_mode() {
        let r = GrepCommand.execute(with_stdin(vec!["-q", "a"], "abc\n")).await;
        assert_eq!(r.stdout, "");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn line_numbers() {
        let r = GrepCommand.execute(with_stdin(vec!["-n", "b"], "a\nb\n")).await;
        assert_eq!(r.stdout, "2:b\n");
    }

    #[tokio::test]
    async fn fixed_strings() {
        let r = GrepCommand.execute(with_stdin(vec!["-F", "a.b"], "a.b\naxb\n")).await;
        assert_eq!(r.stdout, "a.b\n");
    }
}
