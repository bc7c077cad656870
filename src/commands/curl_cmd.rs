//! `curl`: the HTTP surface of the sandbox.
//!
//! Requests go through the host-supplied client; every URL is checked
//! against the network allow-list first. Supports `-s`, `-X`, `-H`,
//! `-d`, `-o`, `-i`.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::commands::{Command, CommandContext, CommandResult};
use crate::network::{host_allowed, HttpRequest};

pub struct CurlCommand;

#[async_trait]
impl Command for CurlCommand {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut method = "GET".to_string();
        let mut headers: HashMap<String, String> = HashMap::new();
        let mut body: Option<String> = None;
        let mut output: Option<String> = None;
        let mut include_headers = false;
        let mut url: Option<String> = None;

        let mut i = 0;
        while i < ctx.args.len() {
            let arg = ctx.args[i].as_str();
            match arg {
                "-s" | "--silent" | "-S" | "-L" | "-f" => {}
                "-i" | "--include" => include_headers = true,
                "-X" | "--request" => {
                    i += 1;
                    method = match ctx.args.get(i) {
                        Some(m) => m.to_uppercase(),
                        None => return usage("option -X requires an argument"),
                    };
                }
                "-H" | "--header" => {
                    i += 1;
                    let header = match ctx.args.get(i) {
                        Some(h) => h,
                        None => return usage("option -H requires an argument"),
                    };
                    if let Some((name, value)) = header.split_once(':') {
                        headers.insert(name.trim().to_string(), value.trim().to_string());
                    }
                }
                "-d" | "--data" => {
                    i += 1;
                    body = match ctx.args.get(i) {
                        Some(d) => Some(d.clone()),
                        None => return usage("option -d requires an argument"),
                    };
                    if method == "GET" {
                        method = "POST".to_string();
                    }
                }
                "-o" | "--output" => {
                    i += 1;
                    output = match ctx.args.get(i) {
                        Some(o) => Some(o.clone()),
                        None => return usage("option -o requires an argument"),
                    };
                }
                _ if !arg.starts_with('-') => url = Some(arg.to_string()),
                _ => {}
            }
            i += 1;
        }

        let url = match url {
            Some(u) => u,
            None => return usage("no URL specified"),
        };

        if !ctx.network.enabled {
            return CommandResult::with_exit_code(
                String::new(),
                "curl: network access is disabled in this sandbox\n".to_string(),
                7,
            );
        }
        if !host_allowed(&url, &ctx.network.allow_list) {
            return CommandResult::with_exit_code(
                String::new(),
                format!("curl: URL not in allow-list: {}\n", url),
                7,
            );
        }
        let client = match &ctx.http {
            Some(c) => c.clone(),
            None => {
                return CommandResult::with_exit_code(
                    String::new(),
                    "curl: no HTTP client configured\n".to_string(),
                    7,
                );
            }
        };

        let response = client
            .request(HttpRequest { method, url: url.clone(), headers, body })
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return CommandResult::with_exit_code(
                    String::new(),
                    format!("curl: (6) {}\n", e),
                    6,
                );
            }
        };

        let mut text = String::new();
        if include_headers {
            text.push_str(&format!("HTTP/1.1 {}\r\n", response.status));
            let mut names: Vec<&String> = response.headers.keys().collect();
            names.sort();
            for name in names {
                text.push_str(&format!("{}: {}\r\n", name, response.headers[name]));
            }
            text.push_str("\r\n");
        }
        text.push_str(&response.body);

        if let Some(path) = output {
            let resolved = ctx.resolve(&path);
            if let Err(e) = ctx.fs.write_file(&resolved, text.as_bytes()).await {
                return CommandResult::error(format!("curl: {}\n", e));
            }
            return CommandResult::success("");
        }

        let status = if response.status >= 400 { 22 } else { 0 };
        CommandResult::with_exit_code(text, String::new(), status)
    }
}

fn usage(message: &str) -> CommandResult {
    CommandResult::with_exit_code(String::new(), format!("curl: {}\n", message), 2)
}
