//! Utility command catalogue.
//!
//! Everything here runs behind the [`Command`] trait: argv in, streams
//! out, filesystem and HTTP access only through the handles in the
//! context. The interpreter resolves names against the registry after
//! functions and shell builtins.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::fs::{self, FileSystem};
use crate::network::{HttpClient, NetworkConfig};

mod base64_cmd;
mod basename_cmd;
mod cat_cmd;
mod cp_cmd;
mod curl_cmd;
mod cut_cmd;
mod date_cmd;
mod dirname_cmd;
mod echo_cmd;
mod env_cmd;
mod false_cmd;
mod grep_cmd;
mod head_cmd;
mod ls_cmd;
mod mkdir_cmd;
mod mv_cmd;
mod printf_cmd;
mod pwd_cmd;
mod rm_cmd;
mod rmdir_cmd;
mod seq_cmd;
mod sleep_cmd;
mod sort_cmd;
mod tail_cmd;
mod touch_cmd;
mod tr_cmd;
mod true_cmd;
mod uniq_cmd;
mod wc_cmd;

/// Execution context handed to a command.
pub struct CommandContext {
    pub args: Vec<String>,
    pub stdin: String,
    pub cwd: String,
    pub env: HashMap<String, String>,
    pub fs: Arc<dyn FileSystem>,
    pub http: Option<Arc<dyn HttpClient>>,
    pub network: NetworkConfig,
}

impl CommandContext {
    /// Resolve a user-supplied path against the working directory.
    pub fn resolve(&self, path: &str) -> String {
        fs::resolve_path(&self.cwd, path)
    }

    /// Standard input model shared by the filter utilities: read the
    /// named files in order, or stdin when no paths are given (or for
    /// the `-` argument).
    pub async fn gather_input(&self, paths: &[String]) -> Result<String, CommandResult> {
        if paths.is_empty() {
            return Ok(self.stdin.clone());
        }
        let mut data = String::new();
        for path in paths {
            if path == "-" {
                data.push_str(&self.stdin);
                continue;
            }
            match self.fs.read_file(&self.resolve(path)).await {
                Ok(text) => data.push_str(&text),
                Err(e) => return Err(CommandResult::error(format!("{}\n", e))),
            }
        }
        Ok(data)
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), exit_code: 0 }
    }

    pub fn error(stderr: impl Into<String>) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), exit_code: 1 }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: CommandContext) -> CommandResult;
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: HashMap::new() }
    }

    pub fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        standard_registry()
    }
}

/// The full built-in catalogue.
pub fn standard_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Box::new(base64_cmd::Base64Command));
    registry.register(Box::new(basename_cmd::BasenameCommand));
    registry.register(Box::new(cat_cmd::CatCommand));
    registry.register(Box::new(cp_cmd::CpCommand));
    registry.register(Box::new(curl_cmd::CurlCommand));
    registry.register(Box::new(cut_cmd::CutCommand));
    registry.register(Box::new(date_cmd::DateCommand));
    registry.register(Box::new(dirname_cmd::DirnameCommand));
    registry.register(Box::new(echo_cmd::EchoCommand));
    registry.register(Box::new(env_cmd::EnvCommand));
    registry.register(Box::new(false_cmd::FalseCommand));
    registry.register(Box::new(grep_cmd::GrepCommand));
    registry.register(Box::new(head_cmd::HeadCommand));
    registry.register(Box::new(ls_cmd::LsCommand));
    registry.register(Box::new(mkdir_cmd::MkdirCommand));
    registry.register(Box::new(mv_cmd::MvCommand));
    registry.register(Box::new(printf_cmd::PrintfCommand));
    registry.register(Box::new(pwd_cmd::PwdCommand));
    registry.register(Box::new(rm_cmd::RmCommand));
    registry.register(Box::new(rmdir_cmd::RmdirCommand));
    registry.register(Box::new(seq_cmd::SeqCommand));
    registry.register(Box::new(sleep_cmd::SleepCommand));
    registry.register(Box::new(sort_cmd::SortCommand));
    registry.register(Box::new(tail_cmd::TailCommand));
    registry.register(Box::new(touch_cmd::TouchCommand));
    registry.register(Box::new(tr_cmd::TrCommand));
    registry.register(Box::new(true_cmd::TrueCommand));
    registry.register(Box::new(uniq_cmd::UniqCommand));
    registry.register(Box::new(wc_cmd::WcCommand));
    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::fs::MemFs;

    /// Context over a fresh MemFs for command unit tests.
    pub fn ctx(args: Vec<&str>) -> CommandContext {
        ctx_with_fs(args, Arc::new(MemFs::new()))
    }

    pub fn ctx_with_fs(args: Vec<&str>, fs: Arc<MemFs>) -> CommandContext {
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            http: None,
            network: NetworkConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_catalogue() {
        let registry = standard_registry();
        for name in ["echo", "cat", "grep", "ls", "mkdir", "curl", "printf", "wc"] {
            assert!(registry.contains(name), "{} missing", name);
        }
        assert!(!registry.contains("cd"));
        assert!(!registry.contains("no-such-command"));
    }
}
