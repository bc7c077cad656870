//! sandbash - a sandboxed, in-process bash interpreter
//!
//! Parses shell scripts into a typed AST and evaluates them against a
//! virtual in-memory filesystem and an isolated environment. Nothing
//! touches the host: no processes, no real files, no sockets unless an
//! HTTP client is supplied and allow-listed.

pub mod ast;
pub mod commands;
pub mod formatter;
pub mod fs;
pub mod interpreter;
pub mod network;
pub mod parser;
pub mod shell;

pub use ast::types::*;
pub use formatter::{format_source, FormatOptions};
pub use fs::{FileSystem, FsError, MemFs};
pub use interpreter::types::{ExecLimits, ExecResult, ShellOpts, ShellState};
pub use network::{HttpClient, HttpRequest, HttpResponse};
pub use parser::{parse, tokenize, ParseError};
pub use shell::{Shell, ShellOptions};
