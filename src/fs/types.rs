//! Filesystem trait and shared types.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Filesystem errors, phrased the way shell utilities report them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("{path}: No such file or directory")]
    NotFound { path: String },

    #[error("{path}: File exists")]
    AlreadyExists { path: String },

    #[error("{path}: Is a directory")]
    IsDirectory { path: String },

    #[error("{path}: Not a directory")]
    NotDirectory { path: String },

    #[error("{path}: Directory not empty")]
    NotEmpty { path: String },

    #[error("{path}: Invalid argument")]
    InvalidArgument { path: String },
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

/// A node in the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsNode {
    File { content: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
    Symlink { target: String },
}

impl FsNode {
    pub fn file(content: impl Into<Vec<u8>>) -> Self {
        Self::File { content: content.into(), mode: 0o644 }
    }

    pub fn dir() -> Self {
        Self::Dir { mode: 0o755 }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }
}

/// Stat result: what the core and the test operators need to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub mode: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MkdirOpts {
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOpts {
    pub recursive: bool,
    pub force: bool,
}

/// Abstract filesystem backend. All paths are absolute; callers resolve
/// against the cwd first (see [`crate::fs::resolve_path`]).
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<String, FsError>;

    async fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>, FsError>;

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    async fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    async fn exists(&self, path: &str) -> bool;

    /// Follows symlinks one level.
    async fn stat(&self, path: &str) -> Result<FsStat, FsError>;

    async fn mkdir(&self, path: &str, opts: MkdirOpts) -> Result<(), FsError>;

    /// Entry names, sorted.
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError>;

    async fn remove(&self, path: &str, opts: RemoveOpts) -> Result<(), FsError>;

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Every absolute path in the filesystem; the globber walks this.
    async fn all_paths(&self) -> Vec<String>;

    /// Snapshot of all regular files as path -> text content.
    async fn materialize(&self) -> HashMap<String, String>;
}
