//! Sync bridge over the async filesystem and HTTP client.
//!
//! The tree-walking executor is synchronous; the `FileSystem` and
//! `HttpClient` traits are async. This adapter runs futures to
//! completion with `block_in_place` + `Handle::block_on`, which requires
//! the multi-thread tokio runtime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::fs::{self, FileSystem, FsError, FsStat, MkdirOpts, RemoveOpts};

#[derive(Clone)]
pub struct SyncFs {
    inner: Arc<dyn FileSystem>,
    handle: tokio::runtime::Handle,
}

impl SyncFs {
    pub fn new(inner: Arc<dyn FileSystem>, handle: tokio::runtime::Handle) -> Self {
        Self { inner, handle }
    }

    pub fn block_on<F: Future>(&self, f: F) -> F::Output {
        tokio::task::block_in_place(|| self.handle.block_on(f))
    }

    /// The async filesystem, for handing to utility commands.
    pub fn shared(&self) -> Arc<dyn FileSystem> {
        self.inner.clone()
    }

    pub fn resolve(&self, cwd: &str, path: &str) -> String {
        fs::resolve_path(cwd, path)
    }

    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.block_on(self.inner.read_file(path))
    }

    pub fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        self.block_on(self.inner.write_file(path, content))
    }

    pub fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        self.block_on(self.inner.append_file(path, content))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.block_on(self.inner.exists(path))
    }

    pub fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        self.block_on(self.inner.stat(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.stat(path).map(|s| s.is_directory).unwrap_or(false)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.stat(path).map(|s| s.is_file).unwrap_or(false)
    }

    pub fn mkdir(&self, path: &str, opts: MkdirOpts) -> Result<(), FsError> {
        self.block_on(self.inner.mkdir(path, opts))
    }

    pub fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.block_on(self.inner.readdir(path))
    }

    pub fn remove(&self, path: &str, opts: RemoveOpts) -> Result<(), FsError> {
        self.block_on(self.inner.remove(path, opts))
    }

    pub fn materialize(&self) -> HashMap<String, String> {
        self.block_on(self.inner.materialize())
    }
}
