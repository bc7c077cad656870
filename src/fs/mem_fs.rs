//! In-memory filesystem backend.
//!
//! A flat map of absolute normalized paths to nodes, guarded by an async
//! RwLock. Directory listing scans the key space, which keeps the node
//! type small and makes `all_paths` (the globber's input) trivial.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::fs::types::{FileSystem, FsError, FsNode, FsStat, MkdirOpts, RemoveOpts};
use crate::fs::{base_name, parent_of};

pub struct MemFs {
    nodes: RwLock<HashMap<String, FsNode>>,
}

impl MemFs {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), FsNode::dir());
        Self { nodes: RwLock::new(nodes) }
    }

    /// Seed files, creating parent directories as needed. Used by the
    /// shell constructor for the `files` option.
    pub async fn seed(&self, files: &HashMap<String, String>) {
        let mut nodes = self.nodes.write().await;
        for (path, content) in files {
            let mut dir = parent_of(path);
            while dir != "/" && !nodes.contains_key(&dir) {
                nodes.insert(dir.clone(), FsNode::dir());
                dir = parent_of(&dir);
            }
            nodes.insert(path.clone(), FsNode::file(content.as_bytes().to_vec()));
        }
    }

    /// One level of symlink indirection.
    fn follow<'a>(nodes: &'a HashMap<String, FsNode>, path: &str) -> Option<(&'a FsNode, String)> {
        match nodes.get(path) {
            Some(FsNode::Symlink { target }) => {
                nodes.get(target.as_str()).map(|n| (n, target.clone()))
            }
            Some(node) => Some((node, path.to_string())),
            None => None,
        }
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for MemFs {
    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        let bytes = self.read_file_bytes(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let nodes = self.nodes.read().await;
        match Self::follow(&nodes, path) {
            Some((FsNode::File { content, .. }, _)) => Ok(content.clone()),
            Some((FsNode::Dir { .. }, _)) => Err(FsError::IsDirectory { path: path.to_string() }),
            _ => Err(FsError::not_found(path)),
        }
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let mut nodes = self.nodes.write().await;
        match nodes.get(path) {
            Some(FsNode::Dir { .. }) => {
                return Err(FsError::IsDirectory { path: path.to_string() });
            }
            Some(FsNode::Symlink { target }) => {
                let target = target.clone();
                nodes.insert(target, FsNode::file(content.to_vec()));
                return Ok(());
            }
            _ => {}
        }
        let parent = parent_of(path);
        match nodes.get(&parent) {
            Some(FsNode::Dir { .. }) => {}
            Some(_) => return Err(FsError::NotDirectory { path: parent }),
            None => return Err(FsError::not_found(parent)),
        }
        nodes.insert(path.to_string(), FsNode::file(content.to_vec()));
        Ok(())
    }

    async fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        {
            let mut nodes = self.nodes.write().await;
            let real = match Self::follow(&nodes, path) {
                Some((FsNode::File { .. }, real)) => Some(real),
                _ => None,
            };
            if let Some(real) = real {
                if let Some(FsNode::File { content: existing, .. }) = nodes.get_mut(&real) {
                    existing.extend_from_slice(content);
                    return Ok(());
                }
            }
        }
        self.write_file(path, content).await
    }

    async fn exists(&self, path: &str) -> bool {
        self.nodes.read().await.contains_key(path)
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let nodes = self.nodes.read().await;
        let is_symlink = matches!(nodes.get(path), Some(FsNode::Symlink { .. }));
        match Self::follow(&nodes, path) {
            Some((FsNode::File { content, mode }, _)) => Ok(FsStat {
                is_file: true,
                is_directory: false,
                is_symlink,
                size: content.len() as u64,
                mode: *mode,
            }),
            Some((FsNode::Dir { mode }, _)) => Ok(FsStat {
                is_file: false,
                is_directory: true,
                is_symlink,
                size: 0,
                mode: *mode,
            }),
            Some((FsNode::Symlink { .. }, _)) | None if is_symlink => {
                // Dangling symlink
                Err(FsError::not_found(path))
            }
            _ => Err(FsError::not_found(path)),
        }
    }

    async fn mkdir(&self, path: &str, opts: MkdirOpts) -> Result<(), FsError> {
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(path) {
            if opts.recursive && nodes.get(path).map(FsNode::is_dir).unwrap_or(false) {
                return Ok(());
            }
            return Err(FsError::AlreadyExists { path: path.to_string() });
        }

        if opts.recursive {
            let mut missing = vec![path.to_string()];
            let mut dir = parent_of(path);
            while dir != "/" && !nodes.contains_key(&dir) {
                missing.push(dir.clone());
                dir = parent_of(&dir);
            }
            if let Some(existing) = nodes.get(&dir) {
                if !existing.is_dir() {
                    return Err(FsError::NotDirectory { path: dir });
                }
            }
            for p in missing {
                nodes.insert(p, FsNode::dir());
            }
            return Ok(());
        }

        let parent = parent_of(path);
        match nodes.get(&parent) {
            Some(FsNode::Dir { .. }) => {}
            Some(_) => return Err(FsError::NotDirectory { path: parent }),
            None => return Err(FsError::not_found(parent)),
        }
        nodes.insert(path.to_string(), FsNode::dir());
        Ok(())
    }

    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let nodes = self.nodes.read().await;
        let (node, real) = Self::follow(&nodes, path).ok_or_else(|| FsError::not_found(path))?;
        if !node.is_dir() {
            return Err(FsError::NotDirectory { path: path.to_string() });
        }

        let prefix = if real == "/" { "/".to_string() } else { format!("{}/", real) };
        let mut names: Vec<String> = nodes
            .keys()
            .filter(|k| k.starts_with(&prefix) && *k != &real)
            .filter_map(|k| {
                let rest = &k[prefix.len()..];
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    async fn remove(&self, path: &str, opts: RemoveOpts) -> Result<(), FsError> {
        let mut nodes = self.nodes.write().await;
        let node = match nodes.get(path) {
            Some(n) => n.clone(),
            None if opts.force => return Ok(()),
            None => return Err(FsError::not_found(path)),
        };

        if node.is_dir() {
            let prefix = format!("{}/", path);
            let has_children = nodes.keys().any(|k| k.starts_with(&prefix));
            if has_children && !opts.recursive {
                return Err(FsError::NotEmpty { path: path.to_string() });
            }
            if !opts.recursive && !has_children {
                // rmdir-style removal of an empty directory is fine
            }
            let doomed: Vec<String> = nodes
                .keys()
                .filter(|k| k.starts_with(&prefix) || *k == path)
                .cloned()
                .collect();
            for k in doomed {
                nodes.remove(&k);
            }
            return Ok(());
        }

        nodes.remove(path);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let mut nodes = self.nodes.write().await;
        let node = nodes.get(from).cloned().ok_or_else(|| FsError::not_found(from))?;

        if node.is_dir() {
            let prefix = format!("{}/", from);
            let moved: Vec<(String, FsNode)> = nodes
                .iter()
                .filter(|(k, _)| k.starts_with(&prefix) || *k == from)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (k, _) in &moved {
                nodes.remove(k);
            }
            for (k, v) in moved {
                let new_key = format!("{}{}", to, &k[from.len()..]);
                nodes.insert(new_key, v);
            }
            return Ok(());
        }

        nodes.remove(from);
        nodes.insert(to.to_string(), node);
        Ok(())
    }

    async fn all_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.nodes.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    async fn materialize(&self) -> HashMap<String, String> {
        self.nodes
            .read()
            .await
            .iter()
            .filter_map(|(k, v)| match v {
                FsNode::File { content, .. } => {
                    Some((k.clone(), String::from_utf8_lossy(content).into_owned()))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_and_read() {
        let fs = MemFs::new();
        fs.write_file("/a.txt", b"hello").await.unwrap();
        assert_eq!(fs.read_file("/a.txt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn read_missing_is_error() {
        let fs = MemFs::new();
        assert_eq!(
            fs.read_file("/nope").await.unwrap_err(),
            FsError::not_found("/nope")
        );
    }

    #[tokio::test]
    async fn write_requires_parent() {
        let fs = MemFs::new();
        assert!(fs.write_file("/no/such/dir/f", b"x").await.is_err());
    }

    #[tokio::test]
    async fn append_creates_and_extends() {
        let fs = MemFs::new();
        fs.append_file("/log", b"a").await.unwrap();
        fs.append_file("/log", b"b").await.unwrap();
        assert_eq!(fs.read_file("/log").await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn mkdir_recursive() {
        let fs = MemFs::new();
        fs.mkdir("/a/b/c", MkdirOpts { recursive: true }).await.unwrap();
        assert!(fs.exists("/a/b/c").await);
        assert!(fs.stat("/a/b").await.unwrap().is_directory);
    }

    #[tokio::test]
    async fn mkdir_non_recursive_needs_parent() {
        let fs = MemFs::new();
        assert!(fs.mkdir("/x/y", MkdirOpts::default()).await.is_err());
        fs.mkdir("/x", MkdirOpts::default()).await.unwrap();
        fs.mkdir("/x/y", MkdirOpts::default()).await.unwrap();
    }

    #[tokio::test]
    async fn readdir_lists_direct_children() {
        let fs = MemFs::new();
        fs.mkdir("/d", MkdirOpts::default()).await.unwrap();
        fs.write_file("/d/b.txt", b"").await.unwrap();
        fs.write_file("/d/a.txt", b"").await.unwrap();
        fs.mkdir("/d/sub", MkdirOpts::default()).await.unwrap();
        fs.write_file("/d/sub/deep.txt", b"").await.unwrap();
        assert_eq!(fs.readdir("/d").await.unwrap(), vec!["a.txt", "b.txt", "sub"]);
    }

    #[tokio::test]
    async fn remove_file_and_dir() {
        let fs = MemFs::new();
        fs.write_file("/f", b"").await.unwrap();
        fs.remove("/f", RemoveOpts::default()).await.unwrap();
        assert!(!fs.exists("/f").await);

        fs.mkdir("/d", MkdirOpts::default()).await.unwrap();
        fs.write_file("/d/f", b"").await.unwrap();
        assert!(fs.remove("/d", RemoveOpts::default()).await.is_err());
        fs.remove("/d", RemoveOpts { recursive: true, force: false }).await.unwrap();
        assert!(!fs.exists("/d").await);
    }

    #[tokio::test]
    async fn remove_force_ignores_missing() {
        let fs = MemFs::new();
        assert!(fs.remove("/nope", RemoveOpts { recursive: false, force: true }).await.is_ok());
    }

    #[tokio::test]
    async fn rename_moves_subtree() {
        let fs = MemFs::new();
        fs.mkdir("/src", MkdirOpts::default()).await.unwrap();
        fs.write_file("/src/f", b"data").await.unwrap();
        fs.rename("/src", "/dst").await.unwrap();
        assert!(!fs.exists("/src/f").await);
        assert_eq!(fs.read_file("/dst/f").await.unwrap(), "data");
    }

    #[tokio::test]
    async fn seed_creates_parents() {
        let fs = MemFs::new();
        let mut files = HashMap::new();
        files.insert("/home/user/notes.txt".to_string(), "note".to_string());
        fs.seed(&files).await;
        assert_eq!(fs.read_file("/home/user/notes.txt").await.unwrap(), "note");
        assert!(fs.stat("/home/user").await.unwrap().is_directory);
    }

    #[tokio::test]
    async fn materialize_snapshots_files() {
        let fs = MemFs::new();
        fs.write_file("/a", b"1").await.unwrap();
        let snap = fs.materialize().await;
        assert_eq!(snap.get("/a"), Some(&"1".to_string()));
    }
}
