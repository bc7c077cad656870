//! Pathname expansion over the virtual filesystem.
//!
//! Matches one path segment at a time. Dotfiles only match when the
//! pattern segment literally starts with a dot; a pattern with no
//! matches stays literal (the caller falls back to the field text).

use crate::interpreter::pattern;
use crate::interpreter::sync_fs::SyncFs;

/// Expand `pattern` (backslash-escapes mark literal characters) against
/// the filesystem. Returns None when nothing matches.
pub fn expand(fs: &SyncFs, cwd: &str, pattern: &str) -> Option<Vec<String>> {
    let absolute = pattern.starts_with('/');
    let trailing_slash = pattern.ends_with('/') && pattern.len() > 1;
    let segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();

    // Candidate paths as typed (relative candidates stay relative).
    let mut candidates: Vec<String> = vec![if absolute { "/".to_string() } else { String::new() }];

    for segment in &segments {
        if segment.is_empty() {
            continue;
        }
        let mut next = Vec::new();

        if !pattern::has_glob_chars(segment) {
            let literal = pattern::unescape(segment);
            for cand in &candidates {
                let path = join(cand, &literal);
                if fs.exists(&fs.resolve(cwd, &path)) {
                    next.push(path);
                }
            }
        } else {
            for cand in &candidates {
                let dir = if cand.is_empty() { cwd.to_string() } else { fs.resolve(cwd, cand) };
                let names = match fs.readdir(&dir) {
                    Ok(names) => names,
                    Err(_) => continue,
                };
                for name in names {
                    if name.starts_with('.') && !segment.starts_with('.') {
                        continue;
                    }
                    if pattern::matches_glob(segment, &name) {
                        next.push(join(cand, &name));
                    }
                }
            }
        }
        candidates = next;
        if candidates.is_empty() {
            return None;
        }
    }

    // A trailing slash restricts matches to directories.
    if trailing_slash {
        candidates.retain(|c| fs.is_dir(&fs.resolve(cwd, c)));
        if candidates.is_empty() {
            return None;
        }
    }

    candidates.sort();
    Some(candidates)
}

fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else if base == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, MemFs, MkdirOpts};
    use std::sync::Arc;

    async fn fixture() -> Arc<MemFs> {
        let fs = Arc::new(MemFs::new());
        fs.mkdir("/home/user/docs", MkdirOpts { recursive: true }).await.unwrap();
        fs.write_file("/home/user/a.txt", b"").await.unwrap();
        fs.write_file("/home/user/b.txt", b"").await.unwrap();
        fs.write_file("/home/user/c.md", b"").await.unwrap();
        fs.write_file("/home/user/.hidden", b"").await.unwrap();
        fs.write_file("/home/user/docs/d.txt", b"").await.unwrap();
        fs
    }

    fn sync_fs(fs: Arc<MemFs>) -> SyncFs {
        SyncFs::new(fs, tokio::runtime::Handle::current())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn star_matches_visible_files() {
        let fs = sync_fs(fixture().await);
        let got = expand(&fs, "/home/user", "*.txt").unwrap();
        assert_eq!(got, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dotfiles_need_dot_pattern() {
        let fs = sync_fs(fixture().await);
        let all = expand(&fs, "/home/user", "*").unwrap();
        assert!(!all.contains(&".hidden".to_string()));
        let hidden = expand(&fs, "/home/user", ".h*").unwrap();
        assert_eq!(hidden, vec![".hidden"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn no_match_returns_none() {
        let fs = sync_fs(fixture().await);
        assert!(expand(&fs, "/home/user", "*.rs").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn multi_segment_patterns() {
        let fs = sync_fs(fixture().await);
        let got = expand(&fs, "/home/user", "*/*.txt").unwrap();
        assert_eq!(got, vec!["docs/d.txt"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn absolute_patterns() {
        let fs = sync_fs(fixture().await);
        let got = expand(&fs, "/", "/home/user/*.md").unwrap();
        assert_eq!(got, vec!["/home/user/c.md"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn escaped_star_matches_literal_only() {
        let fs = sync_fs(fixture().await);
        assert!(expand(&fs, "/home/user", "\\*.txt").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn literal_middle_segments() {
        let fs = sync_fs(fixture().await);
        let got = expand(&fs, "/home/user", "docs/*").unwrap();
        assert_eq!(got, vec!["docs/d.txt"]);
    }
}
