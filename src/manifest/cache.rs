//! On-disk cache of fetched hook repositories.
//!
//! Layout: `<root>/repos/<repo key>/<rev key>/` holds a checkout of one
//! pinned revision. A `.hookpin.json` marker is written after the checkout
//! completes; directories without it are treated as absent.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marker file written into a completed checkout.
pub const MARKER_FILE_NAME: &str = ".hookpin.json";

/// Contents of a completion marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Repository the checkout came from.
    pub repo: String,
    /// Revision that was checked out.
    pub rev: String,
    /// RFC 3339 timestamp of the fetch.
    pub fetched_at: String,
}

/// Summary of what the cache holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheUsage {
    /// Completed checkouts.
    pub entries: usize,
    /// Bytes on disk, including incomplete checkouts.
    pub bytes: u64,
}

/// Cache of hook repository checkouts.
#[derive(Debug, Clone)]
pub struct RepoCache {
    root: PathBuf,
}

impl RepoCache {
    /// Creates a cache rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the cache.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the checkout of `repo` at `rev`.
    #[must_use]
    pub fn checkout_dir(&self, repo: &str, rev: &str) -> PathBuf {
        self.root.join("repos").join(key(repo)).join(key(rev))
    }

    /// Returns the marker of a completed checkout, if there is one.
    #[must_use]
    pub fn lookup(&self, repo: &str, rev: &str) -> Option<CacheEntry> {
        read_marker(&self.checkout_dir(repo, rev).join(MARKER_FILE_NAME))
            .filter(|entry| entry.repo == repo && entry.rev == rev)
    }

    /// Records that the checkout of `repo` at `rev` is complete.
    pub fn mark_complete(&self, repo: &str, rev: &str) -> Result<CacheEntry> {
        let entry = CacheEntry {
            repo: repo.to_string(),
            rev: rev.to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&entry).map_err(|e| Error::Internal {
            message: format!("Failed to serialize cache marker: {e}"),
        })?;

        let path = self.checkout_dir(repo, rev).join(MARKER_FILE_NAME);
        std::fs::write(&path, json).map_err(|e| Error::io("write cache marker", e))?;
        Ok(entry)
    }

    /// Lists completed checkouts.
    #[must_use]
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<_> = WalkDir::new(self.root.join("repos"))
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name() == MARKER_FILE_NAME)
            .filter_map(|e| read_marker(e.path()))
            .collect();
        entries.sort_by(|a, b| (&a.repo, &a.rev).cmp(&(&b.repo, &b.rev)));
        entries
    }

    /// Measures the cache.
    #[must_use]
    pub fn usage(&self) -> CacheUsage {
        let bytes = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter_map(|e| e.metadata().ok())
            .filter(std::fs::Metadata::is_file)
            .map(|m| m.len())
            .sum();

        CacheUsage {
            entries: self.entries().len(),
            bytes,
        }
    }

    /// Deletes everything in the cache. Returns false if it didn't exist.
    pub fn clean(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.root).map_err(|e| Error::io("remove cache", e))?;
        tracing::info!(path = %self.root.display(), "removed repository cache");
        Ok(true)
    }
}

fn read_marker(path: &Path) -> Option<CacheEntry> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable cache marker");
            None
        },
    }
}

/// Turns a URL or revision into a single path component.
///
/// The readable prefix is lossy, so a hash of the full value keeps
/// distinct inputs apart.
fn key(value: &str) -> String {
    let readable: String = value
        .trim_end_matches('/')
        .rsplit(|c: char| matches!(c, '/' | '\\' | ':'))
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(40)
        .collect();

    format!("{}-{:016x}", readable.trim_start_matches('.'), fnv1a(value))
}

/// 64-bit FNV-1a; stable across toolchains, unlike `DefaultHasher`.
fn fnv1a(value: &str) -> u64 {
    value.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_is_single_component() {
        let k = key("https://github.com/pre-commit/pre-commit-hooks");
        assert!(k.starts_with("pre-commit-hooks-"));
        assert!(!k.contains('/'));
    }

    #[test]
    fn test_key_distinguishes_similar_values() {
        assert_ne!(key("https://a.example/x/hooks"), key("https://b.example/y/hooks"));
        assert_ne!(key("v1/x"), key("v1_x"));
    }

    #[test]
    fn test_key_never_hidden() {
        assert!(!key("../..").starts_with('.'));
        assert!(!key(".hidden").starts_with('.'));
    }

    #[test]
    fn test_incomplete_checkout_is_absent() {
        let temp = TempDir::new().expect("create temp dir");
        let cache = RepoCache::new(temp.path());
        let dir = cache.checkout_dir("https://example.com/hooks", "v1.0.0");
        std::fs::create_dir_all(&dir).expect("create checkout");

        assert!(cache.lookup("https://example.com/hooks", "v1.0.0").is_none());
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn test_mark_complete_and_list() {
        let temp = TempDir::new().expect("create temp dir");
        let cache = RepoCache::new(temp.path());

        for (repo, rev) in [
            ("https://example.com/b", "v2.0.0"),
            ("https://example.com/a", "v1.0.0"),
        ] {
            std::fs::create_dir_all(cache.checkout_dir(repo, rev)).expect("create checkout");
            cache.mark_complete(repo, rev).expect("mark complete");
        }

        let entry = cache
            .lookup("https://example.com/a", "v1.0.0")
            .expect("entry present");
        assert!(chrono::DateTime::parse_from_rfc3339(&entry.fetched_at).is_ok());

        let repos: Vec<_> = cache.entries().into_iter().map(|e| e.repo).collect();
        assert_eq!(repos, vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(cache.usage().entries, 2);
        assert!(cache.usage().bytes > 0);
    }

    #[test]
    fn test_clean() {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().join("cache");
        let cache = RepoCache::new(&root);

        assert!(!cache.clean().expect("clean missing cache"));

        std::fs::create_dir_all(cache.checkout_dir("r", "v1")).expect("create checkout");
        assert!(cache.clean().expect("clean cache"));
        assert!(!root.exists());
    }
}
