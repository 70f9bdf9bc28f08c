//! Hook manifests of hook repositories.
//!
//! A hook repository declares the hooks it provides in a
//! `.pre-commit-hooks.yaml` at its root. Only the ids matter for checking
//! a configuration; the descriptive fields are kept for display.

pub mod cache;

use crate::core::error::{Error, Result};
use crate::core::git::RevisionFetcher;
use cache::RepoCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Manifest file name at the root of a hook repository.
pub const MANIFEST_FILE_NAME: &str = ".pre-commit-hooks.yaml";

/// A hook declared by a repository's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHook {
    /// Identifier used by configurations to activate the hook.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Command the runner invokes.
    #[serde(default)]
    pub entry: String,
    /// Language or environment the hook runs in.
    #[serde(default)]
    pub language: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// The hooks a repository provides at one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    hooks: Vec<ManifestHook>,
}

impl Manifest {
    /// Parses manifest text. `repo` is only used in error messages.
    pub fn from_yaml_str(repo: &str, content: &str) -> Result<Self> {
        let hooks: Vec<ManifestHook> =
            serde_yaml::from_str(content).map_err(|e| Error::ManifestParse {
                repo: repo.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { hooks })
    }

    /// Reads the manifest at the root of a checkout of `repo` at `rev`.
    pub fn load_from_checkout(dir: &Path, repo: &str, rev: &str) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound {
                    repo: repo.to_string(),
                    rev: rev.to_string(),
                });
            },
            Err(e) => return Err(Error::io(format!("read {}", path.display()), e)),
        };
        Self::from_yaml_str(repo, &content)
    }

    /// Returns true if the manifest declares hook `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Looks up hook `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ManifestHook> {
        self.hooks.iter().find(|h| h.id == id)
    }

    /// Declared hook ids in manifest order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.hooks.iter().map(|h| h.id.as_str())
    }

    /// All declared hooks.
    #[must_use]
    pub fn hooks(&self) -> &[ManifestHook] {
        &self.hooks
    }
}

/// Provides the manifest of a repository at a pinned revision.
pub trait ManifestSource: Send + Sync + 'static {
    /// Resolves the manifest of `repo` at `rev`.
    fn manifest(&self, repo: &str, rev: &str) -> impl Future<Output = Result<Manifest>> + Send;
}

/// Fetches manifests with git, caching checkouts on disk.
#[derive(Debug, Clone)]
pub struct GitManifests {
    cache: RepoCache,
    fetcher: RevisionFetcher,
}

impl GitManifests {
    /// Creates a source caching under `cache` with a per-command timeout.
    #[must_use]
    pub const fn new(cache: RepoCache, timeout: Duration) -> Self {
        Self {
            cache,
            fetcher: RevisionFetcher::new(timeout),
        }
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &RepoCache {
        &self.cache
    }
}

impl ManifestSource for GitManifests {
    async fn manifest(&self, repo: &str, rev: &str) -> Result<Manifest> {
        let dir = self.cache.checkout_dir(repo, rev);

        match self.cache.lookup(repo, rev) {
            Some(entry) => {
                tracing::debug!(repo, rev, fetched_at = %entry.fetched_at, "using cached checkout");
            },
            None => {
                tracing::info!(repo, rev, "fetching hook repository");
                self.fetcher.fetch(repo, rev, &dir).await?;
                self.cache.mark_complete(repo, rev)?;
            },
        }

        Manifest::load_from_checkout(&dir, repo, rev)
    }
}

/// Serves manifests from memory, keyed by repository and revision.
#[derive(Debug, Clone, Default)]
pub struct StaticManifests {
    manifests: HashMap<(String, String), Manifest>,
}

impl StaticManifests {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the manifest of `repo` at `rev`.
    #[must_use]
    pub fn with(mut self, repo: impl Into<String>, rev: impl Into<String>, manifest: Manifest) -> Self {
        self.manifests.insert((repo.into(), rev.into()), manifest);
        self
    }
}

impl ManifestSource for StaticManifests {
    async fn manifest(&self, repo: &str, rev: &str) -> Result<Manifest> {
        self.manifests
            .get(&(repo.to_string(), rev.to_string()))
            .cloned()
            .ok_or_else(|| Error::git("fetch", format!("couldn't find remote ref {rev}")))
    }
}
