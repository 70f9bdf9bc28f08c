//! Checks hook activations against the manifests of their repositories.
//!
//! Each distinct `(repo, rev)` pair is resolved once, concurrently, and
//! then every activation's id is looked up in its repository's manifest.

#![allow(tail_expr_drop_order)]

use crate::config::Config;
use crate::core::error::{Error, Result};
use crate::manifest::{Manifest, ManifestSource};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Result of checking a single hook activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResult {
    /// Repository the hook is activated from.
    pub repo: String,
    /// Revision whose manifest was consulted.
    pub rev: String,
    /// The activated hook id.
    pub id: String,
    /// Whether the manifest declares the id.
    pub declared: bool,
}

/// Result of checking a whole configuration.
#[derive(Debug)]
pub struct ValidationReport {
    /// One result per activation, in document order.
    pub hooks: Vec<HookResult>,
    /// Number of distinct repository revisions resolved.
    pub repos_checked: usize,
    /// Total duration.
    pub duration: Duration,
}

impl ValidationReport {
    /// Returns true if every activated hook is declared.
    #[must_use]
    pub fn success(&self) -> bool {
        self.hooks.iter().all(|h| h.declared)
    }

    /// Returns the number of declared hooks.
    #[must_use]
    pub fn declared_count(&self) -> usize {
        self.hooks.iter().filter(|h| h.declared).count()
    }

    /// Returns the number of unknown hooks.
    #[must_use]
    pub fn unknown_count(&self) -> usize {
        self.hooks.len() - self.declared_count()
    }

    /// Returns the activations whose id is not declared.
    pub fn unknown_hooks(&self) -> impl Iterator<Item = &HookResult> + '_ {
        self.hooks.iter().filter(|h| !h.declared)
    }

    /// Turns the first unknown hook into an error.
    pub fn into_result(self) -> Result<Self> {
        let first = self.unknown_hooks().next().cloned();
        match first {
            Some(hook) => Err(Error::UnknownHook {
                repo: hook.repo,
                rev: hook.rev,
                id: hook.id,
            }),
            None => Ok(self),
        }
    }
}

/// Validates hook ids against repository manifests.
#[derive(Debug)]
pub struct Validator<S> {
    source: Arc<S>,
    jobs: usize,
    progress: bool,
}

impl<S: ManifestSource> Validator<S> {
    /// Creates a validator resolving manifests through `source`.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            jobs: default_jobs(),
            progress: false,
        }
    }

    /// Limits how many repositories are resolved at once.
    #[must_use]
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Shows a progress bar on stderr while resolving.
    #[must_use]
    pub const fn show_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Resolves every repository's manifest and checks each activation.
    ///
    /// Unknown ids are reported, not raised; fetch failures are raised.
    pub async fn validate(&self, config: &Config) -> Result<ValidationReport> {
        let start = std::time::Instant::now();

        let mut pairs: Vec<(String, String)> = Vec::new();
        for entry in &config.repos {
            let pair = (entry.repo.clone(), entry.rev.clone());
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }

        let pb = self.progress_bar(pairs.len());
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut handles = Vec::with_capacity(pairs.len());

        for (repo, rev) in pairs {
            let sem = Arc::clone(&semaphore);
            let source = Arc::clone(&self.source);

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.map_err(|_| Error::Internal {
                    message: "Semaphore closed unexpectedly".to_string(),
                })?;
                let manifest = source.manifest(&repo, &rev).await?;
                Ok::<_, Error>(((repo, rev), manifest))
            }));
        }

        let mut manifests: HashMap<(String, String), Manifest> = HashMap::new();
        for handle in handles {
            let joined = handle.await.map_err(|e| Error::Internal {
                message: format!("Task join error: {e}"),
            });
            let (key, manifest) = match joined {
                Ok(Ok(resolved)) => resolved,
                Ok(Err(e)) | Err(e) => {
                    pb.abandon();
                    return Err(e);
                },
            };
            pb.set_message(key.0.clone());
            pb.inc(1);
            manifests.insert(key, manifest);
        }
        pb.finish_and_clear();

        let hooks = config
            .iter_hooks()
            .map(|(entry, hook)| {
                let declared = manifests
                    .get(&(entry.repo.clone(), entry.rev.clone()))
                    .is_some_and(|m| m.contains(&hook.id));
                if !declared {
                    tracing::debug!(repo = %entry.repo, rev = %entry.rev, id = %hook.id, "hook not declared");
                }
                HookResult {
                    repo: entry.repo.clone(),
                    rev: entry.rev.clone(),
                    id: hook.id.clone(),
                    declared,
                }
            })
            .collect();

        Ok(ValidationReport {
            hooks,
            repos_checked: manifests.len(),
            duration: start.elapsed(),
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} [{pos}/{len}] {msg}")
                .ok()
                .unwrap_or_else(ProgressStyle::default_spinner),
        );
        pb.set_message("resolving hook repositories");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// Default number of parallel fetches: the available CPU cores.
#[must_use]
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}
