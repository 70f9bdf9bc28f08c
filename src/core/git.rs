//! Git repository operations.
//!
//! Two things need git: finding the repository that encloses the working
//! directory (to bound the configuration search), and fetching the pinned
//! revision of a hook repository so its manifest can be read.

use crate::core::error::{Error, Result};
use crate::core::executor::{CommandOutput, ExecuteOptions, Executor};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Represents a local Git working tree.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the working tree.
    root: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository enclosing `path`.
    pub fn discover_from(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::git(
                "rev-parse",
                format!("{} is not inside a git repository", path.display()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let root = stdout
            .lines()
            .next()
            .map(PathBuf::from)
            .ok_or_else(|| Error::git("rev-parse", "empty output"))?;

        Ok(Self { root })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Fetches a single pinned revision of a remote repository.
#[derive(Debug, Clone)]
pub struct RevisionFetcher {
    executor: Executor,
    timeout: Duration,
}

impl RevisionFetcher {
    /// Creates a fetcher whose git invocations each time out after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            executor: Executor::new(),
            timeout,
        }
    }

    /// Materializes `rev` of `repo` as a detached checkout in `dest`.
    ///
    /// A shallow fetch of just the revision is tried first. Servers that
    /// refuse to serve an arbitrary revision (or abbreviated commit ids,
    /// which can't be fetched by name) get a full clone and checkout.
    /// `dest` is removed and recreated.
    pub async fn fetch(&self, repo: &str, rev: &str, dest: &Path) -> Result<()> {
        if !Executor::command_exists("git") {
            return Err(Error::CommandNotFound {
                command: "git".to_string(),
            });
        }
        if repo.starts_with('-') || rev.starts_with('-') {
            return Err(Error::git(
                "fetch",
                format!("refusing option-like repository or revision: {repo} {rev}"),
            ));
        }

        match self.shallow_fetch(repo, rev, dest).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(repo, rev, error = %e, "shallow fetch failed, cloning fully");
                self.complete_clone(repo, rev, dest).await
            },
        }
    }

    async fn shallow_fetch(&self, repo: &str, rev: &str, dest: &Path) -> Result<()> {
        reset_dir(dest)?;
        self.git(dest, "init", &["init", "--quiet"]).await?;
        self.git(dest, "remote add", &["remote", "add", "--", "origin", repo])
            .await?;
        self.git(
            dest,
            "fetch",
            &["fetch", "--quiet", "--depth=1", "--end-of-options", "origin", rev],
        )
        .await?;
        self.git(dest, "checkout", &["checkout", "--quiet", "FETCH_HEAD"])
            .await
    }

    async fn complete_clone(&self, repo: &str, rev: &str, dest: &Path) -> Result<()> {
        reset_dir(dest)?;
        self.git(dest, "init", &["init", "--quiet"]).await?;
        self.git(dest, "remote add", &["remote", "add", "--", "origin", repo])
            .await?;
        self.git(
            dest,
            "fetch",
            &["fetch", "--quiet", "--tags", "origin", "+refs/heads/*:refs/remotes/origin/*"],
        )
        .await?;
        self.git(
            dest,
            "checkout",
            &["checkout", "--quiet", "--end-of-options", rev, "--"],
        )
            .await
    }

    async fn git(&self, cwd: &Path, operation: &str, args: &[&str]) -> Result<()> {
        let options = ExecuteOptions::default()
            .cwd(cwd)
            .timeout(self.timeout)
            .env("GIT_TERMINAL_PROMPT", "0");

        let output: CommandOutput = self.executor.run("git", args, options).await?;

        if output.timed_out {
            return Err(Error::GitTimeout {
                operation: operation.to_string(),
                timeout: humantime::format_duration(self.timeout).to_string(),
            });
        }
        if !output.success() {
            return Err(Error::git(operation, output.error_line()));
        }
        Ok(())
    }
}

/// Removes `dir` if present and creates it empty.
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| Error::io("clear checkout dir", e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io("create checkout dir", e))
}

/// Helpers for building throwaway repositories in tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::process::Command;

    /// Runs git in `dir`, panicking on failure.
    pub fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Initializes a repository with a committer identity.
    pub fn init_repo(dir: &Path) {
        git(dir, &["init", "--quiet"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    /// Writes `manifest` as the hook manifest, commits it and tags it `tag`.
    pub fn commit_manifest(dir: &Path, manifest: &str, tag: &str) {
        std::fs::write(dir.join(".pre-commit-hooks.yaml"), manifest).expect("write manifest");
        git(dir, &["add", "."]);
        git(dir, &["commit", "--quiet", "-m", tag]);
        git(dir, &["tag", tag]);
    }
}
