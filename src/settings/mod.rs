//! Settings of the tool itself.
//!
//! These live in an optional `hookpin.toml` found by searching up from the
//! working directory. They control where fetched hook repositories are
//! cached and how fetching behaves; they never affect what a hook
//! configuration means.

use crate::core::error::{Error, Result};
use crate::core::validator::default_jobs;
use crate::manifest::cache::RepoCache;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file name.
pub const SETTINGS_FILE_NAME: &str = "hookpin.toml";

/// Environment variable overriding the cache directory.
pub const HOME_ENV: &str = "HOOKPIN_HOME";

/// Default timeout for each git invocation while fetching.
pub const DEFAULT_FETCH_TIMEOUT: &str = "60s";

/// Tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Cache directory. Relative paths are resolved against the settings file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Timeout for each git invocation, e.g. `"90s"` or `"2m"`.
    pub fetch_timeout: String,
    /// Maximum number of repositories fetched at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// File the settings were read from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT.to_string(),
            jobs: None,
            source: None,
        }
    }
}

impl Settings {
    /// Loads settings found from the current directory, or the defaults.
    pub fn load_or_default() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
        Self::load_or_default_from(&cwd)
    }

    /// Loads settings found from `start`, or the defaults.
    pub fn load_or_default_from(start: &Path) -> Result<Self> {
        match Self::find_settings_file(start) {
            Ok(path) => Self::load_from(&path),
            Err(Error::ConfigNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Loads settings from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read settings", e))?;

        let mut settings: Self = toml::from_str(&content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;
        settings.source = Some(path.to_path_buf());

        settings.validate()?;

        Ok(settings)
    }

    /// Finds the settings file by searching up the directory tree.
    pub fn find_settings_file(start: &Path) -> Result<PathBuf> {
        let mut current = start;
        loop {
            let candidate = current.join(SETTINGS_FILE_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: start.join(SETTINGS_FILE_NAME),
        })
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout()?.is_zero() {
            return Err(Error::invalid("fetch_timeout", "must be greater than zero"));
        }

        if self.jobs == Some(0) {
            return Err(Error::invalid("jobs", "must be at least 1"));
        }

        Ok(())
    }

    /// Parsed fetch timeout.
    pub fn fetch_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.fetch_timeout).map_err(|e| {
            Error::invalid(
                "fetch_timeout",
                format!("Invalid duration: {} ({e})", self.fetch_timeout),
            )
        })
    }

    /// Number of parallel fetches.
    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(default_jobs)
    }

    /// Effective cache directory.
    ///
    /// `HOOKPIN_HOME` wins over `cache_dir`, which wins over the platform
    /// cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        self.cache_dir_with(std::env::var_os(HOME_ENV))
    }

    fn cache_dir_with(&self, home: Option<OsString>) -> Result<PathBuf> {
        if let Some(home) = home.filter(|h| !h.is_empty()) {
            return Ok(PathBuf::from(home));
        }

        if let Some(dir) = &self.cache_dir {
            let base = self.source.as_deref().and_then(Path::parent);
            return Ok(match base {
                Some(base) if dir.is_relative() => base.join(dir),
                _ => dir.clone(),
            });
        }

        dirs::cache_dir()
            .map(|dir| dir.join("hookpin"))
            .ok_or_else(|| Error::Internal {
                message: format!("Could not determine a cache directory; set {HOME_ENV}"),
            })
    }

    /// The repository cache at the effective cache directory.
    pub fn cache(&self) -> Result<RepoCache> {
        self.cache_dir().map(RepoCache::new)
    }

    /// Renders the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Internal {
            message: format!("Failed to serialize settings: {e}"),
        })
    }
}
