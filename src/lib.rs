//! # hookpin
//!
//! Load, validate and normalize pre-commit hook configurations.
//!
//! A `.pre-commit-config.yaml` pins third-party hook repositories to
//! revisions and activates hooks from them by id. `hookpin` parses that
//! document, enforces its structural rules, writes it back in canonical
//! form, and checks every activated id against the manifest of the pinned
//! revision. It never runs hooks.
//!
//! ## Features
//!
//! - **Strict loading**: unknown keys, missing fields and wrong types are
//!   parse errors; empty ids and duplicate ids within a repository are
//!   rejected with the path of the offending field
//! - **Lossless round trip**: serializing and re-parsing yields the same
//!   configuration
//! - **Manifest checks**: pinned revisions are fetched with git into an
//!   on-disk cache, concurrently, and each hook id is looked up
//!
//! ## Example
//!
//! ```rust,no_run
//! use hookpin::manifest::cache::RepoCache;
//! use hookpin::{Config, GitManifests, Validator};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> hookpin::Result<()> {
//!     let config = Config::load_from(Path::new(".pre-commit-config.yaml"))?;
//!
//!     let source = GitManifests::new(RepoCache::new("/tmp/hookpin"), Duration::from_secs(60));
//!     let report = Validator::new(source).validate(&config).await?;
//!
//!     report.into_result()?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hookpin/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cli;
pub mod config;
pub mod core;
pub mod manifest;
pub mod presets;
pub mod settings;

// Re-export main types for convenience
pub use config::{Config, HookActivation, RepositoryEntry};
pub use core::error::{Error, Result};
pub use core::validator::{HookResult, ValidationReport, Validator};
pub use manifest::{GitManifests, Manifest, ManifestSource};
pub use settings::Settings;
