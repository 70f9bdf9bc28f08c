//! The hook configuration document.
//!
//! A `.pre-commit-config.yaml` lists hook repositories, the revision each
//! one is pinned to, and which of its hooks are activated:
//!
//! ```yaml
//! repos:
//!   - repo: https://github.com/pre-commit/pre-commit-hooks
//!     rev: v4.6.0
//!     hooks:
//!       - id: trailing-whitespace
//!       - id: check-added-large-files
//!         args: ["--maxkb", "500"]
//! ```
//!
//! Loading parses the document and then checks its structural rules, so
//! a [`Config`] obtained from [`Config::from_yaml_str`] or
//! [`Config::load_from`] always satisfies them.

use crate::core::error::{Error, Result};
use crate::core::git::GitRepo;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".pre-commit-config.yaml";

/// A whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Hook repositories in document order.
    pub repos: Vec<RepositoryEntry>,
}

/// One hook repository pinned to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryEntry {
    /// Where the repository is fetched from (URL or local path).
    pub repo: String,
    /// Tag or commit the repository is pinned to.
    pub rev: String,
    /// Hooks activated from this repository, in order.
    pub hooks: Vec<HookActivation>,
}

/// A hook activated from a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookActivation {
    /// Hook id as declared by the repository's manifest.
    pub id: String,
    /// Extra arguments appended to the hook invocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl HookActivation {
    /// Creates an activation without extra arguments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: Vec::new(),
        }
    }

    /// Adds extra invocation arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl RepositoryEntry {
    /// Creates an entry for `repo` pinned at `rev`.
    pub fn new(
        repo: impl Into<String>,
        rev: impl Into<String>,
        hooks: impl IntoIterator<Item = HookActivation>,
    ) -> Self {
        Self {
            repo: repo.into(),
            rev: rev.into(),
            hooks: hooks.into_iter().collect(),
        }
    }

    /// Returns true if `rev` looks like a branch or a moving tag rather
    /// than a release tag or a commit id.
    ///
    /// Revisions without a dot that aren't pure hex are considered mutable.
    #[must_use]
    pub fn has_mutable_rev(&self) -> bool {
        !self.rev.contains('.') && !self.rev.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl Config {
    /// Parses and validates a configuration document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(Error::config_parse("document is empty"));
        }

        // The shape is decided on the untyped tree because serde also
        // accepts sequences for structs. Only the mapping form is written.
        let document: Value = serde_yaml::from_str(content).map_err(parse_error)?;
        let config = match &document {
            Value::Mapping(map) => {
                if let Some(repos) = map.get("repos") {
                    check_entries(repos)?;
                }
                serde_yaml::from_str::<Self>(content).map_err(parse_error)?
            },
            Value::Sequence(_) => {
                check_entries(&document)?;
                Self {
                    repos: serde_yaml::from_str(content).map_err(parse_error)?,
                }
            },
            Value::Null => return Err(Error::config_parse("document is empty")),
            _ => {
                return Err(Error::config_parse(
                    "expected a mapping with a `repos` key or a sequence of repositories",
                ))
            },
        };

        config.validate()?;
        config.warn_mutable_revs();
        Ok(config)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading hook configuration");
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::io(format!("read {}", path.display()), e),
        })?;

        Self::from_yaml_str(&content)
    }

    /// Finds the configuration file by searching up from `start`.
    ///
    /// The search does not leave the enclosing git repository, if any.
    pub fn find_config_file(start: &Path) -> Result<PathBuf> {
        let boundary = GitRepo::discover_from(start)
            .ok()
            .map(|repo| repo.root().to_path_buf());

        let mut current = start;
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Ok(config_path);
            }

            if boundary.as_deref().is_some_and(|root| same_dir(root, current)) {
                break;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: start.join(CONFIG_FILE_NAME),
        })
    }

    /// Checks the structural rules, stopping at the first violation.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.repos.iter().enumerate() {
            if entry.repo.trim().is_empty() {
                return Err(Error::invalid(format!("repos[{i}].repo"), "must not be empty"));
            }
            if entry.rev.trim().is_empty() {
                return Err(Error::invalid(format!("repos[{i}].rev"), "must not be empty"));
            }
            if entry.repo.trim_start().starts_with('-') {
                return Err(Error::invalid(
                    format!("repos[{i}].repo"),
                    "must not start with '-'",
                ));
            }
            if entry.rev.trim_start().starts_with('-') {
                return Err(Error::invalid(
                    format!("repos[{i}].rev"),
                    "must not start with '-'",
                ));
            }
            if entry.hooks.is_empty() {
                return Err(Error::invalid(
                    format!("repos[{i}].hooks"),
                    "must activate at least one hook",
                ));
            }

            let mut seen = HashSet::with_capacity(entry.hooks.len());
            for (j, hook) in entry.hooks.iter().enumerate() {
                if hook.id.trim().is_empty() {
                    return Err(Error::invalid(
                        format!("repos[{i}].hooks[{j}].id"),
                        "must not be empty",
                    ));
                }
                if !seen.insert(hook.id.as_str()) {
                    return Err(Error::invalid(
                        format!("repos[{i}].hooks[{j}].id"),
                        format!("duplicate hook id '{}' in {}", hook.id, entry.repo),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Serializes the document in canonical form.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Internal {
            message: format!("Failed to serialize config: {e}"),
        })
    }

    /// Total number of hook activations across all repositories.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.repos.iter().map(|r| r.hooks.len()).sum()
    }

    /// Iterates `(repository, hook)` pairs in document order.
    pub fn iter_hooks(&self) -> impl Iterator<Item = (&RepositoryEntry, &HookActivation)> + '_ {
        self.repos
            .iter()
            .flat_map(|repo| repo.hooks.iter().map(move |hook| (repo, hook)))
    }

    /// Finds the first activation of hook `id`.
    #[must_use]
    pub fn find_hook(&self, id: &str) -> Option<(&RepositoryEntry, &HookActivation)> {
        self.iter_hooks().find(|(_, hook)| hook.id == id)
    }

    fn warn_mutable_revs(&self) {
        for entry in self.repos.iter().filter(|e| e.has_mutable_rev()) {
            tracing::warn!(
                repo = %entry.repo,
                rev = %entry.rev,
                "rev appears to be a mutable reference (moving tag / branch); pin a tag or commit"
            );
        }
    }
}

fn parse_error(e: serde_yaml::Error) -> Error {
    Error::config_parse_with_source(e.to_string(), e)
}

/// Requires repository entries and hook activations to be mappings.
fn check_entries(repos: &Value) -> Result<()> {
    let Value::Sequence(entries) = repos else {
        return Ok(());
    };

    for (i, entry) in entries.iter().enumerate() {
        let Value::Mapping(entry) = entry else {
            return Err(Error::config_parse(format!(
                "repos[{i}]: expected a mapping with repo, rev and hooks"
            )));
        };
        if let Some(Value::Sequence(hooks)) = entry.get("hooks") {
            if let Some(j) = hooks.iter().position(|h| !h.is_mapping()) {
                return Err(Error::config_parse(format!(
                    "repos[{i}].hooks[{j}]: expected a mapping with an id"
                )));
            }
        }
    }
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    const EXAMPLE: &str = r#"
repos:
  - repo: https://github.com/pre-commit/pre-commit-hooks
    rev: v4.6.0
    hooks:
      - id: trailing-whitespace
      - id: end-of-file-fixer
  - repo: https://github.com/psf/black
    rev: 24.4.2
    hooks:
      - id: black
        args: ["--line-length", "100"]
"#;

    // =========================================================================
    // Loader tests
    // =========================================================================

    #[test]
    fn test_single_hook_without_args() {
        let config = Config::from_yaml_str(
            r#"
repos:
  - repo: https://example.com/hooks
    rev: v1.0.0
    hooks:
      - id: check-foo
"#,
        )
        .expect("parse");

        assert_eq!(
            config,
            Config {
                repos: vec![RepositoryEntry::new(
                    "https://example.com/hooks",
                    "v1.0.0",
                    [HookActivation::new("check-foo")],
                )],
            }
        );
        assert!(config.repos[0].hooks[0].args.is_empty());
    }

    #[test]
    fn test_args_keep_order() {
        let config = Config::from_yaml_str(
            r#"
repos:
  - repo: https://example.com/hooks
    rev: v1.0.0
    hooks:
      - id: check-foo
        args: ["--flag", "value"]
"#,
        )
        .expect("parse");

        assert_eq!(config.repos[0].hooks[0].args, vec!["--flag", "value"]);
    }

    #[test]
    fn test_document_order_preserved() {
        let config = Config::from_yaml_str(EXAMPLE).expect("parse");
        let ids: Vec<_> = config.iter_hooks().map(|(_, h)| h.id.as_str()).collect();
        assert_eq!(ids, vec!["trailing-whitespace", "end-of-file-fixer", "black"]);
        assert_eq!(config.hook_count(), 3);
    }

    #[test]
    fn test_bare_sequence_document() {
        let config = Config::from_yaml_str(
            r#"
- repo: https://example.com/hooks
  rev: v1.0.0
  hooks:
    - id: check-foo
"#,
        )
        .expect("parse");
        assert_eq!(config.repos.len(), 1);
        assert!(config.to_yaml_string().expect("serialize").starts_with("repos:"));
    }

    #[test]
    fn test_empty_repos_is_valid() {
        let config = Config::from_yaml_str("repos: []").expect("parse");
        assert!(config.repos.is_empty());
        assert_eq!(config.hook_count(), 0);
    }

    #[rstest]
    #[case::empty_document("")]
    #[case::only_comment("# nothing here\n")]
    #[case::missing_repo("repos:\n  - rev: v1\n    hooks:\n      - id: a\n")]
    #[case::missing_rev("repos:\n  - repo: r\n    hooks:\n      - id: a\n")]
    #[case::missing_hooks("repos:\n  - repo: r\n    rev: v1\n")]
    #[case::missing_id("repos:\n  - repo: r\n    rev: v1\n    hooks:\n      - args: [x]\n")]
    #[case::unknown_repo_key("repos:\n  - repo: r\n    rev: v1\n    pin: yes\n    hooks:\n      - id: a\n")]
    #[case::unknown_hook_key("repos:\n  - repo: r\n    rev: v1\n    hooks:\n      - id: a\n        stages: [push]\n")]
    #[case::rev_not_a_string("repos:\n  - repo: r\n    rev: 1.0\n    hooks:\n      - id: a\n")]
    #[case::args_not_a_list("repos:\n  - repo: r\n    rev: v1\n    hooks:\n      - id: a\n        args: --flag\n")]
    #[case::invalid_yaml("repos: [\n")]
    #[case::scalar_document("just a string")]
    #[case::nested_sequence("- []\n")]
    #[case::entry_as_sequence("- [r, v1, [{id: a}]]\n")]
    #[case::entries_as_sequences("repos:\n  - [r, v1, [{id: a}]]\n")]
    #[case::hook_as_sequence("repos:\n  - repo: r\n    rev: v1\n    hooks:\n      - [a]\n")]
    fn test_malformed_documents_fail_to_parse(#[case] yaml: &str) {
        let result = Config::from_yaml_str(yaml);
        assert!(
            matches!(result, Err(Error::ConfigParse { .. })),
            "expected parse error, got {result:?}"
        );
    }

    #[test]
    fn test_parse_error_names_missing_field() {
        let err = Config::from_yaml_str("repos:\n  - repo: r\n    hooks:\n      - id: a\n")
            .expect_err("should fail");
        assert!(err.to_string().contains("rev"), "unhelpful message: {err}");
    }

    // =========================================================================
    // Structural validation tests
    // =========================================================================

    #[rstest]
    #[case::empty_repo("repos:\n  - repo: ''\n    rev: v1\n    hooks:\n      - id: a\n", "repos[0].repo")]
    #[case::blank_rev("repos:\n  - repo: r\n    rev: '  '\n    hooks:\n      - id: a\n", "repos[0].rev")]
    #[case::option_like_rev("repos:\n  - repo: r\n    rev: '--upload-pack=touch x'\n    hooks:\n      - id: a\n", "repos[0].rev")]
    #[case::option_like_repo("repos:\n  - repo: '--template=/tmp'\n    rev: v1\n    hooks:\n      - id: a\n", "repos[0].repo")]
    #[case::no_hooks("repos:\n  - repo: r\n    rev: v1\n    hooks: []\n", "repos[0].hooks")]
    #[case::empty_id("repos:\n  - repo: r\n    rev: v1\n    hooks:\n      - id: a\n      - id: ''\n", "repos[0].hooks[1].id")]
    #[case::duplicate_id(
        "repos:\n  - repo: r\n    rev: v1\n    hooks:\n      - id: a\n  - repo: s\n    rev: v1\n    hooks:\n      - id: b\n      - id: b\n",
        "repos[1].hooks[1].id"
    )]
    fn test_structural_violations(#[case] yaml: &str, #[case] expected_field: &str) {
        match Config::from_yaml_str(yaml) {
            Err(Error::ConfigInvalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_same_id_in_different_repos_is_allowed() {
        let config = Config::from_yaml_str(
            r#"
repos:
  - repo: https://example.com/a
    rev: v1.0.0
    hooks:
      - id: lint
  - repo: https://example.com/b
    rev: v2.0.0
    hooks:
      - id: lint
"#,
        )
        .expect("parse");
        assert_eq!(config.hook_count(), 2);
    }

    #[test]
    fn test_validate_programmatic_config() {
        let mut config = Config {
            repos: vec![RepositoryEntry::new(
                "https://example.com/hooks",
                "v1.0.0",
                [HookActivation::new("a"), HookActivation::new("b")],
            )],
        };
        assert!(config.validate().is_ok());

        config.repos[0].hooks[1].id = "a".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigInvalid { .. })
        ));
    }

    // =========================================================================
    // Serialization tests
    // =========================================================================

    #[test]
    fn test_round_trip() {
        let config = Config::from_yaml_str(EXAMPLE).expect("parse");
        let yaml = config.to_yaml_string().expect("serialize");
        let reparsed = Config::from_yaml_str(&yaml).expect("reparse");
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_serialization_omits_empty_args() {
        let config = Config {
            repos: vec![RepositoryEntry::new(
                "https://example.com/hooks",
                "v1.0.0",
                [HookActivation::new("check-foo")],
            )],
        };
        let yaml = config.to_yaml_string().expect("serialize");
        assert!(!yaml.contains("args"));
    }

    #[test]
    fn test_round_trip_generated_configs() {
        use arbitrary::{Arbitrary, Unstructured};

        // Values chosen to exercise YAML quoting: reserved words, numbers,
        // leading dashes, colons, quotes and non-ASCII text.
        const TOKENS: &[&str] = &[
            "check-foo", "v1.0.0", "yes", "null", "~", "1.10", "0x1f", "--flag",
            "-", "a: b", "#hash", "'quoted'", "\"dq\"", "[x]", "ünïcode", "multi\nline",
        ];

        fn token(u: &mut Unstructured<'_>) -> arbitrary::Result<String> {
            Ok((*u.choose(TOKENS)?).to_string())
        }

        for seed in 0u8..32 {
            let bytes: Vec<u8> = (0..256u16)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed.wrapping_mul(17)))
                .collect();
            let mut u = Unstructured::new(&bytes);

            let mut repos = Vec::new();
            for r in 0..=u8::arbitrary(&mut u).expect("repo count") % 3 {
                let mut hooks = Vec::new();
                for h in 0..=u8::arbitrary(&mut u).expect("hook count") % 3 {
                    let mut args = Vec::new();
                    for _ in 0..u8::arbitrary(&mut u).expect("arg count") % 4 {
                        args.push(token(&mut u).expect("arg"));
                    }
                    hooks.push(HookActivation::new(format!("hook-{h}")).with_args(args));
                }
                repos.push(RepositoryEntry::new(
                    format!("https://example.com/{r}/{}", token(&mut u).expect("repo")),
                    token(&mut u).expect("rev"),
                    hooks,
                ));
            }

            let config = Config { repos };
            let yaml = config.to_yaml_string().expect("serialize");
            let reparsed = Config::from_yaml_str(&yaml)
                .unwrap_or_else(|e| panic!("seed {seed}: {e}\n{yaml}"));
            assert_eq!(config, reparsed, "seed {seed}");
        }
    }

    // =========================================================================
    // Query helper tests
    // =========================================================================

    #[test]
    fn test_find_hook() {
        let config = Config::from_yaml_str(EXAMPLE).expect("parse");
        let (repo, hook) = config.find_hook("black").expect("black is activated");
        assert_eq!(repo.repo, "https://github.com/psf/black");
        assert_eq!(hook.args, vec!["--line-length", "100"]);
        assert!(config.find_hook("flake8").is_none());
    }

    #[rstest]
    #[case("v1.0.0", false)]
    #[case("24.4.2", false)]
    #[case("a1b2c3d4e5f60718293a4b5c6d7e8f9012345678", false)]
    #[case("deadbeef", false)]
    #[case("main", true)]
    #[case("master", true)]
    #[case("stable", true)]
    fn test_mutable_rev_detection(#[case] rev: &str, #[case] mutable: bool) {
        let entry = RepositoryEntry::new("r", rev, [HookActivation::new("a")]);
        assert_eq!(entry.has_mutable_rev(), mutable);
    }

    // =========================================================================
    // File loading tests
    // =========================================================================

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, EXAMPLE).expect("write config");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.repos.len(), 2);
    }

    #[test]
    fn test_load_from_missing_file() {
        let temp = TempDir::new().expect("create temp dir");
        let result = Config::load_from(&temp.path().join(CONFIG_FILE_NAME));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let temp = TempDir::new().expect("create temp dir");
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).expect("create nested dir");
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "repos: []").expect("write config");

        let found = Config::find_config_file(&nested).expect("find config");
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_find_config_file_stops_at_git_root() {
        if !crate::core::executor::Executor::command_exists("git") {
            return;
        }
        let temp = TempDir::new().expect("create temp dir");
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "repos: []").expect("write config");

        let repo_dir = temp.path().join("project");
        std::fs::create_dir_all(repo_dir.join("src")).expect("create project");
        crate::core::git::testing::init_repo(&repo_dir);

        let result = Config::find_config_file(&repo_dir.join("src"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }
}
