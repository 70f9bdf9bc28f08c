//! Configuration presets for common project types.
//!
//! Presets are starting points written by `hookpin init`. Each one pins
//! well-known public hook repositories to a released tag.

use crate::config::{Config, HookActivation, RepositoryEntry};

/// Available preset names.
pub mod names {
    /// Generic file hygiene hooks only.
    pub const SAMPLE: &str = "sample";
    /// Python projects (ruff, mypy).
    pub const PYTHON: &str = "python";
    /// Node.js/TypeScript projects (prettier, eslint).
    pub const NODE: &str = "node";
    /// Rust projects (rustfmt, clippy).
    pub const RUST: &str = "rust";
    /// Go projects (gofmt, go vet, golangci-lint).
    pub const GO: &str = "go";
}

const PRE_COMMIT_HOOKS: &str = "https://github.com/pre-commit/pre-commit-hooks";
const PRE_COMMIT_HOOKS_REV: &str = "v4.6.0";

/// Returns a list of available preset names.
#[must_use]
pub const fn available() -> &'static [&'static str] {
    &[
        names::SAMPLE,
        names::PYTHON,
        names::NODE,
        names::RUST,
        names::GO,
    ]
}

/// Returns a description for a preset.
#[must_use]
pub fn description(name: &str) -> &'static str {
    match name {
        names::SAMPLE => "Whitespace, end-of-file and YAML checks",
        names::PYTHON => "Python projects (ruff, ruff-format, mypy)",
        names::NODE => "Node.js/TypeScript projects (prettier, eslint)",
        names::RUST => "Rust projects (cargo fmt, cargo check, clippy)",
        names::GO => "Go projects (gofmt, go vet, go mod tidy, golangci-lint)",
        _ => "Unknown preset",
    }
}

/// Builds the configuration for preset `name`.
#[must_use]
pub fn config(name: &str) -> Option<Config> {
    let extra = match name {
        names::SAMPLE => vec![],
        names::PYTHON => vec![
            RepositoryEntry::new(
                "https://github.com/astral-sh/ruff-pre-commit",
                "v0.6.9",
                [
                    HookActivation::new("ruff").with_args(["--fix"]),
                    HookActivation::new("ruff-format"),
                ],
            ),
            RepositoryEntry::new(
                "https://github.com/pre-commit/mirrors-mypy",
                "v1.11.2",
                [HookActivation::new("mypy")],
            ),
        ],
        names::NODE => vec![
            RepositoryEntry::new(
                "https://github.com/pre-commit/mirrors-prettier",
                "v3.1.0",
                [HookActivation::new("prettier")],
            ),
            RepositoryEntry::new(
                "https://github.com/pre-commit/mirrors-eslint",
                "v9.12.0",
                [HookActivation::new("eslint")],
            ),
        ],
        names::RUST => vec![RepositoryEntry::new(
            "https://github.com/doublify/pre-commit-rust",
            "v1.0",
            [
                HookActivation::new("fmt"),
                HookActivation::new("cargo-check"),
                HookActivation::new("clippy").with_args(["--", "-D", "warnings"]),
            ],
        )],
        names::GO => vec![
            RepositoryEntry::new(
                "https://github.com/dnephin/pre-commit-golang",
                "v0.5.1",
                [
                    HookActivation::new("go-fmt"),
                    HookActivation::new("go-vet"),
                    HookActivation::new("go-mod-tidy"),
                ],
            ),
            RepositoryEntry::new(
                "https://github.com/golangci/golangci-lint",
                "v1.61.0",
                [HookActivation::new("golangci-lint")],
            ),
        ],
        _ => return None,
    };

    let mut repos = vec![hygiene(name == names::SAMPLE)];
    repos.extend(extra);
    Some(Config { repos })
}

fn hygiene(with_yaml: bool) -> RepositoryEntry {
    let mut hooks = vec![
        HookActivation::new("trailing-whitespace"),
        HookActivation::new("end-of-file-fixer"),
    ];
    if with_yaml {
        hooks.push(HookActivation::new("check-yaml"));
    }
    hooks.push(HookActivation::new("check-added-large-files"));
    RepositoryEntry::new(PRE_COMMIT_HOOKS, PRE_COMMIT_HOOKS_REV, hooks)
}
