//! CLI command implementations.

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::core::error::{Error, Result};
use crate::core::validator::Validator;
use crate::manifest::GitManifests;
use crate::presets;
use crate::settings::Settings;
use console::style;
use glob::Pattern;
use indicatif::HumanBytes;
use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Validate the configuration, and unless `offline`, its hook ids.
pub fn validate(config_path: Option<&Path>, offline: bool) -> Result<ExitCode> {
    let (path, config) = load(config_path)?;

    if offline {
        eprintln!(
            "{} {} is valid ({} repositories, {} hooks)",
            style("✓").green(),
            path.display(),
            config.repos.len(),
            config.hook_count()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::load_or_default()?;
    let source = GitManifests::new(settings.cache()?, settings.fetch_timeout()?);
    let validator = Validator::new(source)
        .jobs(settings.jobs())
        .show_progress(std::io::stderr().is_terminal());

    let report = runtime()?.block_on(validator.validate(&config))?;

    if report.success() {
        eprintln!(
            "{} All {} hooks found in {} repositories in {:?}",
            style("✓").green().bold(),
            report.declared_count(),
            report.repos_checked,
            report.duration
        );
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!(
        "{} {} hook(s) not declared by their repository",
        style("✗").red().bold(),
        report.unknown_count()
    );
    for hook in report.unknown_hooks() {
        eprintln!(
            "  {} {} @ {}",
            style(&hook.id).cyan(),
            hook.repo,
            hook.rev
        );
    }
    eprintln!();

    report.into_result().map(|_| ExitCode::FAILURE)
}

/// List repositories and hook activations.
pub fn list(config_path: Option<&Path>, json: bool, filter: Option<&str>) -> Result<ExitCode> {
    let (_, config) = load(config_path)?;

    let pattern = filter
        .map(Pattern::new)
        .transpose()
        .map_err(|e| Error::InvalidArgument {
            argument: "--filter".to_string(),
            message: e.to_string(),
        })?;
    let config = filtered(&config, pattern.as_ref());

    let output = if json {
        let mut json = serde_json::to_string_pretty(&config).map_err(|e| Error::Internal {
            message: format!("Failed to serialize config: {e}"),
        })?;
        json.push('\n');
        json
    } else {
        render_list(&config)
    };

    std::io::stdout()
        .write_all(output.as_bytes())
        .map_err(|e| Error::io("write output", e))?;

    if !json {
        eprintln!(
            "{} hooks in {} repositories",
            config.hook_count(),
            config.repos.len()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Keeps the hooks whose id matches `pattern`, dropping emptied repositories.
fn filtered(config: &Config, pattern: Option<&Pattern>) -> Config {
    let Some(pattern) = pattern else {
        return config.clone();
    };

    let repos = config
        .repos
        .iter()
        .filter_map(|entry| {
            let mut entry = entry.clone();
            entry.hooks.retain(|hook| pattern.matches(&hook.id));
            (!entry.hooks.is_empty()).then_some(entry)
        })
        .collect();

    Config { repos }
}

fn render_list(config: &Config) -> String {
    let mut out = String::new();
    for entry in &config.repos {
        let _ = writeln!(out, "{} @ {}", entry.repo, entry.rev);
        for hook in &entry.hooks {
            if hook.args.is_empty() {
                let _ = writeln!(out, "  {}", hook.id);
            } else {
                let _ = writeln!(out, "  {} {}", hook.id, hook.args.join(" "));
            }
        }
    }
    out
}

/// Rewrite the configuration in canonical form.
pub fn fmt(config_path: Option<&Path>, check: bool) -> Result<ExitCode> {
    let path = resolve(config_path)?;
    let content = read(&path)?;
    let config = Config::from_yaml_str(&content)?;
    let canonical = config.to_yaml_string()?;

    if content == canonical {
        eprintln!("{} {} is already formatted", style("✓").green(), path.display());
        return Ok(ExitCode::SUCCESS);
    }

    if check {
        eprintln!("{} {} is not formatted", style("✗").red(), path.display());
        eprintln!("  Run: hookpin fmt");
        return Ok(ExitCode::FAILURE);
    }

    if content.lines().any(|l| l.trim_start().starts_with('#')) {
        tracing::warn!(path = %path.display(), "comments are not preserved by formatting");
    }

    std::fs::write(&path, canonical).map_err(|e| Error::io("write config", e))?;
    eprintln!("{} Formatted {}", style("✓").green(), path.display());

    Ok(ExitCode::SUCCESS)
}

/// Write a preset configuration.
pub fn init(config_path: Option<&Path>, preset: Option<&str>, force: bool) -> Result<ExitCode> {
    let path = config_path.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), Path::to_path_buf);

    if path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    let name = preset.unwrap_or(presets::names::SAMPLE);
    let config = presets::config(name)
        .ok_or_else(|| Error::invalid("preset", format!("unknown preset '{name}'")))?;

    std::fs::write(&path, config.to_yaml_string()?).map_err(|e| Error::io("write config", e))?;

    eprintln!("{} Created {}", style("✓").green(), path.display());
    eprintln!("  Using preset: {name} - {}", presets::description(name));

    eprintln!("\nNext steps:");
    eprintln!("  1. Review the pinned revisions in {}", path.display());
    eprintln!("  2. Run: hookpin validate");

    Ok(ExitCode::SUCCESS)
}

/// Remove fetched hook repositories.
pub fn clean(yes: bool) -> Result<ExitCode> {
    let settings = Settings::load_or_default()?;
    let cache = settings.cache()?;

    if !cache.root().exists() {
        eprintln!(
            "{} Nothing to clean at {}",
            style("•").cyan(),
            cache.root().display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let usage = cache.usage();
    let summary = format!(
        "{} cached repositories ({}) at {}",
        usage.entries,
        HumanBytes(usage.bytes),
        cache.root().display()
    );

    if !yes {
        if !std::io::stdin().is_terminal() {
            eprintln!("{} Would remove {summary}", style("!").yellow());
            eprintln!("  Use --yes to confirm.");
            return Ok(ExitCode::FAILURE);
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove {summary}?"))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal {
                message: format!("Failed to read confirmation: {e}"),
            })?;
        if !confirmed {
            eprintln!("{} Aborted", style("•").cyan());
            return Ok(ExitCode::SUCCESS);
        }
    }

    cache.clean()?;
    eprintln!("{} Removed {summary}", style("✓").green());

    Ok(ExitCode::SUCCESS)
}

/// Show the effective tool settings.
pub fn settings(raw: bool) -> Result<ExitCode> {
    let settings = Settings::load_or_default()?;

    match &settings.source {
        Some(path) => eprintln!("Settings file: {}", path.display()),
        None => eprintln!("Settings file: none, using defaults"),
    }

    let output = if raw {
        settings.to_toml_string()?
    } else {
        format!(
            "cache_dir: {}\nfetch_timeout: {}\njobs: {}\n",
            settings.cache_dir()?.display(),
            humantime::format_duration(settings.fetch_timeout()?),
            settings.jobs()
        )
    };

    std::io::stdout()
        .write_all(output.as_bytes())
        .map_err(|e| Error::io("write output", e))?;

    Ok(ExitCode::SUCCESS)
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "hookpin",
        &mut std::io::stdout(),
    );
}

/// Loads the explicit document, or the one found from the working directory.
fn load(config_path: Option<&Path>) -> Result<(PathBuf, Config)> {
    let path = resolve(config_path)?;
    let config = Config::load_from(&path)?;
    tracing::debug!(path = %path.display(), repos = config.repos.len(), "loaded configuration");
    Ok((path, config))
}

fn resolve(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
            Config::find_config_file(&cwd)
        },
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ConfigNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::io(format!("read {}", path.display()), e),
    })
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create runtime: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HookActivation, RepositoryEntry};
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config {
            repos: vec![
                RepositoryEntry::new(
                    "https://example.com/hooks",
                    "v1.0.0",
                    [
                        HookActivation::new("check-foo"),
                        HookActivation::new("check-bar").with_args(["--flag", "value"]),
                    ],
                ),
                RepositoryEntry::new(
                    "https://example.com/fmt",
                    "v2.1.0",
                    [HookActivation::new("format")],
                ),
            ],
        }
    }

    #[test]
    fn test_render_list() {
        insta::assert_snapshot!(render_list(&config()), @r###"
        https://example.com/hooks @ v1.0.0
          check-foo
          check-bar --flag value
        https://example.com/fmt @ v2.1.0
          format
        "###);
    }

    #[test]
    fn test_filter_drops_emptied_repositories() {
        let pattern = Pattern::new("check-*").expect("pattern");
        let config = filtered(&config(), Some(&pattern));

        assert_eq!(config.repos.len(), 1);
        let ids: Vec<_> = config.iter_hooks().map(|(_, h)| h.id.as_str()).collect();
        assert_eq!(ids, vec!["check-foo", "check-bar"]);
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        assert_eq!(filtered(&config(), None), config());
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(config()).expect("to json");
        assert_eq!(value["repos"][0]["hooks"][1]["args"][1], "value");
        assert!(value["repos"][0]["hooks"][0].get("args").is_none());
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let result = read(Path::new("/nonexistent/.pre-commit-config.yaml"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }
}
