//! Command-line interface for hookpin.
//!
//! This module provides the `hookpin` CLI with subcommands for:
//! - `validate`: Check the document and its hook ids
//! - `list`: List repositories and activated hooks
//! - `fmt`: Rewrite the document in canonical form
//! - `init`: Write a preset configuration
//! - `clean`: Remove fetched hook repositories
//! - `settings`: Show tool settings

mod commands;

use crate::core::error::Result;
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Pin, validate and normalize pre-commit hook configurations.
#[derive(Debug, Parser)]
#[command(
    name = "hookpin",
    author,
    version,
    about = "Pin, validate and normalize pre-commit hook configurations",
    long_about = r#"
hookpin reads a .pre-commit-config.yaml, checks that it is well formed,
and checks that every activated hook id is declared by the manifest of
the repository revision it is pinned to.

Quick start:
  hookpin init               # Write a sample configuration
  hookpin validate           # Check it, fetching hook manifests
  hookpin validate --offline # Structural checks only

Environment variables:
  HOOKPIN_CONFIG   Path of the configuration document
  HOOKPIN_HOME     Cache directory for fetched hook repositories
  RUST_LOG         Log filter (overrides -v/-q)
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration document (default: search upward for .pre-commit-config.yaml).
    #[arg(short, long, global = true, value_name = "PATH", env = "HOOKPIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate the configuration and its hook ids.
    #[command(visible_alias = "v")]
    Validate {
        /// Skip fetching manifests; check structure only.
        #[arg(long)]
        offline: bool,
    },

    /// List repositories and activated hooks.
    #[command(visible_alias = "l")]
    List {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Only show hooks whose id matches a glob, e.g. `check-*`.
        #[arg(short, long, value_name = "GLOB")]
        filter: Option<String>,
    },

    /// Rewrite the configuration in canonical form. Comments are not kept.
    Fmt {
        /// Only report whether the file is already canonical.
        #[arg(long)]
        check: bool,
    },

    /// Write a preset configuration.
    #[command(visible_alias = "i")]
    Init {
        /// Preset to write.
        #[arg(
            short,
            long,
            value_parser = PossibleValuesParser::new(crate::presets::available().iter().copied())
        )]
        preset: Option<String>,

        /// Overwrite an existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Remove fetched hook repositories.
    Clean {
        /// Don't ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the effective tool settings.
    Settings {
        /// Output TOML.
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    setup_color(cli.color);

    let config = cli.config.as_deref();

    // No subcommand means a full validation.
    match cli.command {
        Some(Commands::Validate { offline }) => commands::validate(config, offline),
        Some(Commands::List { json, filter }) => commands::list(config, json, filter.as_deref()),
        Some(Commands::Fmt { check }) => commands::fmt(config, check),
        Some(Commands::Init { preset, force }) => commands::init(config, preset.as_deref(), force),
        Some(Commands::Clean { yes }) => commands::clean(yes),
        Some(Commands::Settings { raw }) => commands::settings(raw),
        Some(Commands::Completions { shell }) => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
        None => commands::validate(config, false),
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {},
    }
}
