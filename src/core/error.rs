//! Error types for hookpin.
//!
//! This module defines all errors that can occur while loading,
//! validating and resolving a hook configuration.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in hookpin.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path where config was expected.
        path: PathBuf,
    },

    /// Failed to parse the configuration document.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Description of the parse error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Structurally invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Path of the offending field, e.g. `repos[0].hooks[1].id`.
        field: String,
        /// Description of why it's invalid.
        message: String,
    },

    // =========================================================================
    // Manifest errors
    // =========================================================================
    /// A hook id is not declared by the repository's manifest.
    #[error("Hook '{id}' is not declared by {repo} at {rev}")]
    UnknownHook {
        /// Repository the hook was activated from.
        repo: String,
        /// Pinned revision that was inspected.
        rev: String,
        /// The unknown hook id.
        id: String,
    },

    /// The fetched revision has no hook manifest.
    #[error("No .pre-commit-hooks.yaml in {repo} at {rev}")]
    ManifestNotFound {
        /// Repository that was fetched.
        repo: String,
        /// Pinned revision that was fetched.
        rev: String,
    },

    /// The hook manifest could not be parsed.
    #[error("Failed to parse hook manifest of {repo}: {message}")]
    ManifestParse {
        /// Repository whose manifest is malformed.
        repo: String,
        /// Description of the parse error.
        message: String,
    },

    // =========================================================================
    // Git errors
    // =========================================================================
    /// Git operation failed.
    #[error("Git operation failed: {operation} - {message}")]
    GitOperation {
        /// Name of the operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// Git operation timed out.
    #[error("Git {operation} timed out after {timeout}")]
    GitTimeout {
        /// Name of the operation that timed out.
        operation: String,
        /// Timeout duration as string.
        timeout: String,
    },

    /// Command not found.
    #[error("Command not found: {command}")]
    CommandNotFound {
        /// The command that wasn't found.
        command: String,
    },

    // =========================================================================
    // Usage errors
    // =========================================================================
    /// A command-line argument has an invalid value.
    #[error("Invalid argument {argument}: {message}")]
    InvalidArgument {
        /// The offending argument, e.g. `--filter`.
        argument: String,
        /// Description of why it's invalid.
        message: String,
    },

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration parse error.
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new structural validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new Git operation error.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is a user-correctable error.
    ///
    /// Every one of these is fixed by editing the configuration file.
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigParse { .. }
                | Self::ConfigInvalid { .. }
                | Self::UnknownHook { .. }
                | Self::ManifestNotFound { .. }
                | Self::InvalidArgument { .. }
        )
    }

    /// Returns an exit code appropriate for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::UnknownHook { .. }
            | Self::ManifestNotFound { .. }
            | Self::ManifestParse { .. } => 78, // EX_CONFIG
            Self::GitOperation { .. } | Self::GitTimeout { .. } => 65, // EX_DATAERR
            Self::InvalidArgument { .. } => 2, // same as clap usage errors
            _ => 1,
        }
    }
}
