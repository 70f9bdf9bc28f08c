//! Core functionality for hookpin.
//!
//! This module contains the main components:
//! - [`validator`]: Checks hook ids against repository manifests
//! - [`error`]: Error types and result handling
//! - [`executor`]: Child process execution
//! - [`git`]: Git repository operations

pub mod error;
pub mod executor;
pub mod git;
pub mod validator;
