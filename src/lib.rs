//! ServiceOwners - repo-native service ownership mapping
//!
//! Binds the matching engine in `serviceowners-core` to a repository:
//! layered settings, the services catalog, git and file listing, and the
//! renderings behind the `sowners` CLI.

pub mod app;
pub mod config;
pub mod error;
pub mod files;
pub mod git;
pub mod init;
pub mod logging;
pub mod paths;
pub mod report;
pub mod services;

pub use app::{Outcome, Workspace, EXIT_FAILURE, EXIT_OK, EXIT_UNMAPPED};
pub use config::{CliOverrides, EffectiveSettings, Settings};
pub use error::CliError;
