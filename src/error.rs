//! Top-level error for command execution

use std::path::PathBuf;

use serviceowners_core::ParseError;

use crate::config::ConfigError;
use crate::files::ListError;
use crate::git::GitError;
use crate::init::InitError;
use crate::services::CatalogError;

/// Anything that stops a command; printed as `error: <msg>` with exit code 2
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("SERVICEOWNERS file not found: {0}")]
    MissingRules(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error("Failed to read stdin: {0}")]
    Stdin(std::io::Error),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
