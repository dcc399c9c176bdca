//! Repository file listing
//!
//! Inside a git work tree the tracked files are listed with `git ls-files`;
//! otherwise the directory is walked, skipping `.git`.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::git::{self, GitError};
use crate::paths::normalize_repo_path;

/// Errors from listing repository files
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Failed to walk repository: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Sorted, repo-relative `/`-separated paths of every file in the repository
pub fn repository_files(repo_root: &Path) -> Result<Vec<String>, ListError> {
    let mut files = if repo_root.join(".git").exists() {
        git::ls_files(repo_root)?
            .iter()
            .filter_map(|p| normalize_repo_path(p, None))
            .collect()
    } else {
        walk_files(repo_root)?
    };

    files.sort();
    files.dedup();
    tracing::debug!(root = %repo_root.display(), files = files.len(), "listed repository files");
    Ok(files)
}

/// Every regular file under `root`, relative to it
pub fn walk_files(root: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|e| !is_git_dir(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if let Some(path) = normalize_repo_path(&rel, None) {
            files.push(path);
        }
    }

    Ok(files)
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == ".git"
}
