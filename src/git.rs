//! Thin wrappers over the `git` CLI

use std::path::{Path, PathBuf};
use std::process::Command;

/// Errors from invoking git
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git executable not found")]
    NotFound,

    #[error("git {args} failed: {message}")]
    Failed { args: String, message: String },

    #[error("Failed to run git: {0}")]
    Io(#[from] std::io::Error),
}

/// Run git in `cwd` and return stdout
pub fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    tracing::debug!(cwd = %cwd.display(), ?args, "running git");

    let output = Command::new("git").args(args).current_dir(cwd).output();
    match output {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => Err(GitError::Failed {
            args: args.join(" "),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(GitError::NotFound),
        Err(e) => Err(GitError::Io(e)),
    }
}

/// Top-level directory of the work tree containing `cwd`
pub fn find_repo_root(cwd: &Path) -> Result<PathBuf, GitError> {
    let out = run_git(cwd, &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(out.trim()))
}

/// Paths changed in `range` (`git diff --name-only`)
pub fn diff_name_only(repo_root: &Path, range: &str) -> Result<Vec<String>, GitError> {
    let out = run_git(repo_root, &["diff", "--name-only", range])?;
    Ok(split_lines(&out))
}

/// Tracked files (`git ls-files -z`)
pub fn ls_files(repo_root: &Path) -> Result<Vec<String>, GitError> {
    let out = run_git(repo_root, &["ls-files", "-z"])?;
    Ok(split_nul(&out))
}

fn split_lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn split_nul(out: &str) -> Vec<String> {
    out.split('\0')
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_skips_blanks() {
        assert_eq!(
            split_lines("a/b.rs\n\n  c.md  \n"),
            vec!["a/b.rs".to_string(), "c.md".to_string()]
        );
    }

    #[test]
    fn test_split_nul_keeps_spaces() {
        assert_eq!(
            split_nul("dir/with space.txt\0b\0"),
            vec!["dir/with space.txt".to_string(), "b".to_string()]
        );
    }
}
