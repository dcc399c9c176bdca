//! Bootstrap a SERVICEOWNERS file from CODEOWNERS

use std::fs;
use std::path::{Path, PathBuf};

/// Where CODEOWNERS is looked for, relative to the repo root
pub const CODEOWNERS_LOCATIONS: &[&str] = &["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS"];

/// Service used when nothing better can be inferred
pub const FALLBACK_SERVICE: &str = "service";

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("CODEOWNERS file not found (use --codeowners PATH)")]
    NotFound,

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// First CODEOWNERS file found in the usual locations
pub fn find_codeowners(repo_root: &Path) -> Option<PathBuf> {
    CODEOWNERS_LOCATIONS
        .iter()
        .map(|rel| repo_root.join(rel))
        .find(|p| p.is_file())
}

/// Convert CODEOWNERS text into SERVICEOWNERS text
pub fn convert_codeowners(text: &str) -> String {
    let mut out = vec![
        "# Generated from CODEOWNERS".to_string(),
        "# pattern\tservice".to_string(),
    ];

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(pattern), Some(first_owner)) = (parts.next(), parts.next()) else {
            // A pattern without owners unassigns it; nothing to map
            continue;
        };

        let service = service_from_pattern(pattern)
            .or_else(|| service_from_owner(first_owner))
            .unwrap_or_else(|| FALLBACK_SERVICE.to_string());
        out.push(format!("{}\t{}", pattern, service));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Last literal (non-glob) segment of a pattern, lower-cased
pub fn service_from_pattern(pattern: &str) -> Option<String> {
    let unified = pattern.trim().replace('\\', "/");
    unified
        .split('/')
        .filter(|seg| !seg.is_empty())
        .filter(|seg| !seg.contains(['*', '?', '[', ']']))
        .last()
        .map(|seg| seg.to_lowercase())
}

/// Team or user name of an owner: `@org/team-name` becomes `team_name`
pub fn service_from_owner(owner: &str) -> Option<String> {
    let owner = owner.trim();
    let owner = owner.strip_prefix('@').unwrap_or(owner);
    let name = match owner.split_once('/') {
        Some((_, team)) => team,
        None => owner,
    };
    let name = name.replace('-', "_").to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Read `codeowners` (or the first one found under `repo_root`) and convert it
pub fn generate(repo_root: &Path, codeowners: Option<&Path>) -> Result<(PathBuf, String), InitError> {
    let path = match codeowners {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(_) => return Err(InitError::NotFound),
        None => find_codeowners(repo_root).ok_or(InitError::NotFound)?,
    };

    let text = fs::read_to_string(&path).map_err(|source| InitError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "converting CODEOWNERS");
    Ok((path, convert_codeowners(&text)))
}

/// Write generated rules to `target`, refusing to clobber unless `force`
pub fn write_serviceowners(target: &Path, content: &str, force: bool) -> Result<(), InitError> {
    if target.exists() && !force {
        return Err(InitError::AlreadyExists(target.to_path_buf()));
    }
    fs::write(target, content).map_err(|source| InitError::Io {
        path: target.to_path_buf(),
        source,
    })
}
