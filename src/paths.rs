//! Repo-relative path normalization for user-supplied paths

use std::collections::HashSet;
use std::path::Path;

/// Normalize a path to the `a/b/c` form rules are matched against.
///
/// Surrounding quotes are trimmed, backslashes become `/`, absolute paths
/// under `repo_root` are made relative to it, and empty or `.` segments are
/// removed. Returns `None` for paths that normalize to nothing.
pub fn normalize_repo_path(path: &str, repo_root: Option<&Path>) -> Option<String> {
    let mut p = path.trim();
    for quote in ['"', '\''] {
        if p.len() >= 2 && p.starts_with(quote) && p.ends_with(quote) {
            p = &p[1..p.len() - 1];
        }
    }

    let mut unified = p.replace('\\', "/");
    if let Some(root) = repo_root {
        let candidate = Path::new(&unified);
        if candidate.is_absolute() {
            if let Ok(rel) = candidate.strip_prefix(root) {
                unified = rel.to_string_lossy().replace('\\', "/");
            }
        }
    }

    let segments: Vec<&str> = unified
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Normalize every path, dropping blanks and duplicates while keeping
/// first-seen order
pub fn normalize_paths<I, S>(paths: I, repo_root: Option<&Path>) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter_map(|p| normalize_repo_path(p.as_ref(), repo_root))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(path: &str) -> Option<String> {
        normalize_repo_path(path, None)
    }

    #[test]
    fn test_normalize_repo_path() {
        assert_eq!(norm("./apps/api/x.py").as_deref(), Some("apps/api/x.py"));
        assert_eq!(norm("././a").as_deref(), Some("a"));
        assert_eq!(norm("/apps//api/").as_deref(), Some("apps/api"));
        assert_eq!(norm("apps\\web\\a.ts").as_deref(), Some("apps/web/a.ts"));
        assert_eq!(norm("  README.md ").as_deref(), Some("README.md"));
        assert_eq!(norm("\"docs/a b.md\"").as_deref(), Some("docs/a b.md"));
        assert_eq!(norm("'x.txt'").as_deref(), Some("x.txt"));
        assert_eq!(norm("./"), None);
        assert_eq!(norm(""), None);
    }

    #[test]
    fn test_absolute_path_under_root() {
        let root = Path::new("/work/repo");
        assert_eq!(
            normalize_repo_path("/work/repo/apps/api/main.py", Some(root)).as_deref(),
            Some("apps/api/main.py")
        );
        // Outside the root only the leading slash goes
        assert_eq!(
            normalize_repo_path("/elsewhere/a.py", Some(root)).as_deref(),
            Some("elsewhere/a.py")
        );
    }

    #[test]
    fn test_normalize_paths_dedups_in_order() {
        let paths = normalize_paths(["b.rs", "./a.rs", "", "  ", "b.rs", "a.rs"], None);
        assert_eq!(paths, vec!["b.rs".to_string(), "a.rs".to_string()]);
    }
}
