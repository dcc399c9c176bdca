//! Command implementations behind the `sowners` binary
//!
//! Each command returns its rendered output and an exit code so the binary
//! only has to print and exit.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serviceowners_core::{
    parse_rules_lenient, resolve_impact, LintOptions, Linter, OwnershipIndex, ParseError,
    ServiceCatalog,
};

use crate::config::{CliOverrides, EffectiveSettings, Settings, REPO_CONFIG_FILE};
use crate::error::CliError;
use crate::files::repository_files;
use crate::git;
use crate::init;
use crate::paths::{normalize_paths, normalize_repo_path};
use crate::report::{ImpactFormat, ImpactView, LintFormat, LintOutput, OwnerFormat, OwnerOutput};
use crate::services::load_catalog;

/// Command succeeded
pub const EXIT_OK: i32 = 0;

/// Usage, parse, git or lint failure
pub const EXIT_FAILURE: i32 = 2;

/// Unmapped files found with `fail_on_unmapped`
pub const EXIT_UNMAPPED: i32 = 3;

/// Rendered command result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub exit_code: i32,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            exit_code: EXIT_OK,
        }
    }
}

/// Repository root: the explicit one, else the git top level, else `cwd`
pub fn resolve_repo_root(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(root) = explicit {
        return if root.is_absolute() {
            root.to_path_buf()
        } else {
            cwd.join(root)
        };
    }
    match git::find_repo_root(cwd) {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!(error = %e, "not in a git work tree, using current directory");
            cwd.to_path_buf()
        }
    }
}

/// Loaded rules, catalog and settings for one repository
#[derive(Debug)]
pub struct Workspace {
    pub repo_root: PathBuf,
    pub settings: Settings,
    pub index: OwnershipIndex,
    /// Lines skipped by a lenient load
    pub parse_errors: Vec<ParseError>,
    pub catalog: ServiceCatalog,
}

impl Workspace {
    /// Effective settings for `repo_root`
    pub fn settings(repo_root: &Path, overrides: &CliOverrides) -> Result<EffectiveSettings, CliError> {
        Ok(EffectiveSettings::build(
            Some(&repo_root.join(REPO_CONFIG_FILE)),
            Some(overrides),
        )?)
    }

    /// Load rules and catalog, failing on the first bad rules line
    pub fn load(repo_root: &Path, settings: Settings) -> Result<Self, CliError> {
        Self::load_with(repo_root, settings, false)
    }

    /// Load rules and catalog, collecting bad rules lines instead of failing
    pub fn load_lenient(repo_root: &Path, settings: Settings) -> Result<Self, CliError> {
        Self::load_with(repo_root, settings, true)
    }

    fn load_with(repo_root: &Path, settings: Settings, lenient: bool) -> Result<Self, CliError> {
        let rules_path = repo_root.join(&settings.serviceowners_file);
        if !rules_path.is_file() {
            return Err(CliError::MissingRules(rules_path));
        }
        let text = fs::read_to_string(&rules_path).map_err(|source| CliError::Read {
            path: rules_path.clone(),
            source,
        })?;

        let source_name = settings.serviceowners_file.as_str();
        let (index, parse_errors) = if lenient {
            let (rules, errors) = parse_rules_lenient(&text, source_name);
            (OwnershipIndex::with_source(source_name, rules), errors)
        } else {
            (OwnershipIndex::parse(&text, source_name)?, Vec::new())
        };

        let catalog = load_catalog(&repo_root.join(&settings.services_file))?;

        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            settings,
            index,
            parse_errors,
            catalog,
        })
    }
}

/// `who-owns`
pub fn who_owns(ws: &Workspace, path: &str, explain: bool, format: OwnerFormat) -> Result<Outcome, CliError> {
    let normalized = normalize_repo_path(path, Some(&ws.repo_root))
        .ok_or_else(|| CliError::InvalidPath(path.to_string()))?;

    let explanation = ws.index.explain(&normalized);
    let output = OwnerOutput::new(&explanation, &ws.index, &ws.catalog, explain);
    Ok(Outcome::ok(output.render(format)?))
}

/// Where `impacted` gets its changed paths
#[derive(Debug, Clone)]
pub enum ChangeSource {
    /// `git diff --name-only <range>`
    Diff(String),
    /// Newline-delimited paths
    Lines(String),
}

impl ChangeSource {
    /// Read all of stdin as the change list
    pub fn from_stdin() -> Result<Self, CliError> {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(CliError::Stdin)?;
        Ok(ChangeSource::Lines(buf))
    }

    fn changed_paths(&self, repo_root: &Path) -> Result<Vec<String>, CliError> {
        match self {
            ChangeSource::Diff(range) => Ok(git::diff_name_only(repo_root, range)?),
            ChangeSource::Lines(text) => Ok(text.lines().map(str::to_string).collect()),
        }
    }

    fn diff(&self) -> Option<&str> {
        match self {
            ChangeSource::Diff(range) => Some(range),
            ChangeSource::Lines(_) => None,
        }
    }
}

/// `impacted`
pub fn impacted(
    ws: &Workspace,
    changes: &ChangeSource,
    format: ImpactFormat,
    show_files: bool,
) -> Result<Outcome, CliError> {
    let changed = normalize_paths(changes.changed_paths(&ws.repo_root)?, Some(&ws.repo_root));
    let report = resolve_impact(&ws.index, &changed);

    let view = ImpactView {
        diff: changes.diff(),
        show_files,
        max_files: ws.settings.impacted.max_files,
        ..ImpactView::new(&report, &ws.catalog)
    };
    let output = view.render(format)?;

    let exit_code = if ws.settings.impacted.fail_on_unmapped && report.has_unmapped() {
        EXIT_UNMAPPED
    } else {
        EXIT_OK
    };
    Ok(Outcome { output, exit_code })
}

/// `lint`
///
/// Catalog checks run only when the catalog has entries; the file listing
/// is only gathered when a check needs it.
pub fn lint(ws: &Workspace, format: LintFormat) -> Result<Outcome, CliError> {
    let options = LintOptions {
        strict: ws.settings.lint.strict,
        check_matches: ws.settings.lint.check_matches,
        check_overlaps: ws.settings.lint.check_overlaps,
    };

    let files = if options.check_matches || options.check_overlaps {
        Some(repository_files(&ws.repo_root)?)
    } else {
        None
    };

    let mut linter = Linter::new(options).with_parse_errors(&ws.parse_errors);
    if !ws.catalog.is_empty() {
        linter = linter.with_catalog(&ws.catalog);
    }
    if let Some(files) = &files {
        linter = linter.with_files(files);
    }
    let report = linter.lint(&ws.index);

    let output = LintOutput::new(&report, ws.index.source_name()).render(format)?;
    let exit_code = if report.is_failure() { EXIT_FAILURE } else { EXIT_OK };
    Ok(Outcome { output, exit_code })
}

/// `init`
pub fn init(
    repo_root: &Path,
    settings: &Settings,
    codeowners: Option<&Path>,
    write: bool,
    force: bool,
) -> Result<Outcome, CliError> {
    let (_, content) = init::generate(repo_root, codeowners)?;
    if !write {
        return Ok(Outcome::ok(content));
    }

    let target = repo_root.join(&settings.serviceowners_file);
    init::write_serviceowners(&target, &content, force)?;
    Ok(Outcome::ok(format!("Wrote {}", target.display())))
}

/// `config`
pub fn config(effective: &EffectiveSettings) -> Result<Outcome, CliError> {
    Ok(Outcome::ok(effective.to_json()?))
}
