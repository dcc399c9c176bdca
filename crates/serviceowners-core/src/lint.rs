//! Static checks over the SERVICEOWNERS rule list
//!
//! Cheap checks always run: pattern syntax, duplicate patterns, empty
//! service names and, when a catalog is supplied, unknown or unreachable
//! services. `check_matches` and `check_overlaps` opt into the expensive
//! passes; `check_matches` and the live half of `check_overlaps` need a
//! file listing.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::ServiceCatalog;
use crate::index::OwnershipIndex;
use crate::parser::ParseError;

/// Examples kept in an overlapping-files finding
const MAX_OVERLAP_EXAMPLES: usize = 25;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    /// A line that does not parse or a pattern that does not compile
    InvalidPattern,
    /// A rule with no service name
    EmptyService,
    /// The same pattern appears more than once
    DuplicatePattern,
    /// A rule names a service the catalog does not know
    UnknownService,
    /// A catalog service has no owners and no contact
    ServiceHasNoContact,
    /// A rule matches no file in the listing
    UnusedRule,
    /// Every path a rule matches is claimed by a later rule
    ShadowedRule,
    /// Two rules for different services can match the same path
    OverlappingRules,
    /// Listed files matched by rules of more than one service
    OverlappingFiles,
    /// A check needed a file listing that was not provided
    MissingFileListing,
}

impl FindingKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::InvalidPattern => "INVALID_PATTERN",
            FindingKind::EmptyService => "EMPTY_SERVICE",
            FindingKind::DuplicatePattern => "DUPLICATE_PATTERN",
            FindingKind::UnknownService => "UNKNOWN_SERVICE",
            FindingKind::ServiceHasNoContact => "SERVICE_HAS_NO_CONTACT",
            FindingKind::UnusedRule => "UNUSED_RULE",
            FindingKind::ShadowedRule => "SHADOWED_RULE",
            FindingKind::OverlappingRules => "OVERLAPPING_RULES",
            FindingKind::OverlappingFiles => "OVERLAPPING_FILES",
            FindingKind::MissingFileListing => "MISSING_FILE_LISTING",
        }
    }

    fn default_severity(&self) -> Severity {
        match self {
            FindingKind::InvalidPattern | FindingKind::EmptyService | FindingKind::MissingFileListing => {
                Severity::Error
            }
            FindingKind::OverlappingRules | FindingKind::OverlappingFiles => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// One lint result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,

    /// Position of the offending rule in the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<usize>,

    /// Source line of the offending rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Finding {
    fn new(kind: FindingKind, message: String) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            rule_index: None,
            line: None,
            message,
            hint: None,
        }
    }

    fn for_rule(kind: FindingKind, index: &OwnershipIndex, rule_index: usize, message: String) -> Self {
        Self {
            rule_index: Some(rule_index),
            line: index.rules()[rule_index].line,
            ..Self::new(kind, message)
        }
    }

    fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}

/// Which checks to run and how to judge them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintOptions {
    /// Treat every finding as a failure
    pub strict: bool,
    /// Flag rules matching no file in the listing
    pub check_matches: bool,
    /// Flag shadowed and overlapping rules
    pub check_overlaps: bool,
}

/// Findings plus the strictness they were judged under
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub findings: Vec<Finding>,
    pub strict: bool,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Warning)
    }

    /// Errors always fail; under `strict` any finding fails.
    pub fn is_failure(&self) -> bool {
        self.has_errors() || (self.strict && !self.findings.is_empty())
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Configurable lint run over an [`OwnershipIndex`]
#[derive(Debug, Clone, Default)]
pub struct Linter<'a> {
    options: LintOptions,
    catalog: Option<&'a ServiceCatalog>,
    files: Option<&'a [String]>,
    parse_errors: &'a [ParseError],
}

impl<'a> Linter<'a> {
    pub fn new(options: LintOptions) -> Self {
        Self {
            options,
            catalog: None,
            files: None,
            parse_errors: &[],
        }
    }

    /// Check rule services against a catalog
    pub fn with_catalog(mut self, catalog: &'a ServiceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Repository file listing for `check_matches` and live overlap scans
    pub fn with_files(mut self, files: &'a [String]) -> Self {
        self.files = Some(files);
        self
    }

    /// Lines rejected by a lenient parse, reported as invalid patterns
    pub fn with_parse_errors(mut self, errors: &'a [ParseError]) -> Self {
        self.parse_errors = errors;
        self
    }

    pub fn lint(&self, index: &OwnershipIndex) -> LintReport {
        let mut findings = Vec::new();

        self.check_syntax(&mut findings);
        self.check_services(index, &mut findings);
        self.check_duplicates(index, &mut findings);
        if let Some(catalog) = self.catalog {
            self.check_catalog(index, catalog, &mut findings);
        }

        if self.options.check_matches {
            match self.files {
                Some(files) => self.check_matches(index, files, &mut findings),
                None => findings.push(Finding::new(
                    FindingKind::MissingFileListing,
                    "check-matches needs a repository file listing".to_string(),
                )),
            }
        }

        if self.options.check_overlaps {
            self.check_shadowing(index, &mut findings);
            if let Some(files) = self.files {
                self.check_overlapping_files(index, files, &mut findings);
            }
        }

        if self.options.strict {
            for finding in &mut findings {
                if finding.severity == Severity::Warning {
                    finding.severity = Severity::Error;
                }
            }
        }

        tracing::debug!(rules = index.len(), findings = findings.len(), "lint finished");
        LintReport {
            findings,
            strict: self.options.strict,
        }
    }

    fn check_syntax(&self, findings: &mut Vec<Finding>) {
        for err in self.parse_errors {
            findings.push(Finding {
                line: Some(err.line),
                ..Finding::new(FindingKind::InvalidPattern, err.kind.to_string())
                    .with_hint("Each line must be `<pattern> <service>` with a valid glob.")
            });
        }
    }

    fn check_services(&self, index: &OwnershipIndex, findings: &mut Vec<Finding>) {
        for (i, rule) in index.rules().iter().enumerate() {
            if rule.service.trim().is_empty() {
                findings.push(Finding::for_rule(
                    FindingKind::EmptyService,
                    index,
                    i,
                    format!("Pattern '{}' has an empty service name.", rule.pattern),
                ));
            }
        }
    }

    fn check_duplicates(&self, index: &OwnershipIndex, findings: &mut Vec<Finding>) {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (i, rule) in index.rules().iter().enumerate() {
            let Some(&prev) = first_seen.get(rule.pattern.as_str()) else {
                first_seen.insert(rule.pattern.as_str(), i);
                continue;
            };
            let earlier = &index.rules()[prev];
            let message = if earlier.service == rule.service {
                format!(
                    "Pattern '{}' is repeated for service '{}' (first at rule {}).",
                    rule.pattern, rule.service, prev
                )
            } else {
                format!(
                    "Pattern '{}' is defined more than once (last match wins). Previous: {} (rule {}), this: {}.",
                    rule.pattern, earlier.service, prev, rule.service
                )
            };
            findings.push(
                Finding::for_rule(FindingKind::DuplicatePattern, index, i, message)
                    .with_hint("Remove duplicates or make precedence explicit."),
            );
        }
    }

    fn check_catalog(&self, index: &OwnershipIndex, catalog: &ServiceCatalog, findings: &mut Vec<Finding>) {
        for (i, rule) in index.rules().iter().enumerate() {
            if !rule.service.trim().is_empty() && !catalog.contains(&rule.service) {
                findings.push(
                    Finding::for_rule(
                        FindingKind::UnknownService,
                        index,
                        i,
                        format!("Rule references unknown service '{}'.", rule.service),
                    )
                    .with_hint("Add it to the services catalog (or fix the spelling)."),
                );
            }
        }

        for (name, service) in catalog.iter() {
            if !service.has_contact() {
                findings.push(
                    Finding::new(
                        FindingKind::ServiceHasNoContact,
                        format!("Service '{}' has no owners and no contact (slack/email).", name),
                    )
                    .with_hint("Add owners or contact so reviewers know who to ask."),
                );
            }
        }
    }

    fn check_matches(&self, index: &OwnershipIndex, files: &[String], findings: &mut Vec<Finding>) {
        for (i, rule) in index.rules().iter().enumerate() {
            if !files.iter().any(|f| rule.matches(f)) {
                findings.push(
                    Finding::for_rule(
                        FindingKind::UnusedRule,
                        index,
                        i,
                        format!("Pattern '{}' matches no files in the repository.", rule.pattern),
                    )
                    .with_hint("Remove it or fix the glob (or ignore if files are generated later)."),
                );
            }
        }
    }

    /// Pairwise pattern comparison: an earlier rule covered by a later one can
    /// never win; partial overlaps between services are reported as info.
    ///
    /// Shadowing is decided one later rule at a time. A rule covered only by
    /// the union of several later rules (`a/[xy]` then `a/x` and `a/y`) is
    /// reported as overlapping, not shadowed.
    fn check_shadowing(&self, index: &OwnershipIndex, findings: &mut Vec<Finding>) {
        let rules = index.rules();
        for (i, earlier) in rules.iter().enumerate() {
            let shadow = rules
                .iter()
                .enumerate()
                .skip(i + 1)
                .find(|(_, later)| later.compiled.covers(&earlier.compiled));

            if let Some((j, later)) = shadow {
                findings.push(
                    Finding::for_rule(
                        FindingKind::ShadowedRule,
                        index,
                        i,
                        format!(
                            "Rule '{} {}' can never win: every path it matches is also matched by later rule '{} {}' (rule {}).",
                            earlier.pattern, earlier.service, later.pattern, later.service, j
                        ),
                    )
                    .with_hint("Move the rule below the broader one or delete it."),
                );
                continue;
            }

            for (j, later) in rules.iter().enumerate().skip(i + 1) {
                if later.service != earlier.service && later.compiled.intersects(&earlier.compiled) {
                    findings.push(Finding::for_rule(
                        FindingKind::OverlappingRules,
                        index,
                        i,
                        format!(
                            "Rules '{}' ({}) and '{}' ({}, rule {}) can match the same paths; the later rule wins.",
                            earlier.pattern, earlier.service, later.pattern, later.service, j
                        ),
                    ));
                }
            }
        }
    }

    fn check_overlapping_files(&self, index: &OwnershipIndex, files: &[String], findings: &mut Vec<Finding>) {
        let mut examples = Vec::new();
        let mut total = 0usize;

        for file in files {
            let matching = index.matching_rules(file);
            if matching.len() < 2 {
                continue;
            }
            let services: Vec<&str> = matching.iter().map(|&i| index.rules()[i].service.as_str()).collect();
            let distinct: BTreeSet<&str> = services.iter().copied().collect();
            if distinct.len() < 2 {
                continue;
            }
            total += 1;
            if examples.len() < MAX_OVERLAP_EXAMPLES {
                examples.push(format!("{} -> {}", file, services.join(", ")));
            }
        }

        if total > 0 {
            findings.push(
                Finding::new(
                    FindingKind::OverlappingFiles,
                    format!(
                        "{} file(s) match rules of more than one service (last match wins). Examples: {}",
                        total,
                        examples.join("; ")
                    ),
                )
                .with_hint("Often fine. If it is confusing, tighten globs or add comments."),
            );
        }
    }
}

/// Run the always-on checks plus whatever `options` enable, without a
/// catalog or file listing.
pub fn lint(index: &OwnershipIndex, options: &LintOptions) -> LintReport {
    Linter::new(*options).lint(index)
}
