//! `lint` output

use serde::Serialize;

use serviceowners_core::{Finding, LintReport, Severity};

/// Output format for `lint`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LintFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

/// Lint findings with the file they refer to
#[derive(Debug, Clone, Serialize)]
pub struct LintOutput<'a> {
    /// Rules file the line numbers refer to
    pub source: &'a str,
    pub failed: bool,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    #[serde(flatten)]
    pub report: &'a LintReport,
}

impl<'a> LintOutput<'a> {
    pub fn new(report: &'a LintReport, source: &'a str) -> Self {
        let count = |severity| report.findings.iter().filter(|f| f.severity == severity).count();
        Self {
            source,
            failed: report.is_failure(),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            report,
        }
    }

    pub fn render(&self, format: LintFormat) -> Result<String, serde_json::Error> {
        match format {
            LintFormat::Text => Ok(self.to_human()),
            LintFormat::Markdown => Ok(self.to_markdown()),
            LintFormat::Json => self.to_json(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn location(&self, finding: &Finding) -> String {
        match finding.line {
            Some(line) => format!("{}:{}: ", self.source, line),
            None => String::new(),
        }
    }

    pub fn to_human(&self) -> String {
        if self.report.is_clean() {
            return "No lint issues found.".to_string();
        }

        let mut lines = Vec::new();
        for finding in &self.report.findings {
            lines.push(format!(
                "{}[{}] {}{}",
                finding.severity,
                finding.kind.code(),
                self.location(finding),
                finding.message
            ));
            if let Some(hint) = &finding.hint {
                lines.push(format!("  hint: {}", hint));
            }
        }
        lines.push(String::new());
        lines.push(self.summary());
        lines.join("\n")
    }

    pub fn to_markdown(&self) -> String {
        if self.report.is_clean() {
            return "### Lint\n\nNo lint issues found.\n".to_string();
        }

        let mut lines = vec!["### Lint".to_string(), String::new()];
        for finding in &self.report.findings {
            let hint = finding
                .hint
                .as_ref()
                .map(|h| format!(" _(hint: {})_", h))
                .unwrap_or_default();
            lines.push(format!(
                "- **{}** {}: {}{}{}",
                finding.kind.code(),
                finding.severity,
                self.location(finding),
                finding.message,
                hint
            ));
        }
        lines.push(String::new());
        lines.push(self.summary());
        lines.push(String::new());
        lines.join("\n")
    }

    fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s), {} info",
            self.errors, self.warnings, self.infos
        )
    }
}
