//! SERVICEOWNERS text parser
//!
//! One rule per line: `<pattern> <service>`. Blank lines and lines starting
//! with `#` are skipped, and a `#` preceded by whitespace starts an inline
//! comment. File order is kept: it decides override priority.

use serde::Serialize;

use crate::pattern::{compile, CompiledPattern, PatternSyntaxError};

/// Default name used when rules do not come from a file
pub const DEFAULT_SOURCE: &str = "SERVICEOWNERS";

/// A single `(pattern, service)` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Pattern as written
    pub pattern: String,

    /// Owning service name
    pub service: String,

    /// 1-based line in the source file (None for rules built in code)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(skip)]
    pub compiled: CompiledPattern,
}

impl Rule {
    /// Build a rule, compiling its pattern
    pub fn new(pattern: &str, service: &str) -> Result<Self, PatternSyntaxError> {
        Ok(Self {
            pattern: pattern.to_string(),
            service: service.to_string(),
            line: None,
            compiled: compile(pattern)?,
        })
    }

    /// Record the source line this rule was read from
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        self.compiled.matches(path)
    }
}

/// What went wrong on a SERVICEOWNERS line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected 2 columns `<pattern> <service>`, found {found}: {text:?}")]
    ColumnCount { found: usize, text: String },

    #[error(transparent)]
    Pattern(#[from] PatternSyntaxError),
}

/// A rejected SERVICEOWNERS line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source_name}:{line}: {kind}")]
pub struct ParseError {
    pub source_name: String,
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Parse SERVICEOWNERS text, stopping at the first bad line.
pub fn parse_rules(text: &str, source_name: &str) -> Result<Vec<Rule>, ParseError> {
    parse_lines(text, source_name).collect()
}

/// Parse SERVICEOWNERS text, collecting every bad line instead of stopping.
pub fn parse_rules_lenient(text: &str, source_name: &str) -> (Vec<Rule>, Vec<ParseError>) {
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    for item in parse_lines(text, source_name) {
        match item {
            Ok(rule) => rules.push(rule),
            Err(e) => errors.push(e),
        }
    }
    (rules, errors)
}

fn parse_lines<'a>(
    text: &'a str,
    source_name: &'a str,
) -> impl Iterator<Item = Result<Rule, ParseError>> + 'a {
    text.lines().enumerate().filter_map(move |(idx, raw)| {
        let line_no = idx + 1;
        let content = strip_inline_comment(raw).trim();
        if content.is_empty() {
            return None;
        }

        let error = |kind: ParseErrorKind| ParseError {
            source_name: source_name.to_string(),
            line: line_no,
            kind,
        };

        let columns: Vec<&str> = content.split_whitespace().collect();
        let rule = match columns.as_slice() {
            [pattern, service] => Rule::new(pattern, service)
                .map(|r| r.at_line(line_no))
                .map_err(|e| error(e.into())),
            other => Err(error(ParseErrorKind::ColumnCount {
                found: other.len(),
                text: raw.to_string(),
            })),
        };
        Some(rule)
    })
}

/// Drop a trailing `# comment`. A `#` only starts a comment at the line start
/// or after whitespace, and never inside quotes.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quote = false;
    let mut prev_ws = true;
    for (i, c) in line.char_indices() {
        match c {
            '\'' | '"' => in_quote = !in_quote,
            '#' if !in_quote && prev_ws => return &line[..i],
            _ => {}
        }
        prev_ws = c.is_whitespace();
    }
    line
}
