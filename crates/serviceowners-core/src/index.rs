//! Ownership index: ordered rules, last match wins

use serde::{Deserialize, Serialize};

use crate::parser::{parse_rules, ParseError, Rule, DEFAULT_SOURCE};
use crate::pattern::{split_path, PatternSyntaxError};

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    /// Owned by `service`, decided by the rule at `rule_index`
    Owned { service: String, rule_index: usize },
    /// No rule matched
    Unmapped,
}

impl MatchResult {
    pub fn owned(service: &str, rule_index: usize) -> Self {
        MatchResult::Owned {
            service: service.to_string(),
            rule_index,
        }
    }

    pub fn service(&self) -> Option<&str> {
        match self {
            MatchResult::Owned { service, .. } => Some(service),
            MatchResult::Unmapped => None,
        }
    }

    pub fn rule_index(&self) -> Option<usize> {
        match self {
            MatchResult::Owned { rule_index, .. } => Some(*rule_index),
            MatchResult::Unmapped => None,
        }
    }

    pub fn is_unmapped(&self) -> bool {
        matches!(self, MatchResult::Unmapped)
    }
}

/// One rule evaluated against one path
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluation<'a> {
    pub rule_index: usize,
    pub rule: &'a Rule,
    pub matched: bool,
}

/// A rule line in an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainEntry {
    pub rule_index: usize,
    pub pattern: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub matched: bool,
}

/// Every rule evaluated for a path, plus the winner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub path: String,
    pub result: MatchResult,
    pub evaluations: Vec<ExplainEntry>,
}

impl Explanation {
    /// Entries whose pattern matched, in file order
    pub fn matched(&self) -> impl Iterator<Item = &ExplainEntry> {
        self.evaluations.iter().filter(|e| e.matched)
    }

    /// Whether the entry decided the result
    pub fn is_winner(&self, entry: &ExplainEntry) -> bool {
        self.result.rule_index() == Some(entry.rule_index)
    }
}

/// Ordered SERVICEOWNERS rules for one invocation.
///
/// Built once and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct OwnershipIndex {
    source_name: String,
    rules: Vec<Rule>,
}

impl OwnershipIndex {
    /// Build an index from rules in file order
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_source(DEFAULT_SOURCE, rules)
    }

    pub fn with_source(source_name: &str, rules: Vec<Rule>) -> Self {
        tracing::debug!(source = source_name, rules = rules.len(), "built ownership index");
        Self {
            source_name: source_name.to_string(),
            rules,
        }
    }

    /// Parse SERVICEOWNERS text into an index, failing on the first bad line
    pub fn parse(text: &str, source_name: &str) -> Result<Self, ParseError> {
        Ok(Self::with_source(source_name, parse_rules(text, source_name)?))
    }

    /// Build an index from `(pattern, service)` pairs
    pub fn from_pairs<'p, I>(pairs: I) -> Result<Self, PatternSyntaxError>
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        let rules = pairs
            .into_iter()
            .map(|(pattern, service)| Rule::new(pattern, service))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against `path`, in file order.
    ///
    /// Evaluation is lazy, so iterating from the back and stopping at the
    /// first match only runs the rules that could still win.
    pub fn evaluate<'a>(
        &'a self,
        path: &'a str,
    ) -> impl DoubleEndedIterator<Item = RuleEvaluation<'a>> + 'a {
        let segments = split_path(path);
        self.rules
            .iter()
            .enumerate()
            .map(move |(rule_index, rule)| RuleEvaluation {
                rule_index,
                rule,
                matched: rule.compiled.matches_segments(&segments),
            })
    }

    /// Resolve the owning service of `path`: the last matching rule wins.
    pub fn resolve(&self, path: &str) -> MatchResult {
        match self.evaluate(path).rev().find(|e| e.matched) {
            Some(e) => MatchResult::owned(&e.rule.service, e.rule_index),
            None => MatchResult::Unmapped,
        }
    }

    /// Indices of every rule matching `path`, in file order
    pub fn matching_rules(&self, path: &str) -> Vec<usize> {
        self.evaluate(path)
            .filter(|e| e.matched)
            .map(|e| e.rule_index)
            .collect()
    }

    /// Report every rule's verdict for `path` alongside the result
    pub fn explain(&self, path: &str) -> Explanation {
        let evaluations: Vec<ExplainEntry> = self
            .evaluate(path)
            .map(|e| {
                tracing::trace!(path, rule = e.rule_index, pattern = %e.rule.pattern, matched = e.matched);
                ExplainEntry {
                    rule_index: e.rule_index,
                    pattern: e.rule.pattern.clone(),
                    service: e.rule.service.clone(),
                    line: e.rule.line,
                    matched: e.matched,
                }
            })
            .collect();

        let result = match evaluations.iter().rev().find(|e| e.matched) {
            Some(e) => MatchResult::owned(&e.service, e.rule_index),
            None => MatchResult::Unmapped,
        };

        Explanation {
            path: path.to_string(),
            result,
            evaluations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_match_wins() {
        let index = OwnershipIndex::from_pairs([("a/**", "x"), ("a/b/**", "y")]).unwrap();

        assert_eq!(index.resolve("a/b/c"), MatchResult::owned("y", 1));
        assert_eq!(index.resolve("a/d"), MatchResult::owned("x", 0));
    }

    #[test]
    fn test_order_beats_specificity() {
        let index = OwnershipIndex::from_pairs([("docs/**", "docs"), ("*.md", "markdown")]).unwrap();
        assert_eq!(index.resolve("README.md"), MatchResult::owned("markdown", 1));
        assert_eq!(index.resolve("docs/README.md"), MatchResult::owned("docs", 0));

        let reversed = OwnershipIndex::from_pairs([("**/*.md", "markdown"), ("docs/**", "docs")]).unwrap();
        assert_eq!(reversed.resolve("docs/README.md"), MatchResult::owned("docs", 1));
    }

    #[test]
    fn test_empty_index_is_unmapped() {
        let index = OwnershipIndex::default();
        assert!(index.resolve("anything/at/all.rs").is_unmapped());
        assert!(index.resolve("README.md").is_unmapped());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let index = OwnershipIndex::from_pairs([("**", "all"), ("src/**", "core")]).unwrap();
        let first = index.resolve("src/lib.rs");
        for _ in 0..10 {
            assert_eq!(index.resolve("src/lib.rs"), first);
        }
    }

    #[test]
    fn test_matching_rules_in_file_order() {
        let index =
            OwnershipIndex::from_pairs([("*.py", "core"), ("src/**", "platform"), ("**/*.py", "py")])
                .unwrap();
        assert_eq!(index.matching_rules("src/main.py"), vec![1, 2]);
        assert_eq!(index.matching_rules("main.py"), vec![0, 2]);
    }

    #[test]
    fn test_explain_reports_every_rule() {
        let index = OwnershipIndex::parse("*.py core\nsrc/** platform\ndocs/** docs\n", "SO").unwrap();
        let explanation = index.explain("src/main.py");

        assert_eq!(explanation.evaluations.len(), 3);
        assert_eq!(explanation.result, MatchResult::owned("platform", 1));
        assert_eq!(explanation.matched().count(), 1);
        assert_eq!(explanation.evaluations[1].line, Some(2));
        assert!(explanation.is_winner(&explanation.evaluations[1]));
        assert!(!explanation.evaluations[2].matched);
    }

    #[test]
    fn test_explain_agrees_with_resolve() {
        let index = OwnershipIndex::from_pairs([("a/**", "x"), ("**/c", "z"), ("a/b/**", "y")]).unwrap();
        for path in ["a/b/c", "a/c", "c", "q/r"] {
            assert_eq!(index.explain(path).result, index.resolve(path), "path {}", path);
        }
    }

    #[test]
    fn test_match_result_serializes_tagged() {
        let json = serde_json::to_string(&MatchResult::owned("api", 2)).unwrap();
        assert_eq!(json, r#"{"status":"owned","service":"api","rule_index":2}"#);
        let json = serde_json::to_string(&MatchResult::Unmapped).unwrap();
        assert_eq!(json, r#"{"status":"unmapped"}"#);
    }
}
