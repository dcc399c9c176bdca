//! Path to service ownership engine.
//!
//! SERVICEOWNERS maps repository paths to named services through an ordered
//! list of glob rules. The last matching rule wins, so later lines override
//! earlier ones regardless of how specific either pattern is.
//!
//! - [`pattern`]: compiles rule patterns and matches them against paths
//! - [`parser`]: reads SERVICEOWNERS text into ordered rules
//! - [`index`]: resolves one path to its owning service
//! - [`impact`]: groups a set of changed paths by service
//! - [`lint`]: static checks over the rule list
//! - [`catalog`]: optional service metadata for display and lint

pub mod catalog;
pub mod impact;
pub mod index;
pub mod lint;
pub mod parser;
pub mod pattern;

pub use catalog::{Contact, OwnerRef, Service, ServiceCatalog};
pub use impact::{resolve_impact, ImpactReport, ServiceImpact};
pub use index::{ExplainEntry, Explanation, MatchResult, OwnershipIndex, RuleEvaluation};
pub use lint::{lint, Finding, FindingKind, LintOptions, LintReport, Linter, Severity};
pub use parser::{parse_rules, parse_rules_lenient, ParseError, ParseErrorKind, Rule, DEFAULT_SOURCE};
pub use pattern::{compile, split_path, CompiledPattern, PatternSyntaxError, Segment};
