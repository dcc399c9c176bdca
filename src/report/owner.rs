//! `who-owns` output

use serde::{Deserialize, Serialize};

use serviceowners_core::{Explanation, OwnershipIndex, Service, ServiceCatalog};

/// Output format for `who-owns`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OwnerFormat {
    #[default]
    Text,
    Json,
}

/// A rule as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub rule_index: usize,
    pub pattern: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub source: String,
}

/// Ownership of one path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerOutput {
    pub path: String,

    /// Owning service, `None` when unmapped
    pub service: Option<String>,

    /// The rule that decided ownership
    pub chosen_rule: Option<RuleRef>,

    /// Every matching rule in file order
    pub matches: Vec<RuleRef>,

    /// Catalog entry of the owning service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Service>,

    #[serde(skip)]
    explain: bool,
}

impl OwnerOutput {
    pub fn new(
        explanation: &Explanation,
        index: &OwnershipIndex,
        catalog: &ServiceCatalog,
        explain: bool,
    ) -> Self {
        let source = index.source_name();
        let to_ref = |rule_index: usize| {
            let rule = &index.rules()[rule_index];
            RuleRef {
                rule_index,
                pattern: rule.pattern.clone(),
                service: rule.service.clone(),
                line: rule.line,
                source: source.to_string(),
            }
        };

        let service = explanation.result.service().map(str::to_string);
        Self {
            path: explanation.path.clone(),
            metadata: service.as_deref().and_then(|s| catalog.get(s)).cloned(),
            service,
            chosen_rule: explanation.result.rule_index().map(to_ref),
            matches: explanation.matched().map(|e| to_ref(e.rule_index)).collect(),
            explain,
        }
    }

    pub fn render(&self, format: OwnerFormat) -> Result<String, serde_json::Error> {
        match format {
            OwnerFormat::Json => self.to_json(),
            OwnerFormat::Text => Ok(self.to_human()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_human(&self) -> String {
        let mut lines = Vec::new();

        let Some(service) = &self.service else {
            lines.push(format!("{}: (unmapped)", self.path));
            if self.explain {
                lines.push(String::new());
                lines.push("No matching rules.".to_string());
            }
            return lines.join("\n");
        };

        lines.push(format!("{}: {}", self.path, service));
        if let Some(meta) = &self.metadata {
            let owners = meta.owners_line();
            if !owners.is_empty() {
                lines.push(format!("  owners: {}", owners));
            }
            if let Some(slack) = &meta.contact.slack {
                lines.push(format!("  slack: {}", slack));
            }
            if let Some(email) = &meta.contact.email {
                lines.push(format!("  email: {}", email));
            }
            if let Some(oncall) = &meta.oncall {
                lines.push(format!("  oncall: {}", oncall));
            }
            if let Some(runbook) = &meta.runbook {
                lines.push(format!("  runbook: {}", runbook));
            }
            if let Some(docs) = &meta.docs {
                lines.push(format!("  docs: {}", docs));
            }
        }

        if self.explain {
            lines.push(String::new());
            lines.push("Matched rules (last match wins):".to_string());
            for rule in &self.matches {
                let location = match rule.line {
                    Some(line) => format!("{}:{}", rule.source, line),
                    None => format!("{}#{}", rule.source, rule.rule_index),
                };
                let chosen = if self.chosen_rule.as_ref() == Some(rule) {
                    "  <== chosen"
                } else {
                    ""
                };
                lines.push(format!("- {} -> {} ({}){}", rule.pattern, rule.service, location, chosen));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serviceowners_core::{Contact, OwnerRef};

    fn fixture() -> (OwnershipIndex, ServiceCatalog) {
        let index = OwnershipIndex::parse("*.py core\nsrc/** platform\nsrc/legacy/** legacy\n", "SERVICEOWNERS")
            .unwrap();
        let mut catalog = ServiceCatalog::default();
        catalog.insert(
            "platform",
            Service {
                owners: vec![OwnerRef::Team("@acme/platform".to_string())],
                contact: Contact {
                    slack: Some("#platform".to_string()),
                    email: None,
                },
                ..Service::default()
            },
        );
        (index, catalog)
    }

    #[test]
    fn test_text_with_metadata() {
        let (index, catalog) = fixture();
        let out = OwnerOutput::new(&index.explain("src/main.py"), &index, &catalog, false);

        let text = out.to_human();
        assert!(text.starts_with("src/main.py: platform"));
        assert!(text.contains("owners: @acme/platform"));
        assert!(text.contains("slack: #platform"));
        assert!(!text.contains("Matched rules"));
    }

    #[test]
    fn test_explain_marks_chosen_rule() {
        let (index, catalog) = fixture();
        let out = OwnerOutput::new(&index.explain("src/legacy/x.py"), &index, &catalog, true);

        let text = out.to_human();
        assert!(text.contains("- src/** -> platform (SERVICEOWNERS:2)\n"));
        assert!(text.contains("- src/legacy/** -> legacy (SERVICEOWNERS:3)  <== chosen"));
    }

    #[test]
    fn test_unmapped() {
        let (index, catalog) = fixture();
        let out = OwnerOutput::new(&index.explain("docs/readme.md"), &index, &catalog, true);

        assert_eq!(out.to_human(), "docs/readme.md: (unmapped)\n\nNo matching rules.");

        let json: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert!(json["service"].is_null());
        assert!(json["chosen_rule"].is_null());
        assert_eq!(json["matches"], serde_json::json!([]));
    }

    #[test]
    fn test_json_lists_matches() {
        let (index, catalog) = fixture();
        let out = OwnerOutput::new(&index.explain("src/main.py"), &index, &catalog, false);

        let json: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(json["service"], "platform");
        assert_eq!(json["chosen_rule"]["line"], 2);
        assert_eq!(json["matches"].as_array().unwrap().len(), 1);
        assert_eq!(json["metadata"]["contact"]["slack"], "#platform");
    }
}
