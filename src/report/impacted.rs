//! `impacted` output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use serviceowners_core::{ImpactReport, Service, ServiceCatalog};

use super::file_count;

/// Unmapped files listed directly in a PR comment
const COMMENT_UNMAPPED_LIMIT: usize = 10;

/// Marker wrapped around PR comments so a bot can find and update them
const COMMENT_MARKER: &str = "serviceowners";

/// Output format for `impacted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ImpactFormat {
    #[default]
    Text,
    Markdown,
    Json,
    Comment,
}

/// Machine-readable impact summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,

    /// Impacted services in first-appearance order
    pub impacted_services: Vec<String>,

    pub services: BTreeMap<String, ServiceFiles>,

    pub unmapped_files: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub overlaps: BTreeMap<String, Vec<String>>,

    pub total_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceFiles {
    pub count: usize,
    pub files: Vec<String>,
}

/// An impact report plus what is needed to present it
#[derive(Debug, Clone, Copy)]
pub struct ImpactView<'a> {
    pub report: &'a ImpactReport,
    pub catalog: &'a ServiceCatalog,
    pub diff: Option<&'a str>,
    pub show_files: bool,
    pub max_files: usize,
}

impl<'a> ImpactView<'a> {
    pub fn new(report: &'a ImpactReport, catalog: &'a ServiceCatalog) -> Self {
        Self {
            report,
            catalog,
            diff: None,
            show_files: false,
            max_files: 50,
        }
    }

    pub fn render(&self, format: ImpactFormat) -> Result<String, serde_json::Error> {
        match format {
            ImpactFormat::Text => Ok(self.to_human()),
            ImpactFormat::Markdown => Ok(self.to_markdown()),
            ImpactFormat::Json => self.to_json(),
            ImpactFormat::Comment => Ok(self.to_comment()),
        }
    }

    pub fn output(&self) -> ImpactOutput {
        ImpactOutput {
            diff: self.diff.map(str::to_string),
            impacted_services: self
                .report
                .impacted_services()
                .into_iter()
                .map(str::to_string)
                .collect(),
            services: self
                .report
                .services
                .iter()
                .map(|s| {
                    (
                        s.service.clone(),
                        ServiceFiles {
                            count: s.files.len(),
                            files: s.files.clone(),
                        },
                    )
                })
                .collect(),
            unmapped_files: self.report.unmapped.clone(),
            overlaps: self.report.overlaps.clone(),
            total_files: self.report.total_files(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.output())
    }

    /// Services by descending file count, then name
    fn ranked(&self) -> Vec<(&'a str, &'a [String])> {
        let mut ranked: Vec<_> = self
            .report
            .services
            .iter()
            .map(|s| (s.service.as_str(), s.files.as_slice()))
            .collect();
        ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Capped file list plus how many were left out
    fn shown<'f>(&self, files: &'f [String]) -> (&'f [String], usize) {
        let shown = &files[..files.len().min(self.max_files)];
        (shown, files.len() - shown.len())
    }

    pub fn to_human(&self) -> String {
        if self.report.is_empty() {
            return "No changed files.".to_string();
        }

        let ranked = self.ranked();
        let mut lines = vec![format!("Impacted services ({}):", ranked.len())];

        for (name, files) in &ranked {
            let mut header = format!("  {} ({})", name, file_count(files.len()));
            if let Some(meta) = self.catalog.get(name) {
                let owners = meta.owners_line();
                if !owners.is_empty() {
                    header.push_str(&format!("  owners: {}", owners));
                }
                if let Some(slack) = &meta.contact.slack {
                    header.push_str(&format!("  slack: {}", slack));
                }
            }
            lines.push(header);

            if self.show_files {
                let (shown, rest) = self.shown(files);
                lines.extend(shown.iter().map(|f| format!("    {}", f)));
                if rest > 0 {
                    lines.push(format!("    ...and {} more", rest));
                }
            }
        }

        if self.report.has_unmapped() {
            lines.push(String::new());
            lines.push(format!("Unmapped files ({}):", self.report.unmapped.len()));
            let (shown, rest) = self.shown(&self.report.unmapped);
            lines.extend(shown.iter().map(|f| format!("  {}", f)));
            if rest > 0 {
                lines.push(format!("  ...and {} more", rest));
            }
        }

        lines.join("\n")
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = vec!["## Impacted services".to_string(), String::new()];

        if self.report.is_empty() {
            lines.push("_No changed files detected._".to_string());
            return lines.join("\n");
        }

        let ranked = self.ranked();
        lines.push(format!("### Impacted services ({})", ranked.len()));
        lines.push(String::new());

        for (name, files) in &ranked {
            let mut bits = vec![format!("**{}**", name), format!("({})", file_count(files.len()))];
            if let Some(meta) = self.catalog.get(name) {
                bits.extend(metadata_bits(meta));
            }
            lines.push(format!("- {}", bits.join(" · ")));

            if self.show_files {
                let (shown, rest) = self.shown(files);
                lines.extend(shown.iter().map(|f| format!("  - `{}`", f)));
                if rest > 0 {
                    lines.push(format!("  - _...and {} more_", rest));
                }
            }
        }
        lines.push(String::new());

        if self.report.has_unmapped() {
            lines.push(format!("### Unmapped files ({})", self.report.unmapped.len()));
            lines.push(String::new());
            let (shown, rest) = self.shown(&self.report.unmapped);
            lines.extend(shown.iter().map(|f| format!("- `{}`", f)));
            if rest > 0 {
                lines.push(format!("- _...and {} more_", rest));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Compact markdown for a pull request comment, with the per-service file
    /// lists folded into a `<details>` block
    pub fn to_comment(&self) -> String {
        let ranked = self.ranked();
        let mut lines = vec![
            format!("<!-- {}:begin -->", COMMENT_MARKER),
            "## ServiceOwners".to_string(),
            String::new(),
            format!("**Impacted services:** {}", ranked.len()),
            String::new(),
        ];

        if ranked.is_empty() {
            lines.push("_None_".to_string());
        }
        for (name, files) in &ranked {
            let mut bits = vec![format!("**{}**", name), file_count(files.len())];
            if let Some(meta) = self.catalog.get(name) {
                let owners = meta.owners_line();
                if !owners.is_empty() {
                    bits.push(format!("owners: {}", owners));
                }
                if let Some(slack) = &meta.contact.slack {
                    bits.push(format!("slack: `{}`", slack));
                }
            }
            lines.push(format!("- {}", bits.join(" · ")));
        }
        lines.push(String::new());

        let unmapped = &self.report.unmapped;
        if !unmapped.is_empty() {
            lines.push(format!("**Unmapped files:** {}", unmapped.len()));
            lines.push(String::new());
            let limit = unmapped.len().min(COMMENT_UNMAPPED_LIMIT);
            lines.extend(unmapped[..limit].iter().map(|f| format!("- `{}`", f)));
            if unmapped.len() > limit {
                lines.push(format!("- _...and {} more_", unmapped.len() - limit));
            }
            lines.push(String::new());
        }

        lines.push("<details>".to_string());
        lines.push("<summary>Changed files by service</summary>".to_string());
        lines.push(String::new());
        if ranked.is_empty() {
            lines.push("_No mapped services._".to_string());
            lines.push(String::new());
        }
        for (name, files) in &ranked {
            lines.push(format!("### {}", name));
            let (shown, rest) = self.shown(files);
            lines.extend(shown.iter().map(|f| format!("- `{}`", f)));
            if rest > 0 {
                lines.push(format!("- _...and {} more_", rest));
            }
            lines.push(String::new());
        }
        lines.push("</details>".to_string());
        lines.push(String::new());
        lines.push(format!("<!-- {}:end -->", COMMENT_MARKER));

        lines.join("\n")
    }
}

fn metadata_bits(meta: &Service) -> Vec<String> {
    let mut bits = Vec::new();
    let owners = meta.owners_line();
    if !owners.is_empty() {
        bits.push(format!("owners: {}", owners));
    }
    if let Some(slack) = &meta.contact.slack {
        bits.push(format!("slack: `{}`", slack));
    }
    if let Some(oncall) = &meta.oncall {
        bits.push(format!("oncall: {}", oncall));
    }
    if let Some(runbook) = &meta.runbook {
        bits.push(format!("[runbook]({})", runbook));
    }
    if let Some(docs) = &meta.docs {
        bits.push(format!("[docs]({})", docs));
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use serviceowners_core::{resolve_impact, OwnerRef, OwnershipIndex};

    fn report() -> ImpactReport {
        let index = OwnershipIndex::from_pairs([("apps/api/**", "api"), ("apps/web/**", "web")]).unwrap();
        resolve_impact(
            &index,
            [
                "apps/web/a.ts",
                "apps/api/x.py",
                "apps/api/y.py",
                "apps/api/z.py",
                "README.md",
            ],
        )
    }

    fn catalog() -> ServiceCatalog {
        let mut catalog = ServiceCatalog::default();
        catalog.insert(
            "api",
            Service {
                owners: vec![OwnerRef::Team("@acme/api".to_string())],
                runbook: Some("https://runbooks/api".to_string()),
                ..Service::default()
            },
        );
        catalog
    }

    #[test]
    fn test_text_ranks_by_file_count() {
        let report = report();
        let catalog = catalog();
        let view = ImpactView::new(&report, &catalog);

        let text = view.to_human();
        let api = text.find("api (3 files)").unwrap();
        let web = text.find("web (1 file)").unwrap();
        assert!(api < web);
        assert!(text.contains("owners: @acme/api"));
        assert!(text.contains("Unmapped files (1):\n  README.md"));
        assert!(!text.contains("apps/api/x.py"));
    }

    #[test]
    fn test_show_files_caps_list() {
        let report = report();
        let catalog = catalog();
        let view = ImpactView {
            show_files: true,
            max_files: 2,
            ..ImpactView::new(&report, &catalog)
        };

        let text = view.to_human();
        assert!(text.contains("    apps/api/x.py\n    apps/api/y.py\n    ...and 1 more"));

        let md = view.to_markdown();
        assert!(md.contains("  - `apps/api/x.py`"));
        assert!(md.contains("  - _...and 1 more_"));
    }

    #[test]
    fn test_markdown_metadata_links() {
        let report = report();
        let catalog = catalog();
        let md = ImpactView::new(&report, &catalog).to_markdown();

        assert!(md.contains("### Impacted services (2)"));
        assert!(md.contains("- **api** · (3 files) · owners: @acme/api · [runbook](https://runbooks/api)"));
        assert!(md.contains("### Unmapped files (1)"));
    }

    #[test]
    fn test_comment_has_markers() {
        let report = report();
        let catalog = catalog();
        let comment = ImpactView::new(&report, &catalog).to_comment();

        assert!(comment.starts_with("<!-- serviceowners:begin -->"));
        assert!(comment.ends_with("<!-- serviceowners:end -->"));
        assert!(comment.contains("**Impacted services:** 2"));
        assert!(comment.contains("<details>"));
        assert!(comment.contains("### api\n- `apps/api/x.py`"));
    }

    #[test]
    fn test_json_shape() {
        let report = report();
        let catalog = catalog();
        let view = ImpactView {
            diff: Some("main...HEAD"),
            ..ImpactView::new(&report, &catalog)
        };

        let json: serde_json::Value = serde_json::from_str(&view.to_json().unwrap()).unwrap();
        assert_eq!(json["diff"], "main...HEAD");
        assert_eq!(json["impacted_services"], serde_json::json!(["web", "api"]));
        assert_eq!(json["services"]["api"]["count"], 3);
        assert_eq!(json["unmapped_files"], serde_json::json!(["README.md"]));
        assert_eq!(json["total_files"], 5);
    }

    #[test]
    fn test_empty_report() {
        let report = ImpactReport::default();
        let catalog = ServiceCatalog::default();
        let view = ImpactView::new(&report, &catalog);

        assert_eq!(view.to_human(), "No changed files.");
        assert!(view.to_markdown().contains("_No changed files detected._"));
        assert!(view.to_comment().contains("_None_"));
    }
}
