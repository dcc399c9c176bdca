//! Impacted-services resolution for a set of changed paths

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::index::OwnershipIndex;

/// Changed files attributed to one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceImpact {
    pub service: String,
    /// Sorted, unique
    pub files: Vec<String>,
}

/// Changed paths grouped by owning service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// In order of first appearance among the changed paths
    pub services: Vec<ServiceImpact>,

    /// Sorted, unique
    pub unmapped: Vec<String>,

    /// Mapped paths matched by more than one rule: path -> services of every
    /// matching rule, in file order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overlaps: BTreeMap<String, Vec<String>>,
}

impl ImpactReport {
    /// Impacted service names in first-appearance order
    pub fn impacted_services(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.service.as_str()).collect()
    }

    pub fn files_for(&self, service: &str) -> Option<&[String]> {
        self.services
            .iter()
            .find(|s| s.service == service)
            .map(|s| s.files.as_slice())
    }

    pub fn has_unmapped(&self) -> bool {
        !self.unmapped.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.services.iter().map(|s| s.files.len()).sum::<usize>() + self.unmapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.unmapped.is_empty()
    }
}

/// Attribute each changed path to its owning service.
///
/// Duplicate paths are counted once. Only the order of `services` depends on
/// input order; file lists are sorted.
pub fn resolve_impact<I, S>(index: &OwnershipIndex, changed_paths: I) -> ImpactReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ImpactReport::default();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::new();

    for path in changed_paths {
        let path = path.as_ref();
        if !seen.insert(path.to_string()) {
            continue;
        }

        let matching = index.matching_rules(path);
        let Some(&winner) = matching.last() else {
            report.unmapped.push(path.to_string());
            continue;
        };

        let rules = index.rules();
        let service = &rules[winner].service;
        let slot = *positions.entry(service.clone()).or_insert_with(|| {
            report.services.push(ServiceImpact {
                service: service.clone(),
                files: Vec::new(),
            });
            report.services.len() - 1
        });
        report.services[slot].files.push(path.to_string());

        if matching.len() > 1 {
            let services = matching.iter().map(|&i| rules[i].service.clone()).collect();
            report.overlaps.insert(path.to_string(), services);
        }
    }

    for impact in &mut report.services {
        impact.files.sort();
    }
    report.unmapped.sort();

    tracing::debug!(
        paths = seen.len(),
        services = report.services.len(),
        unmapped = report.unmapped.len(),
        "resolved impact"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> OwnershipIndex {
        OwnershipIndex::from_pairs([
            ("apps/api/**", "api"),
            ("apps/web/**", "web"),
            ("infra/**", "infra"),
        ])
        .unwrap()
    }

    #[test]
    fn test_groups_by_service_and_unmapped() {
        let report = resolve_impact(
            &index(),
            ["apps/api/main.py", "apps/web/index.ts", "README.md"],
        );

        assert_eq!(report.impacted_services(), vec!["api", "web"]);
        assert_eq!(report.files_for("api"), Some(&["apps/api/main.py".to_string()][..]));
        assert_eq!(report.files_for("web"), Some(&["apps/web/index.ts".to_string()][..]));
        assert_eq!(report.files_for("infra"), None);
        assert_eq!(report.unmapped, vec!["README.md".to_string()]);
        assert_eq!(report.total_files(), 3);
    }

    #[test]
    fn test_duplicates_counted_once() {
        let report = resolve_impact(
            &index(),
            ["apps/api/a.py", "apps/api/a.py", "README.md", "README.md"],
        );
        assert_eq!(report.files_for("api").map(|f| f.len()), Some(1));
        assert_eq!(report.unmapped.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let idx = index();
        let paths = vec!["infra/tf/main.tf", "apps/web/x.ts", "LICENSE"];
        assert_eq!(resolve_impact(&idx, &paths), resolve_impact(&idx, &paths));
    }

    #[test]
    fn test_service_order_follows_first_appearance() {
        let idx = index();
        let forward = resolve_impact(&idx, ["infra/a", "apps/api/b", "infra/c"]);
        let backward = resolve_impact(&idx, ["infra/c", "apps/api/b", "infra/a"]);

        assert_eq!(forward.impacted_services(), vec!["infra", "api"]);
        assert_eq!(forward.files_for("infra"), backward.files_for("infra"));
        assert_eq!(forward.files_for("infra").unwrap()[0], "infra/a");
    }

    #[test]
    fn test_records_overlaps() {
        let idx = OwnershipIndex::from_pairs([("**", "all"), ("src/**", "core")]).unwrap();
        let report = resolve_impact(&idx, ["src/lib.rs", "Cargo.toml"]);

        assert_eq!(
            report.overlaps.get("src/lib.rs"),
            Some(&vec!["all".to_string(), "core".to_string()])
        );
        assert!(!report.overlaps.contains_key("Cargo.toml"));
    }

    #[test]
    fn test_empty_input() {
        let report = resolve_impact(&index(), Vec::<String>::new());
        assert!(report.is_empty());
        assert!(!report.has_unmapped());
    }
}
