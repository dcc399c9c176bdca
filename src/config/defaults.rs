//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Rules file, relative to the repo root (default: "SERVICEOWNERS")
    pub serviceowners_file: String,

    /// Services catalog, relative to the repo root (default: "services.yaml")
    pub services_file: String,

    /// Revision range diffed by `impacted` (default: "HEAD~1...HEAD")
    pub diff: String,

    /// Files listed per service in text output (default: 50)
    pub max_files: usize,

    /// Exit with the unmapped status when unmapped files exist (default: false)
    pub fail_on_unmapped: bool,

    /// Lint strict mode (default: false)
    pub strict: bool,

    /// Lint: check every rule matches a file (default: false)
    pub check_matches: bool,

    /// Lint: check for shadowed and overlapping rules (default: false)
    pub check_overlaps: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            serviceowners_file: "SERVICEOWNERS".to_string(),
            services_file: "services.yaml".to_string(),
            diff: "HEAD~1...HEAD".to_string(),
            max_files: 50,
            fail_on_unmapped: false,
            strict: false,
            check_matches: false,
            check_overlaps: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to the layered settings shape for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "serviceowners_file": self.serviceowners_file,
            "services_file": self.services_file,
            "impacted": {
                "diff": self.diff,
                "max_files": self.max_files,
                "fail_on_unmapped": self.fail_on_unmapped
            },
            "lint": {
                "strict": self.strict,
                "check_matches": self.check_matches,
                "check_overlaps": self.check_overlaps
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.serviceowners_file, "SERVICEOWNERS");
        assert_eq!(defaults.services_file, "services.yaml");
        assert_eq!(defaults.max_files, 50);
        assert!(!defaults.fail_on_unmapped);
        assert!(!defaults.strict);
    }

    #[test]
    fn test_to_value_nests_sections() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["serviceowners_file"], "SERVICEOWNERS");
        assert_eq!(value["impacted"]["diff"], "HEAD~1...HEAD");
        assert_eq!(value["lint"]["check_overlaps"], false);
    }
}
