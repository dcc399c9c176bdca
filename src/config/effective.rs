//! Effective settings with provenance
//!
//! The merged layers are deserialized into a typed [`Settings`] so unknown
//! keys and wrong types are rejected before any command runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Repo config file name, looked up at the repository root
pub const REPO_CONFIG_FILE: &str = ".serviceowners.toml";

/// Origin of a settings layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Repo,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `impacted` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImpactedSettings {
    pub diff: String,
    pub max_files: usize,
    pub fail_on_unmapped: bool,
}

/// `lint` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintSettings {
    pub strict: bool,
    pub check_matches: bool,
    pub check_overlaps: bool,
}

/// Merged settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub serviceowners_file: String,
    pub services_file: String,
    pub impacted: ImpactedSettings,
    pub lint: LintSettings,
}

/// Values given on the command line; `None` leaves lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub serviceowners_file: Option<String>,
    pub services_file: Option<String>,
    pub diff: Option<String>,
    pub max_files: Option<usize>,
    pub fail_on_unmapped: Option<bool>,
    pub strict: Option<bool>,
    pub check_matches: Option<bool>,
    pub check_overlaps: Option<bool>,
}

impl CliOverrides {
    /// Shape the overrides like the settings tree
    pub fn to_value(&self) -> Value {
        let mut root = serde_json::Map::new();
        let mut impacted = serde_json::Map::new();
        let mut lint = serde_json::Map::new();

        if let Some(v) = &self.serviceowners_file {
            root.insert("serviceowners_file".into(), Value::from(v.as_str()));
        }
        if let Some(v) = &self.services_file {
            root.insert("services_file".into(), Value::from(v.as_str()));
        }
        if let Some(v) = &self.diff {
            impacted.insert("diff".into(), Value::from(v.as_str()));
        }
        if let Some(v) = self.max_files {
            impacted.insert("max_files".into(), Value::from(v));
        }
        if let Some(v) = self.fail_on_unmapped {
            impacted.insert("fail_on_unmapped".into(), Value::from(v));
        }
        if let Some(v) = self.strict {
            lint.insert("strict".into(), Value::from(v));
        }
        if let Some(v) = self.check_matches {
            lint.insert("check_matches".into(), Value::from(v));
        }
        if let Some(v) = self.check_overlaps {
            lint.insert("check_overlaps".into(), Value::from(v));
        }

        if !impacted.is_empty() {
            root.insert("impacted".into(), Value::Object(impacted));
        }
        if !lint.is_empty() {
            root.insert("lint".into(), Value::Object(lint));
        }
        Value::Object(root)
    }

    pub fn is_empty(&self) -> bool {
        self.to_value().as_object().map_or(true, |m| m.is_empty())
    }
}

/// Settings plus the layers they came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub settings: Settings,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveSettings {
    /// Build effective settings from layers
    pub fn build(
        repo_config_path: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        });

        // Layer 2: Repo config
        if let Some(path) = repo_config_path {
            if path.exists() {
                layers.push(Self::load_toml_file(path)?);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Repo,
                    path: Some(path.to_string_lossy().to_string()),
                });
            }
        }

        // Layer 3: CLI overrides
        if let Some(cli) = cli_overrides.filter(|c| !c.is_empty()) {
            layers.push(cli.to_value());
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let merged = merge_layers(layers);
        let settings: Settings = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(format!("invalid settings: {}", e)))?;
        Self::validate(&settings)?;

        tracing::debug!(layers = sources.len(), "resolved settings");
        Ok(Self { settings, sources })
    }

    /// Load a TOML file as a JSON value
    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        toml::from_str::<Value>(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    fn validate(settings: &Settings) -> Result<(), ConfigError> {
        if settings.impacted.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "impacted.max_files must be greater than 0".to_string(),
            ));
        }
        if settings.serviceowners_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "serviceowners_file must not be empty".to_string(),
            ));
        }
        if settings.services_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "services_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
