//! Services catalog loading
//!
//! The catalog lives in `services.yaml` at the repository root. Services sit
//! under a top-level `services` mapping, or make up the whole document:
//!
//! ```yaml
//! version: 1
//! services:
//!   api:
//!     description: Public HTTP API
//!     owners: ["@acme/api-team", { email: api@acme.dev }]
//!     contact: { slack: "#api" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use serviceowners_core::{Service, ServiceCatalog};

/// Errors that can occur when loading the catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read services file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse services file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Services file must be a mapping of service names")]
    NotAMapping,

    #[error("Service '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Load the catalog at `path`; a missing file is an empty catalog
pub fn load_catalog(path: &Path) -> Result<ServiceCatalog, CatalogError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no services file");
        return Ok(ServiceCatalog::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(&content)?;
    tracing::debug!(path = %path.display(), services = catalog.len(), "loaded services catalog");
    Ok(catalog)
}

/// Parse catalog YAML
pub fn parse_catalog(content: &str) -> Result<ServiceCatalog, CatalogError> {
    let document: Value = serde_yaml::from_str(content)?;

    let mut root = match document {
        Value::Null => return Ok(ServiceCatalog::default()),
        Value::Mapping(root) => root,
        _ => return Err(CatalogError::NotAMapping),
    };

    // A `services` mapping wins over any sibling keys such as `version`
    let services = match root.remove("services") {
        Some(Value::Mapping(services)) => services,
        Some(other) => {
            root.insert(Value::String("services".to_string()), other);
            root
        }
        None => root,
    };

    let mut parsed = BTreeMap::new();
    for (key, value) in services {
        let name = match key {
            Value::String(name) if !name.trim().is_empty() => name,
            other => {
                return Err(CatalogError::Invalid {
                    name: display_key(&other),
                    reason: "service name must be a non-empty string".to_string(),
                })
            }
        };

        let service = match value {
            Value::Null => Service::default(),
            value @ Value::Mapping(_) => {
                serde_yaml::from_value(value).map_err(|e| CatalogError::Invalid {
                    name: name.clone(),
                    reason: e.to_string(),
                })?
            }
            _ => {
                return Err(CatalogError::Invalid {
                    name,
                    reason: "expected a mapping".to_string(),
                })
            }
        };
        parsed.insert(name, service);
    }

    Ok(ServiceCatalog::new(parsed))
}

fn display_key(key: &Value) -> String {
    serde_yaml::to_string(key)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}
