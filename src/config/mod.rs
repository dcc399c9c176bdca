//! Settings layering
//!
//! Settings are merged from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. Repo config (`.serviceowners.toml` at the repository root)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    CliOverrides, ConfigError, ConfigOrigin, ConfigSource, EffectiveSettings, ImpactedSettings,
    LintSettings, Settings, REPO_CONFIG_FILE,
};
pub use merge::{deep_merge, merge_layers};
