//! Configuration file support for lunamon.
//!
//! Loads `lunamon.toml` from the working directory, falling back to the
//! user's config directory.

use anyhow::{Context, Result};
use lunamon_trace::FilterSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loaded from `lunamon.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Monitor command (program and arguments) used when no source is given
    pub command: Option<Vec<String>>,
    /// Default log level
    pub log_level: Option<String>,
    /// Default output format (pretty, json, compact)
    pub output: Option<String>,
    /// Display filter used by `watch`; outbound-only when absent
    pub filter: Option<FilterSpec>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "lunamon.toml";

impl MonitorConfig {
    /// Load configuration for the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if a config file exists and parses successfully
    /// - `Ok(None)` if no config file exists
    /// - `Err(...)` if a file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let local = working_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from(&local).map(Some);
        }

        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_from(&path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: MonitorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lunamon").join(CONFIG_FILE_NAME))
    }

    /// Base display filter for `watch`, before command-line flags.
    pub fn filter(&self) -> FilterSpec {
        self.filter.clone().unwrap_or_else(FilterSpec::outbound_only)
    }

    /// Configured command, if any and non-empty.
    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref().filter(|c| !c.is_empty())
    }
}
