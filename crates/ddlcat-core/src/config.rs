//! Configuration schema (ddlcat.toml)

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema used to qualify unqualified DDL when none is configured
pub const DEFAULT_SCHEMA: &str = "public";

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Schema assigned to objects declared without one
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Apply COMMENT ON statements to the catalog
    #[serde(default)]
    pub extract_comments: bool,

    /// Source paths to skip when expanding directories (glob patterns)
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
            extract_comments: false,
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Check if a source path matches any exclude pattern
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, path)
            } else {
                pattern == path
            }
        })
    }
}

/// Simple glob matching (supports a single `*`)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = pattern[star_pos + 1..].trim_start_matches('*');

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
