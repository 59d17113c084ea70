//! Engine configuration.
//!
//! Every field has a default, so a YAML file only needs the keys it changes:
//!
//! ```yaml
//! delimiters:
//!   start: "[["
//!   end: "]]"
//! extension: .html
//! max_depth: 32
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use wispy_scan::{Delimiters, DEFAULT_END, DEFAULT_START};

use crate::error::ConfigError;

pub const DEFAULT_EXTENSION: &str = ".hstm";
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Start/end delimiter strings as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimiterConfig {
    pub start: String,
    pub end: String,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
        }
    }
}

/// Settings fixed for the lifetime of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub delimiters: DelimiterConfig,
    /// Template file extension, including the dot.
    pub extension: String,
    /// Directory under the site root holding partials.
    pub partials_dir: String,
    /// Directory under the site root holding layouts and extendable parents.
    pub layouts_dir: String,
    /// Layout wrapped around every page by [`Engine::render_page`](crate::Engine::render_page).
    pub root_layout: String,
    /// Sidecar JSON file merged into page data, looked up next to the page.
    pub data_file: String,
    /// Request header that disables layout wrapping.
    pub bypass_header: String,
    /// Maximum nesting of template renders before giving up.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delimiters: DelimiterConfig::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            partials_dir: "partials".to_string(),
            layouts_dir: "layouts".to_string(),
            root_layout: "root".to_string(),
            data_file: "data_en.json".to_string(),
            bypass_header: "HX-Request".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Checks the settings and returns the validated delimiter pair.
    pub fn validate(&self) -> Result<Delimiters, ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(Delimiters::new(
            self.delimiters.start.clone(),
            self.delimiters.end.clone(),
        )?)
    }
}
