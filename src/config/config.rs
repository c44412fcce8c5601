//! Configuration types and loading.

use crate::differ::{FilterStyle, RedactionRule};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Error loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level configuration. Parsing is strict: an unknown key is a typo,
/// and silently accepting it would silently drop the rule it meant to set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Pattern dialect for every differ's match/ignore patterns.
    #[serde(default)]
    pub filter_style: FilterStyle,
    pub differs: Vec<DifferConfig>,
    /// Label comparison rule shared by all differs.
    #[serde(default)]
    pub common_label_config: RedactionRule,
    /// Annotation comparison rule shared by all differs.
    #[serde(default)]
    pub common_annotation_config: RedactionRule,
}

/// Configuration for one watched resource type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DifferConfig {
    pub group_kind: GroupKind,
    #[serde(default)]
    pub match_pattern: Option<String>,
    #[serde(default)]
    pub ignore_pattern: Option<String>,
}

/// Group and kind identifying a resource type to watch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupKind {
    #[serde(default)]
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    /// `group/kind` string used in logs and error messages.
    pub fn qualified(&self) -> String {
        if self.group.is_empty() {
            self.kind.clone()
        } else {
            format!("{}/{}", self.group, self.kind)
        }
    }
}

impl Default for Config {
    /// Watches apps/deployment with no name filtering and no metadata
    /// comparison.
    fn default() -> Self {
        Config {
            filter_style: FilterStyle::default(),
            differs: vec![DifferConfig {
                group_kind: GroupKind {
                    group: "apps".into(),
                    kind: "deployment".into(),
                },
                match_pattern: None,
                ignore_pattern: None,
            }],
            common_label_config: RedactionRule::disabled(),
            common_annotation_config: RedactionRule::disabled(),
        }
    }
}

/// Loads a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}
