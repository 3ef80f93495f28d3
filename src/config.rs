//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/flatree/flatree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `FLATREE_*` prefix
//!
//! Command-line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ForestCache};
use crate::domain::{ComposeOptions, CrossGroupPolicy, GroupKey, MissingOrder, NodeId, Payload, TreeComposer};

/// Unified configuration for flatree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Placement of siblings without an order value (default: last)
    pub missing_order: MissingOrder,
    /// Handling of parents that live in another group (default: promote)
    pub cross_group: CrossGroupPolicy,
    /// Compose independent groups in parallel
    pub parallel: bool,
    /// Maximum number of forests kept by `ForestCache`
    pub cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            missing_order: MissingOrder::Last,
            cross_group: CrossGroupPolicy::Promote,
            parallel: false,
            cache_capacity: 64,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub missing_order: Option<MissingOrder>,
    pub cross_group: Option<CrossGroupPolicy>,
    pub parallel: Option<bool>,
    pub cache_capacity: Option<usize>,
}

/// Get the XDG config directory for flatree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flatree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("flatree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            missing_order: overlay.missing_order.unwrap_or(self.missing_order),
            cross_group: overlay.cross_group.unwrap_or(self.cross_group),
            parallel: overlay.parallel.unwrap_or(self.parallel),
            cache_capacity: overlay.cache_capacity.unwrap_or(self.cache_capacity),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit TOML file; it must exist if given
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            current = current.merge_with(&load_raw_settings(path)?);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply FLATREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("FLATREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("missing_order") {
            settings.missing_order = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_string("cross_group") {
            settings.cross_group = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("parallel") {
            settings.parallel = val;
        }
        if let Ok(val) = config.get_int("cache_capacity") {
            settings.cache_capacity = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("cache_capacity must not be negative: {val}"),
            })?;
        }

        Ok(settings)
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            missing_order: self.missing_order,
            cross_group: self.cross_group,
            parallel: self.parallel,
        }
    }

    /// Empty forest cache sized by `cache_capacity`, composing with these settings.
    pub fn forest_cache<I, G, P>(&self) -> ForestCache<I, G, P>
    where
        I: NodeId + Serialize,
        G: GroupKey + Serialize,
        P: Payload + Serialize,
    {
        ForestCache::new(TreeComposer::new(self.compose_options()), self.cache_capacity)
    }

    /// Render as TOML, for `flatree config`-style inspection.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_with_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            cross_group: Some(CrossGroupPolicy::Reject),
            ..RawSettings::default()
        };
        let merged = base.merge_with(&overlay);
        assert_eq!(merged.cross_group, CrossGroupPolicy::Reject);
        assert_eq!(merged.missing_order, MissingOrder::Last);
        assert_eq!(merged.cache_capacity, 64);
    }

    #[test]
    fn test_raw_settings_parse_lowercase_enums() {
        let raw: RawSettings = toml::from_str("missing_order = \"first\"\nparallel = true\n").unwrap();
        assert_eq!(raw.missing_order, Some(MissingOrder::First));
        assert_eq!(raw.parallel, Some(true));
        assert_eq!(raw.cross_group, None);
    }

    #[test]
    fn test_compose_options_mirror_settings() {
        let settings = Settings {
            parallel: true,
            ..Settings::default()
        };
        let options = settings.compose_options();
        assert!(options.parallel);
        assert_eq!(options.cross_group, CrossGroupPolicy::Promote);
    }

    #[test]
    fn test_forest_cache_respects_zero_capacity() {
        let settings = Settings {
            cache_capacity: 0,
            ..Settings::default()
        };
        let nodes = vec![crate::domain::Node::new(1_i64, "g".to_string(), ())];
        let mut cache = settings.forest_cache();

        let forest = cache.get_or_compose(&nodes, &"g".to_string()).unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(cache.stats().entries, 0);
    }
}
