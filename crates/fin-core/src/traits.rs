//! Configuration management trait.
//!
//! [`ConfigManager`] is what the CLI's `config` subcommands are written
//! against: locate the config file, load it (falling back to defaults),
//! render it back to TOML, and export it as environment variables.

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// A loadable, serializable configuration type.
pub trait ConfigManager: Default + Serialize + DeserializeOwned {
    /// Project name used for the config directory and env var prefix.
    fn project_name() -> &'static str;

    /// Environment variable prefix derived from the project name.
    ///
    /// - "fin" → "FIN"
    /// - "my-project" → "MY_PROJECT"
    fn env_prefix() -> String {
        Self::project_name().to_uppercase().replace(['-', ' '], "_")
    }

    /// Default location: `<platform config dir>/<project>/config.toml`.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path.
    ///
    /// Checks in order:
    /// 1. Explicit path (e.g. `--config`)
    /// 2. `{PREFIX}_CONFIG` environment variable
    /// 3. [`ConfigManager::default_config_path`]
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(format!("{}_CONFIG", Self::env_prefix())) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Apply overrides from a variable lookup. The default does nothing.
    fn apply_overrides<F>(&mut self, _lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(())
    }

    /// Load the configuration.
    ///
    /// A missing file yields the defaults; environment overrides are applied
    /// on top in both cases.
    fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(config_path) {
            Some(path) if path.exists() => {
                log::debug!("Loading configuration from {}", path.display());
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                toml::from_str(&content).map_err(|e| {
                    Error::config(format!("Failed to parse {}: {e}", path.display()))
                })?
            }
            _ => {
                log::debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Render as pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Render as `KEY=value` pairs understood by [`ConfigManager::apply_overrides`].
    fn to_env_vars(&self) -> Result<Vec<(String, String)>>;
}
