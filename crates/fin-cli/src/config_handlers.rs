//! Handler functions for config CLI commands.
//!
//! The `path`, `get`, `set`, `init` and `export` subcommands work on any
//! [`ConfigManager`]; `fin` dispatches them with [`FinConfig`]. Keys are
//! dotted TOML paths such as `acl.container_name`. Handlers return the text
//! to print so the dispatcher owns stdout.

use std::path::{Path, PathBuf};

use fin_core::{ConfigManager, Error, FinConfig, Result};

use crate::cli::ConfigAction;

// ============================================================================
// Command dispatch
// ============================================================================

/// Run a `fin config` subcommand.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    let output = match action {
        ConfigAction::Path => {
            let (path, exists) = cmd_config_path::<FinConfig>(config_path)?;
            if !exists {
                eprintln!("(not created yet; run `fin config init`)");
            }
            path.display().to_string()
        }
        ConfigAction::Get { key } => cmd_config_get::<FinConfig>(config_path, &key)?,
        ConfigAction::Set { key, value } => {
            let path = cmd_config_set::<FinConfig>(config_path, &key, &value)?;
            format!("Set {key} = {value} in {}", path.display())
        }
        ConfigAction::Init { file, force } => {
            let path = cmd_config_init::<FinConfig>(file.as_deref().or(config_path), force)?;
            format!("Config file created at {}", path.display())
        }
        ConfigAction::Export { docker_env } => {
            cmd_config_export(&FinConfig::load(config_path)?, docker_env)?
        }
    };
    println!("{output}");
    Ok(())
}

// ============================================================================
// Generic command handlers
// ============================================================================

/// The resolved config file path and whether it exists.
pub fn cmd_config_path<C: ConfigManager>(config_path: Option<&str>) -> Result<(PathBuf, bool)> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))?;
    let exists = path.exists();
    Ok((path, exists))
}

/// The effective value at a dotted key, after defaults and env overrides.
pub fn cmd_config_get<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Write a value at a dotted key into the config file; returns the file.
///
/// The edited document must still load as `C`, otherwise nothing is written.
pub fn cmd_config_set<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    value: &str,
) -> Result<PathBuf> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{} config init` first.",
            path.display(),
            C::project_name()
        )));
    }

    let mut doc = read_document(&path)?;
    set_nested_value(&mut doc, key, parse_value(value))?;
    doc.clone()
        .try_into::<C>()
        .map_err(|e| Error::config(format!("Invalid value for {key}: {e}")))?;

    let rendered = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, rendered).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// Write the default configuration; returns the file.
pub fn cmd_config_init<C: ConfigManager>(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    std::fs::write(&path, C::default().to_toml_string()?)
        .map_err(|e| Error::io_with_path(e, &path))?;
    tracing::info!(path = %path.display(), "Wrote default configuration");
    Ok(path)
}

/// The configuration as `KEY=value` lines, or `--env KEY=value` for docker.
pub fn cmd_config_export<C: ConfigManager>(config: &C, docker_env: bool) -> Result<String> {
    let prefix = if docker_env { "--env " } else { "" };
    let lines: Vec<String> = config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| format!("{prefix}{key}={value}"))
        .collect();
    Ok(lines.join("\n"))
}

fn read_document(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
}

// ============================================================================
// Dotted-key helpers
// ============================================================================

/// The value at a dotted key.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set the value at a dotted key, creating intermediate tables.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        current = current
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("Cannot navigate into '{part}'")))?
            .entry(part)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    current
        .as_table_mut()
        .ok_or_else(|| Error::config(format!("Cannot set '{key}' on a non-table value")))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a command-line value: bool, then integer, then float, then string.
pub fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => return toml::Value::Boolean(true),
        "false" => return toml::Value::Boolean(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Render a value for stdout; tables and arrays print as TOML.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn default_file(dir: &TempDir) -> String {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, FinConfig::default().to_toml_string().unwrap()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_config_path_explicit() {
        let (path, exists) = cmd_config_path::<FinConfig>(Some("/explicit/config.toml")).unwrap();
        assert_eq!(path, PathBuf::from("/explicit/config.toml"));
        assert!(!exists);
    }

    #[test]
    fn test_config_get_values() {
        let dir = TempDir::new().unwrap();
        let file = default_file(&dir);

        assert_eq!(
            cmd_config_get::<FinConfig>(Some(&file), "acl.container_name").unwrap(),
            ".acl"
        );
        assert_eq!(
            cmd_config_get::<FinConfig>(Some(&file), "acl.admin_group").unwrap(),
            "/.groups/admins"
        );
        let table = cmd_config_get::<FinConfig>(Some(&file), "cache").unwrap();
        assert!(table.contains("enabled = false"));
    }

    #[test]
    fn test_config_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let file = default_file(&dir);

        let err = cmd_config_get::<FinConfig>(Some(&file), "nonexistent.key").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_config_set_nested_key() {
        let dir = TempDir::new().unwrap();
        let file = default_file(&dir);

        cmd_config_set::<FinConfig>(Some(&file), "cache.ttl_seconds", "60").unwrap();
        cmd_config_set::<FinConfig>(Some(&file), "host", "https://repo.example.org").unwrap();

        let content = std::fs::read_to_string(&file).unwrap();
        let loaded: FinConfig = toml::from_str(&content).unwrap();
        assert_eq!(loaded.cache.ttl_seconds, Some(60));
        assert_eq!(loaded.host, "https://repo.example.org");
    }

    #[test]
    fn test_config_set_rejects_wrong_type() {
        let dir = TempDir::new().unwrap();
        let file = default_file(&dir);

        let err = cmd_config_set::<FinConfig>(Some(&file), "cache.enabled", "often").unwrap_err();
        assert!(err.to_string().contains("cache.enabled"));
        assert!(!std::fs::read_to_string(&file).unwrap().contains("often"));
    }

    #[test]
    fn test_config_set_missing_file() {
        let err =
            cmd_config_set::<FinConfig>(Some("/nonexistent/config.toml"), "host", "x").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_config_init_creates_and_protects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fin").join("config.toml");
        let file = path.to_str().unwrap();

        assert_eq!(cmd_config_init::<FinConfig>(Some(file), false).unwrap(), path);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[acl]"));
        assert!(content.contains("base_path"));

        let err = cmd_config_init::<FinConfig>(Some(file), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(cmd_config_init::<FinConfig>(Some(file), true).is_ok());
    }

    #[test]
    fn test_config_export() {
        let config = FinConfig {
            jwt: Some("token".into()),
            ..FinConfig::default()
        };

        let plain = cmd_config_export(&config, false).unwrap();
        assert!(plain.lines().any(|l| l == "FIN_HOST=http://localhost:3000"));
        assert!(plain.lines().any(|l| l == "FIN_JWT=token"));

        let docker = cmd_config_export(&config, true).unwrap();
        assert!(docker.lines().all(|l| l.starts_with("--env FIN_")));
    }

    #[test]
    fn test_nested_value_helpers() {
        let mut val: toml::Value = toml::from_str("[cache]\nttl_seconds = 30").unwrap();
        assert_eq!(
            get_nested_value(&val, "cache.ttl_seconds"),
            Some(&toml::Value::Integer(30))
        );
        assert!(get_nested_value(&val, "cache.missing").is_none());

        set_nested_value(&mut val, "acl.container_name", parse_value(".acl2")).unwrap();
        set_nested_value(&mut val, "cache.ttl_seconds", parse_value("90")).unwrap();
        assert_eq!(
            get_nested_value(&val, "acl.container_name"),
            Some(&toml::Value::String(".acl2".into()))
        );
        assert_eq!(
            get_nested_value(&val, "cache.ttl_seconds"),
            Some(&toml::Value::Integer(90))
        );

        assert!(set_nested_value(&mut val, "cache.ttl_seconds.deeper", parse_value("1")).is_err());
        assert!(set_nested_value(&mut val, "cache.", parse_value("1")).is_err());
    }

    #[test]
    fn test_parse_and_format_values() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("-7"), toml::Value::Integer(-7));
        assert_eq!(parse_value("2.5"), toml::Value::Float(2.5));
        assert_eq!(
            parse_value("/.groups/admins"),
            toml::Value::String("/.groups/admins".into())
        );

        assert_eq!(format_toml_value(&toml::Value::String("x".into())), "x");
        assert_eq!(format_toml_value(&toml::Value::Float(2.5)), "2.5");
        assert_eq!(format_toml_value(&toml::Value::Boolean(false)), "false");
    }
}
