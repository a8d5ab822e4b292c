//! Configuration and the explicit context handed to command handlers.
//!
//! Settings come from, in order of precedence: command-line flags, environment
//! variables (handled by clap), and an optional `config.json` in the data
//! directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::obra::{resolve_obra, Obra};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_OBRA: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Obra used when `--obra` is not given.
    pub default_obra: String,
    /// date-fns style pattern for dates shown in reports.
    pub date_pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_obra: DEFAULT_OBRA.to_string(),
            date_pattern: "dd/MM/yyyy".to_string(),
        }
    }
}

impl Config {
    /// Load `config.json` from the data directory, or defaults when absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let buf = std::fs::read_to_string(&path)?;
        let config = serde_json::from_str(&buf)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

/// Pick the data directory: explicit flag/env value, else `$HOME/.obra`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".obra")
    })
}

/// Everything a command needs, passed explicitly rather than held in globals.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub obra: Obra,
}

impl AppContext {
    /// Build the context, creating the data directory if needed.
    pub fn build(data_dir: Option<PathBuf>, obra: Option<String>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir);
        std::fs::create_dir_all(&data_dir)?;
        let config = Config::load(&data_dir)?;
        let obra_name = obra.unwrap_or_else(|| config.default_obra.clone());
        let obra = resolve_obra(&obra_name, &data_dir)?;
        tracing::debug!(data_dir = %data_dir.display(), obra = %obra.id, "context ready");
        Ok(AppContext { config, data_dir, obra })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), r#"{"default_obra": "Torre Norte"}"#).unwrap();
        let c = Config::load(tmp.path()).unwrap();
        assert_eq!(c.default_obra, "Torre Norte");
        assert_eq!(c.date_pattern, "dd/MM/yyyy");
    }

    #[test]
    fn context_prefers_explicit_obra() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join(CONFIG_FILE), r#"{"default_obra": "Torre Norte"}"#).unwrap();

        let ctx = AppContext::build(Some(data_dir.clone()), None).unwrap();
        assert_eq!(ctx.obra.id, "torre_norte");
        let ctx = AppContext::build(Some(data_dir), Some("Bloco C".into())).unwrap();
        assert_eq!(ctx.obra.id, "bloco_c");
    }

    #[test]
    fn explicit_data_dir_wins() {
        assert_eq!(resolve_data_dir(Some(PathBuf::from("/srv/obra"))), PathBuf::from("/srv/obra"));
    }
}
