//! Configuration management.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use spyder::{EngineConfig, PoolConfig};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Resolver pool settings.
    #[serde(default)]
    pub resolver: PoolConfig,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Get the config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "spyder", "spyder")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.output_format.is_none());
        assert_eq!(config.resolver.resolvers.len(), 4);
        assert_eq!(config.engine.max_depth, 1);
    }

    #[test]
    fn test_partial_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output_format = "plain"

[resolver]
resolvers = ["1.1.1.1"]
min_interval_ms = 50

[engine]
max_depth = 2
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Plain));
        assert_eq!(config.resolver.resolvers, vec!["1.1.1.1"]);
        assert_eq!(config.resolver.min_interval_ms, 50);
        assert_eq!(config.resolver.timeout_ms, 2_000);
        assert_eq!(config.engine.max_depth, 2);
        assert_eq!(config.engine.brute_concurrency, 500);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.engine.expand_concurrency = 8;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.expand_concurrency, 8);
    }

    #[test]
    fn test_unbounded_passive_window_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.engine.passive_window_secs = 0;
        config.save_to(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("passive_window_secs = 0"));
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.passive_window_duration(), None);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nmax_depth = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
