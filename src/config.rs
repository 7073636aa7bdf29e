use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ChunkTraceError, Result};
use crate::hash::{DEFAULT_HASH_LENGTH, MAX_HASH_LENGTH, MIN_HASH_LENGTH};

/// Top-level configuration for chunktrace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub hash_length: usize,
    pub default_split_budget: usize,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_length: DEFAULT_HASH_LENGTH,
            default_split_budget: 4000,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChunkTraceError::io(format!("reading config from '{}'", path.display()), e)
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ChunkTraceError::config_with_source("failed to parse config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChunkTraceError::config_with_source("failed to serialize config", e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChunkTraceError::io(
                    format!("creating config directory '{}'", parent.display()),
                    e,
                )
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            ChunkTraceError::io(format!("writing config to '{}'", path.display()), e)
        })
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&self.hash_length) {
            return Err(ChunkTraceError::validation(
                "hash_length",
                format!("must be between {MIN_HASH_LENGTH} and {MAX_HASH_LENGTH}"),
            ));
        }
        if self.default_split_budget == 0 {
            return Err(ChunkTraceError::validation(
                "default_split_budget",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Merge overrides on top of this config (non-default fields win).
    pub fn merge(&mut self, overrides: Config) {
        if overrides.hash_length != Config::default().hash_length {
            self.hash_length = overrides.hash_length;
        }
        if overrides.default_split_budget != Config::default().default_split_budget {
            self.default_split_budget = overrides.default_split_budget;
        }
        if overrides.cache != Config::default().cache {
            self.cache = overrides.cache;
        }
    }
}

/// Builder for constructing Config with selective overrides.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_hash_length(mut self, hash_length: usize) -> Self {
        self.config.hash_length = hash_length;
        self
    }

    pub fn with_split_budget(mut self, budget: usize) -> Self {
        self.config.default_split_budget = budget;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Discover the config file using standard search order:
/// 1. Explicit path (if provided)
/// 2. ./chunktrace.toml
/// 3. ~/.chunktrace.toml
/// 4. XDG config dir
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        return None;
    }

    let local = PathBuf::from("chunktrace.toml");
    if local.exists() {
        return Some(local);
    }

    if let Some(home) = dirs_home() {
        let home_config = home.join(".chunktrace.toml");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "chunktrace") {
        let xdg = proj_dirs.config_dir().join("chunktrace.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }

    None
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn serde_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn validation_rejects_out_of_range_hash_length() {
        let mut config = Config::default();
        config.hash_length = 4;
        assert!(config.validate().is_err());
        config.hash_length = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_budget() {
        let mut config = Config::default();
        config.default_split_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_with_hash_length() {
        let config = ConfigBuilder::new().with_hash_length(16).build().unwrap();
        assert_eq!(config.hash_length, 16);
    }

    #[test]
    fn merge_overrides_budget() {
        let mut base = Config::default();
        let mut overrides = Config::default();
        overrides.default_split_budget = 5000;
        base.merge(overrides);
        assert_eq!(base.default_split_budget, 5000);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunktrace.toml");
        let config = Config::default();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(config, loaded);
    }
}
