use config::{Config, ConfigError, Environment, File};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config/categories.toml";
const ENV_PREFIX: &str = "CATEGORIES";

/// Settings for the category tree store
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Re-check every nested-set invariant before committing a mutation
    #[serde(default)]
    pub verify_after_mutation: bool,
    #[serde(default = "default_root_name")]
    pub root_name: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/categories.db")
}

fn default_pool_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_root_name() -> String {
    "Root".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            verify_after_mutation: false,
            root_name: default_root_name(),
        }
    }
}

impl StoreConfig {
    /// Config pointing at an explicit database file, everything else defaulted
    pub fn with_database_path(path: impl AsRef<Path>) -> Self {
        Self {
            database_path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Loads `config/categories.toml` (optional) overlaid with
    /// `CATEGORIES__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let env = || Environment::with_prefix(ENV_PREFIX).separator("__");
        let settings = match Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env())
            .build()
        {
            Ok(settings) => settings,
            Err(err) => {
                if Path::new(CONFIG_FILE).exists() {
                    warn!("Failed to read {}, falling back to environment: {}", CONFIG_FILE, err);
                }
                Config::builder().add_source(env()).build()?
            }
        };

        settings.try_deserialize()
    }

    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify_after_mutation = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();

        assert_eq!(config.database_path, PathBuf::from("data/categories.db"));
        assert_eq!(config.pool_size, 8);
        assert!(!config.verify_after_mutation);
        assert_eq!(config.root_name, "Root");
    }

    #[test]
    fn test_partial_source_fills_defaults() -> anyhow::Result<()> {
        let settings = Config::builder()
            .set_override("database_path", "/tmp/ads.db")?
            .set_override("verify_after_mutation", true)?
            .build()?;
        let config: StoreConfig = settings.try_deserialize()?;

        assert_eq!(config.database_path, PathBuf::from("/tmp/ads.db"));
        assert!(config.verify_after_mutation);
        assert_eq!(config.busy_timeout_ms, 5000);
        Ok(())
    }
}
