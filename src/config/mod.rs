use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "folio.toml";
pub const DEFAULT_DATABASE_FILE: &str = "folio.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 100;
pub const DEFAULT_LOG_FILTER: &str = "folio=info";

/// Settings read from `folio.toml` in the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Set from the directory the file was loaded from, never from the file.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub database_file: String,
    /// How long a writer waits on another transaction's lock before failing.
    pub busy_timeout_ms: u64,
    pub max_title_length: usize,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads `folio.toml` from `data_dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.data_dir = data_dir.to_path_buf();

        if config.max_title_length == 0 {
            return Err(Error::Config(
                "max_title_length must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Writes the configuration to `folio.toml` in its data directory.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let content = toml::to_string_pretty(self)?;
        fs::write(self.data_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();

        assert_eq!(config.database_file, "folio.db");
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.max_title_length, 100);
        assert_eq!(config.db_path(), temp.path().join("folio.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "database_file = \"kb.db\"\nbusy_timeout_ms = 250\n",
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.db_path(), temp.path().join("kb.db"));
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.log_filter, "folio=info");
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            max_title_length: 42,
            ..Config::default()
        };
        config.save().unwrap();

        assert_eq!(Config::load(temp.path()).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "busy_timeout_ms = \"soon\"").unwrap();

        assert!(matches!(Config::load(temp.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_title_length_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "max_title_length = 0").unwrap();

        assert!(matches!(Config::load(temp.path()), Err(Error::Config(_))));
    }
}
