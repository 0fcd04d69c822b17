use crate::constants::*;
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the tune collection lives.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub uri: String,
    pub db_name: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_STORE_URI.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Read the store location from the environment (and `.env`), falling back
    /// to the local defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            uri: pick(STORE_URI_ENV, DEFAULT_STORE_URI),
            db_name: pick(DB_NAME_ENV, DEFAULT_DB_NAME),
            collection: pick(COLLECTION_ENV, DEFAULT_COLLECTION),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let valid_collection = self
            .collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_collection {
            return Err(ScraperError::Config(format!(
                "Collection name '{}' may only contain letters, digits and '_'",
                self.collection
            )));
        }
        if self.db_name.contains(['/', '\\']) {
            return Err(ScraperError::Config(format!(
                "Database name '{}' must not contain path separators",
                self.db_name
            )));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.uri).join(format!("{}.db", self.db_name))
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    scraper: ScraperConfig,
}

/// Crawler settings, optionally overridden by the `[scraper]` table of `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub delay_ms: u64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = file.scraper;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn store_defaults_apply_when_env_is_unset() {
        let config = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.database_path(), Path::new("data").join("music-notation.db"));
    }

    #[test]
    fn store_env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            (STORE_URI_ENV, "/var/lib/tunes"),
            (DB_NAME_ENV, "archive"),
            (COLLECTION_ENV, ""),
        ]
        .into_iter()
        .collect();
        let config = StoreConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.uri, "/var/lib/tunes");
        assert_eq!(config.db_name, "archive");
        assert_eq!(config.collection, "scores");
    }

    #[test]
    fn collection_names_are_restricted() {
        let result = StoreConfig::from_lookup(|k| {
            (k == COLLECTION_ENV).then(|| "scores; DROP TABLE x".to_string())
        });
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }

    #[test]
    fn scraper_config_reads_partial_toml() {
        let config = ScraperConfig::from_toml("[scraper]\ndelay_ms = 250\nbase_url = \"http://localhost:8080/\"\n").unwrap();
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = ScraperConfig::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config, ScraperConfig::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ScraperConfig::from_toml("[scraper\ndelay_ms = 1"),
            Err(ScraperError::Toml(_))
        ));
    }
}
