//! Layered application configuration.
//!
//! Sources, later ones winning: built-in defaults, the TOML file under the
//! user's config directory, `GAMESCOPE_*` environment variables, and finally
//! `RAWG_API_KEY` for the API key.

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Upstream API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.rawg.io/api";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "RAWG_API_KEY";
/// Prefix for every other environment override.
pub const ENV_PREFIX: &str = "GAMESCOPE";

const CONFIG_DIR: &str = "gamescope";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# GameScope configuration.
# The API key may also be supplied through the RAWG_API_KEY environment variable.
# api_key = ""
api_base_url = "https://api.rawg.io/api"
page_size = 20
screenshot_count = 12
popular_count = 16
search_page_size = 24
games_popular_count = 40
"#;

/// Runtime configuration shared by the client, the favorites store and the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the upstream API.
    pub api_base_url: String,
    /// Static API key appended to every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Page size for listings.
    pub page_size: u32,
    /// Number of screenshots fetched for a game detail.
    pub screenshot_count: u32,
    /// Number of games shown on the home screen.
    pub popular_count: u32,
    /// Page size for game searches.
    pub search_page_size: u32,
    /// Number of popular games shown when the games screen first opens.
    pub games_popular_count: u32,
    /// Directory holding persisted key-value slots.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            page_size: 20,
            screenshot_count: 12,
            popular_count: 16,
            search_page_size: 24,
            games_popular_count: 40,
            storage_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(&config_path(), None)
    }

    /// Load configuration from `path`, reading environment overrides from
    /// `env_override` when given instead of the process environment.
    pub fn load_with(path: &Path, env_override: Option<HashMap<String, String>>) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("page_size", i64::from(defaults.page_size))?
            .set_default("screenshot_count", i64::from(defaults.screenshot_count))?
            .set_default("popular_count", i64::from(defaults.popular_count))?
            .set_default("search_page_size", i64::from(defaults.search_page_size))?
            .set_default("games_popular_count", i64::from(defaults.games_popular_count))?
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env_override.clone()),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        if let Some(key) = lookup_env(env_override.as_ref(), API_KEY_ENV) {
            config.api_key = Some(key);
        }
        config.api_key = config
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(config)
    }

    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The API key, or a descriptive error explaining how to provide one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "missing API key: set {API_KEY_ENV} or `api_key` in {}",
                config_path().display()
            )
        })
    }

    /// Directory for persisted key-value slots.
    pub fn storage_root(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_DIR)
                .join("storage")
        })
    }
}

/// Default location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default configuration file when none exists.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(&config_path())
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}

fn lookup_env(env_override: Option<&HashMap<String, String>>, key: &str) -> Option<String> {
    let value = match env_override {
        Some(map) => map.get(key).cloned(),
        None => env::var(key).ok(),
    };
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_without_file_or_env() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_with(&dir.path().join("missing.toml"), env(&[]))?;
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.screenshot_count, 12);
        assert_eq!(config.search_page_size, 24);
        assert_eq!(config.games_popular_count, 40);
        assert!(config.api_key().is_none());
        assert!(config.require_api_key().is_err());
        Ok(())
    }

    #[test]
    fn file_then_env_then_api_key_variable() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = 24\npopular_count = 8\napi_key = \"from-file\"\n")?;

        let config = AppConfig::load_with(&path, env(&[]))?;
        assert_eq!(config.page_size, 24);
        assert_eq!(config.popular_count, 8);
        assert_eq!(config.api_key(), Some("from-file"));

        let config = AppConfig::load_with(
            &path,
            env(&[
                ("GAMESCOPE_PAGE_SIZE", "40"),
                ("GAMESCOPE_SEARCH_PAGE_SIZE", "12"),
                (API_KEY_ENV, " secret "),
            ]),
        )?;
        assert_eq!(config.page_size, 40);
        assert_eq!(config.search_page_size, 12);
        assert_eq!(config.require_api_key()?, "secret");
        Ok(())
    }

    #[test]
    fn blank_key_counts_as_missing() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"   \"\n")?;
        let config = AppConfig::load_with(&path, env(&[(API_KEY_ENV, "")]))?;
        assert!(config.api_key().is_none());
        Ok(())
    }

    #[test]
    fn default_template_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.exists());

        fs::write(&path, "page_size = 30\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "page_size = 30\n");

        let fresh = dir.path().join("fresh.toml");
        write_default_config(&fresh)?;
        let config = AppConfig::load_with(&fresh, env(&[]))?;
        assert_eq!(config.popular_count, 16);
        assert_eq!(config.games_popular_count, 40);
        Ok(())
    }
}
