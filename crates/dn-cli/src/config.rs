//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use dn_core::{DEFAULT_HORIZON, Polarity};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Which [`dn_core::AvailabilityStore`] backs the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// SQLite file at `database_path`.
    #[default]
    Sqlite,
    /// Process-local set, lost on exit.
    Memory,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    pub store: StoreKind,
    /// Meaning of a stored date.
    pub polarity: Polarity,
    /// Number of upcoming dates shown.
    pub horizon: usize,
    /// Address the web server listens on.
    pub bind: String,
    /// Model used for suggestions.
    pub model: String,
    /// Anthropic API key; `ANTHROPIC_API_KEY` is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Number of dates to ask the advisor for.
    pub suggestions: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("store", &self.store)
            .field("polarity", &self.polarity)
            .field("horizon", &self.horizon)
            .field("bind", &self.bind)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("suggestions", &self.suggestions)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("dn.db"),
            store: StoreKind::default(),
            polarity: Polarity::default(),
            horizon: DEFAULT_HORIZON,
            bind: "127.0.0.1:3000".to_string(),
            model: dn_llm::DEFAULT_MODEL.to_string(),
            api_key: None,
            suggestions: 5,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DN_*)
        figment = figment.merge(Env::prefixed("DN_"));

        figment.extract()
    }

    /// The API key to use, if any: the configured one, else `ANTHROPIC_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        pick_api_key(
            self.api_key.as_deref(),
            std::env::var("ANTHROPIC_API_KEY").ok().as_deref(),
        )
    }
}

fn pick_api_key(configured: Option<&str>, env: Option<&str>) -> Option<String> {
    [configured, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
}

/// Returns the platform-specific config directory for dn.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dn"))
}

/// Returns the platform-specific data directory for dn.
///
/// On Linux: `~/.local/share/dn`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("dn"))
}
