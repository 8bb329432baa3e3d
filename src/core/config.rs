//! Configuration management for ctrlbot.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".ctrlbot.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File locations
    pub general: GeneralConfig,

    /// Service timeouts
    pub service: ServiceConfig,

    /// Where the bot token is kept
    pub credentials: CredentialsConfig,

    /// UI/TUI settings
    pub ui: UiConfig,
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Settings document shared by all controllers
    pub settings_file: String,

    /// Directory scanned for `controller_*.toml` units
    pub controllers_dir: String,
}

/// Service timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How long to wait for the connection handshake
    pub start_timeout_ms: u64,

    /// How long to wait for the client to close before forcing it
    pub stop_timeout_ms: u64,
}

/// Credential backend choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialBackend {
    /// `.env` file plus process environment
    #[default]
    EnvFile,
    /// OS keychain
    Keyring,
}

/// Where the bot token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub backend: CredentialBackend,

    /// Env file used by the `env-file` backend
    pub env_file: String,

    /// Variable name holding the token
    pub env_key: String,
}

/// UI/TUI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Redraw and event poll interval
    pub tick_rate_ms: u64,

    /// Console lines kept in memory
    pub max_log_lines: usize,

    /// Console lines longer than this are truncated
    pub max_line_len: usize,
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.ctrlbot.toml` in current directory
    /// 2. `~/.config/ctrlbot/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::locate() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Config file that [`AppConfig::load`] would read, if any exists.
    pub fn locate() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        Self::global_path().filter(|path| path.exists())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let config_path = Self::global_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ctrlbot"))
    }

    /// Global config file path.
    pub fn global_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Get the data directory path (for the TUI log file).
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("ctrlbot"))
    }

    /// Settings document path with `~` expanded.
    pub fn settings_path(&self) -> PathBuf {
        expand(&self.general.settings_file)
    }

    /// Controllers directory with `~` expanded.
    pub fn controllers_path(&self) -> PathBuf {
        expand(&self.general.controllers_dir)
    }

    /// Env file path with `~` expanded.
    pub fn env_file_path(&self) -> PathBuf {
        expand(&self.credentials.env_file)
    }
}

impl ServiceConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl UiConfig {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            settings_file: "settings.json".to_string(),
            controllers_dir: "controller/modals".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { start_timeout_ms: 30_000, stop_timeout_ms: 5_000 }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::EnvFile,
            env_file: ".env".to_string(),
            env_key: crate::security::DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 100, max_log_lines: 200, max_line_len: 200 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.general.settings_file, "settings.json");
        assert_eq!(config.general.controllers_dir, "controller/modals");
        assert_eq!(config.service.start_timeout(), Duration::from_secs(30));
        assert_eq!(config.credentials.backend, CredentialBackend::EnvFile);
        assert_eq!(config.credentials.env_key, "DISCORD_TOKEN");
        assert_eq!(config.ui.max_log_lines, 200);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[credentials]"));
        assert!(toml_str.contains("backend = \"env-file\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            settings_file = "~/bot/settings.json"

            [credentials]
            backend = "keyring"

            [ui]
            max_log_lines = 50
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.credentials.backend, CredentialBackend::Keyring);
        assert_eq!(config.credentials.env_file, ".env");
        assert_eq!(config.ui.max_log_lines, 50);
        assert_eq!(config.ui.tick_rate_ms, 100);
        assert_eq!(config.general.controllers_dir, "controller/modals");
        assert!(!config.settings_path().starts_with("~"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.service.stop_timeout_ms = 1_000;

        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_tick_rate_floor() {
        let ui = UiConfig { tick_rate_ms: 0, ..UiConfig::default() };
        assert_eq!(ui.tick_rate(), Duration::from_millis(10));
    }
}
