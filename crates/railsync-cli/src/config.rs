//! Application configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/railsync/config.toml` by default. Every section has working
//! defaults; the file only needs the values that differ.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use railsync_providers::{GoogleConfig, PortalConfig, WebDriverConfig};
use railsync_sync::{NotifyConfig, SyncOptions};

/// Configuration for the railsync CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Portal crawl settings.
    pub portal: PortalSettings,

    /// Calendar store settings.
    pub calendar: CalendarSettings,

    /// Synchronization settings.
    pub sync: SyncSettings,

    /// Notification settings.
    pub notify: NotifySettings,
}

/// Portal crawl settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    /// Login page URL.
    pub login_url: String,

    /// Path to the two-line credentials file; defaults to `login.txt`
    /// next to the config file.
    pub credentials_path: Option<PathBuf>,

    /// WebDriver endpoint.
    pub webdriver_url: String,

    /// Browser binary override.
    pub browser_binary: Option<String>,

    /// Base page-settle delay in seconds.
    pub page_settle_secs: u64,

    /// Bound on UI waits in seconds.
    pub wait_timeout_secs: u64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            login_url: railsync_providers::portal::DEFAULT_LOGIN_URL.to_string(),
            credentials_path: None,
            webdriver_url: "http://localhost:9515".to_string(),
            browser_binary: None,
            page_settle_secs: 2,
            wait_timeout_secs: 10,
        }
    }
}

/// Calendar store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Display name of the target calendar.
    pub name: String,

    /// Path to the authorized-user token file; defaults to `token.json`
    /// next to the config file.
    pub token_path: Option<PathBuf>,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            name: "Smooz".to_string(),
            token_path: None,
            request_timeout_secs: 30,
        }
    }
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Run the purge pass before inserting.
    pub clear: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { clear: true }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Whether run notifications are shown.
    pub enabled: bool,

    /// Application name shown by the notification daemon.
    pub app_name: String,

    /// Notification timeout in seconds.
    pub timeout_secs: u32,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: "railsync".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default path; a missing file yields
    /// the defaults.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("railsync")
    }

    /// Returns the default data directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("railsync")
    }

    /// Builds the portal crawl configuration.
    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            login_url: self.portal.login_url.clone(),
            credentials_path: self
                .portal
                .credentials_path
                .clone()
                .unwrap_or_else(|| Self::default_config_dir().join("login.txt")),
            page_settle: Duration::from_secs(self.portal.page_settle_secs),
            wait_timeout: Duration::from_secs(self.portal.wait_timeout_secs),
        }
    }

    /// Builds the WebDriver configuration.
    pub fn webdriver_config(&self) -> WebDriverConfig {
        WebDriverConfig {
            endpoint: self.portal.webdriver_url.clone(),
            browser_binary: self.portal.browser_binary.clone(),
            ..WebDriverConfig::default()
        }
    }

    /// Builds the calendar store configuration.
    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig {
            token_path: self
                .calendar
                .token_path
                .clone()
                .unwrap_or_else(|| Self::default_config_dir().join("token.json")),
            request_timeout: Duration::from_secs(self.calendar.request_timeout_secs),
        }
    }

    /// Builds the sync options, applying command-line overrides.
    pub fn sync_options(
        &self,
        debug: bool,
        no_clear: bool,
        calendar_override: Option<String>,
    ) -> SyncOptions {
        SyncOptions {
            calendar_name: calendar_override.unwrap_or_else(|| self.calendar.name.clone()),
            clear: self.sync.clear && !no_clear,
            debug,
        }
    }

    /// Builds the notification configuration.
    pub fn notify_config(&self) -> NotifyConfig {
        NotifyConfig {
            app_name: self.notify.app_name.clone(),
            timeout_secs: self.notify.timeout_secs,
            enabled: self.notify.enabled,
        }
    }
}
