//! Configuration for gi-verify.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Verifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// External portal configuration.
    #[serde(default)]
    pub portal: PortalConfig,

    /// Per-step timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Browser launch configuration.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Timeout-rate drift monitor.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// HTTP surface.
    #[serde(default)]
    pub server: ServerConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// External verification portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Absolute URL of the portal entry page.
    #[serde(default)]
    pub url: String,
}

/// Per-step timeouts for a verification job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Initial navigation to the entry page, in seconds.
    #[serde(default = "default_navigation_secs")]
    pub navigation_secs: u64,

    /// Waiting for the identifier input to appear, in seconds.
    #[serde(default = "default_element_secs")]
    pub element_secs: u64,

    /// Race between results table and rejection heading, in seconds.
    #[serde(default = "default_classification_secs")]
    pub classification_secs: u64,

    /// How often element waits re-query the page, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Headless browser launch options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Keep the Chrome sandbox enabled.
    #[serde(default = "default_true")]
    pub sandbox: bool,

    /// Viewport width in pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Viewport height in pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Drift monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Number of most recent jobs considered.
    #[serde(default = "default_monitor_window")]
    pub window: usize,

    /// Fraction of timed-out jobs in a full window that raises an alert.
    #[serde(default = "default_timeout_ratio")]
    pub timeout_ratio: f64,
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            portal: PortalConfig::default(),
            timeouts: TimeoutConfig::default(),
            browser: BrowserConfig::default(),
            monitor: MonitorConfig::default(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_secs: default_navigation_secs(),
            element_secs: default_element_secs(),
            classification_secs: default_classification_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            sandbox: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window: default_monitor_window(),
            timeout_ratio: default_timeout_ratio(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl TimeoutConfig {
    /// Navigation timeout.
    #[must_use]
    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    /// Element wait timeout.
    #[must_use]
    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }

    /// Classification race timeout.
    #[must_use]
    pub fn classification(&self) -> Duration {
        Duration::from_secs(self.classification_secs)
    }

    /// Element polling interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_navigation_secs() -> u64 {
    30
}

const fn default_element_secs() -> u64 {
    10
}

const fn default_classification_secs() -> u64 {
    15
}

const fn default_poll_interval_ms() -> u64 {
    250
}

const fn default_window_width() -> u32 {
    1280
}

const fn default_window_height() -> u32 {
    900
}

const fn default_monitor_window() -> usize {
    50
}

const fn default_timeout_ratio() -> f64 {
    0.5
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "gi-verify")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("gi-verify.toml"))
}

impl VerifierConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse and return the portal entry URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is missing or not absolute.
    pub fn portal_url(&self) -> crate::Result<url::Url> {
        if self.portal.url.trim().is_empty() {
            return Err(crate::Error::Config("portal.url is not set".to_string()));
        }
        url::Url::parse(self.portal.url.trim())
            .map_err(|e| crate::Error::Config(format!("invalid portal.url: {e}")))
    }
}
