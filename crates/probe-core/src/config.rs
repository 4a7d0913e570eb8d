//! Configuration management for scribe-probe.
//!
//! Settings are layered: built-in defaults, an optional TOML file, then the
//! `BACKEND_URL` / `TEST_USERNAME` / `TEST_PASSWORD` environment variables.
//! Command line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{APP_NAME, BACKEND_URL_ENV, DEFAULT_OUTPUT_FILE, PASSWORD_ENV, USERNAME_ENV};

/// Reasons a configuration is rejected before the run starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("Request timeout must be at least one second")]
    ZeroTimeout,

    #[error("No test cases configured")]
    NoCases,

    #[error("Test case #{0} has an empty name")]
    UnnamedCase(usize),

    #[error("Test case {0:?} has an empty filename")]
    MissingFilename(String),
}

/// A single upload scenario: a named payload size and the filename it is
/// uploaded under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestCase {
    pub name: String,
    pub size_bytes: usize,
    pub filename: String,
}

impl TestCase {
    pub fn new(name: impl Into<String>, size_bytes: usize, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            filename: filename.into(),
        }
    }
}

/// The standard small / medium / large upload set.
pub fn default_cases() -> Vec<TestCase> {
    vec![
        TestCase::new("Small Audio (100 KB)", 100 * 1024, "test_audio_small.webm"),
        TestCase::new("Medium Audio (1 MB)", 1024 * 1024, "test_audio_medium.webm"),
        TestCase::new("Large Audio (5 MB)", 5 * 1024 * 1024, "test_audio_large.webm"),
    ]
}

/// Harness configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Backend base URL, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Login identifier
    #[serde(default = "default_username")]
    pub username: String,

    /// Login password
    #[serde(default = "default_password")]
    pub password: String,

    /// Upper bound on a single request before it counts as a transport failure
    #[serde(
        default = "default_request_timeout_secs",
        skip_serializing_if = "is_default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Pause between consecutive test cases
    #[serde(default = "default_delay_ms", skip_serializing_if = "is_default_delay_ms")]
    pub delay_ms: u64,

    /// Where the results file is written
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Upload scenarios, run in order
    #[serde(default = "default_cases")]
    pub cases: Vec<TestCase>,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_username() -> String {
    "admin@clinic.test".to_string()
}

fn default_password() -> String {
    "password123".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn is_default_request_timeout_secs(v: &u64) -> bool {
    *v == 300
}

fn default_delay_ms() -> u64 {
    1000
}

fn is_default_delay_ms(v: &u64) -> bool {
    *v == 1000
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: default_username(),
            password: default_password(),
            request_timeout_secs: default_request_timeout_secs(),
            delay_ms: default_delay_ms(),
            output: default_output(),
            cases: default_cases(),
        }
    }
}

impl Config {
    /// Base URL with any trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the inter-case delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Overlay values from an arbitrary lookup. Unset and empty values keep
    /// the current setting.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get(BACKEND_URL_ENV) {
            debug!(base_url = %url, "base URL from environment");
            self.base_url = url;
        }
        if let Some(username) = get(USERNAME_ENV) {
            self.username = username;
        }
        if let Some(password) = get(PASSWORD_ENV) {
            self.password = password;
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let url = self.base_url();
        let has_scheme = ["http://", "https://"]
            .iter()
            .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme));
        if !has_scheme {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        if self.cases.is_empty() {
            return Err(ConfigError::NoCases);
        }

        for (i, case) in self.cases.iter().enumerate() {
            if case.name.trim().is_empty() {
                return Err(ConfigError::UnnamedCase(i));
            }
            if case.filename.trim().is_empty() {
                return Err(ConfigError::MissingFilename(case.name.clone()));
            }
        }

        Ok(())
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a ConfigManager for an explicit file.
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            debug!(path = ?self.config_path, "no config file, using defaults");
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;

        Ok(config)
    }

    /// Loads the file layer, then overlays the process environment.
    pub fn load_layered(&self) -> Result<Config> {
        self.load_layered_with(|key| std::env::var(key).ok())
    }

    /// Loads the file layer, then overlays values from `lookup`.
    pub fn load_layered_with<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load()?;
        config.apply_env_with(lookup);
        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.as_os_str().is_empty() {
                fs::create_dir_all(config_dir).with_context(|| {
                    format!("Failed to create config directory at {:?}", config_dir)
                })?;
            }
        }

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
