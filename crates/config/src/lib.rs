#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pinstall
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pinstall/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use pinstall_errors::{ConfigError, Error};
use pinstall_types::ColorChoice;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub install: InstallSettings,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub quiet: bool,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Install behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstallSettings {
    /// Skip `packages-dev`
    #[serde(default)]
    pub no_dev: bool,
    /// Maximum concurrent package tasks, 0 = one task per package
    #[serde(default)]
    pub concurrency: usize,
    /// Publish the packages that succeeded when others fail
    #[serde(default)]
    pub keep_going: bool,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub timeout: u64, // seconds, 0 = no deadline
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 0,
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions for serde
fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("pinstall/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("pinstall").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from the default location, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => {
                tracing::debug!(path = %config_path.display(), "loading config");
                Self::load_from_file(&config_path).await
            }
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path or the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(quiet) = std::env::var("PINSTALL_QUIET") {
            self.general.quiet = parse_bool("PINSTALL_QUIET", quiet)?;
        }

        if let Ok(no_dev) = std::env::var("PINSTALL_NO_DEV") {
            self.install.no_dev = parse_bool("PINSTALL_NO_DEV", no_dev)?;
        }

        if let Ok(color) = std::env::var("PINSTALL_COLOR") {
            self.general.color =
                ColorChoice::from_name(&color).ok_or_else(|| ConfigError::InvalidValue {
                    field: "PINSTALL_COLOR".to_string(),
                    value: color.clone(),
                })?;
        }

        if let Ok(jobs) = std::env::var("PINSTALL_CONCURRENCY") {
            self.install.concurrency = jobs.parse().map_err(|_| ConfigError::InvalidValue {
                field: "PINSTALL_CONCURRENCY".to_string(),
                value: jobs,
            })?;
        }

        if let Ok(timeout) = std::env::var("PINSTALL_TIMEOUT") {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: "PINSTALL_TIMEOUT".to_string(),
                value: timeout,
            })?;
        }

        Ok(())
    }

    /// Concurrency cap, `None` when unbounded
    #[must_use]
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.install.concurrency > 0).then_some(self.install.concurrency)
    }

    /// Per-archive fetch deadline, `None` when disabled
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.network.timeout > 0).then(|| Duration::from_secs(self.network.timeout))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.network.connect_timeout)
    }
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}
