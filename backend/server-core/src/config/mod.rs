pub mod environment;
pub mod mode;

pub use environment::{ServerEnvironment, ServerEnvironmentBuilder};
pub use mode::Mode;

use crate::error::config::ConfigError;
use crate::{DEFAULT_PORT, DEV_SERVER_PORT};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 120_000;

pub const ENV_MODE: &str = "HEARTH_MODE";
pub const ENV_PORT: &str = "HEARTH_PORT";
pub const ENV_AUTH_REQUIRED: &str = "HEARTH_AUTH_REQUIRED";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_preferred_port")]
    pub preferred_port: u16,
    #[serde(default = "default_dev_server_port")]
    pub dev_server_port: u16,
    /// Fixed port with no fallback. `None` means negotiate from `preferred_port`.
    #[serde(default)]
    pub pinned_port: Option<u16>,
    #[serde(default = "default_auth_required")]
    pub auth_required: bool,
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            preferred_port: default_preferred_port(),
            dev_server_port: default_dev_server_port(),
            pinned_port: None,
            auth_required: default_auth_required(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl ServerSettings {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerSettings::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_preferred_port() -> u16 {
    DEFAULT_PORT
}
fn default_dev_server_port() -> u16 {
    DEV_SERVER_PORT
}
fn default_auth_required() -> bool {
    true
}
fn default_shutdown_timeout_ms() -> u64 {
    5_000
}
fn default_probe_timeout_ms() -> u64 {
    10_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ShellConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {e}");
            ConfigError::Read {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ShellConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {e}");
            ConfigError::Parse {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Load config, writing the defaults out on first run so they can be edited.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid or the defaults
    /// cannot be written.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        if config_dir.join(CONFIG_FILE_NAME).exists() {
            return Self::load(config_dir);
        }

        let config = Self::default();
        config.save(config_dir)?;
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::Validation {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                    self.version
                ),
            });
        }

        let server = &self.server;

        if server.preferred_port == 0 {
            return Err(ConfigError::Validation {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("preferred_port cannot be 0"),
            });
        }

        if server.dev_server_port == 0 {
            return Err(ConfigError::Validation {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("dev_server_port cannot be 0"),
            });
        }

        if server.pinned_port == Some(0) {
            return Err(ConfigError::Validation {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("pinned_port cannot be 0"),
            });
        }

        for (name, value) in [
            ("shutdown_timeout_ms", server.shutdown_timeout_ms),
            ("probe_timeout_ms", server.probe_timeout_ms),
        ] {
            if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
                return Err(ConfigError::Validation {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!(
                        "Invalid {name}: {value} (must be {MIN_TIMEOUT_MS}-{MAX_TIMEOUT_MS})"
                    ),
                });
            }
        }

        Ok(())
    }

    /// Whether requests must carry the credential.
    ///
    /// Disabling auth is only honoured in development. A production host that
    /// was asked to run unauthenticated stays authenticated.
    pub fn effective_auth_required(&self, mode: Mode) -> bool {
        if self.server.auth_required {
            return true;
        }

        if mode.is_production() {
            error!("auth_required=false ignored in production mode; the auth gate stays enabled");
            return true;
        }

        false
    }

    /// Apply environment overrides on top of the persisted values.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) {
        if let Some(port) = overrides.pinned_port {
            info!("{ENV_PORT} pins the server port to {port}");
            self.server.pinned_port = Some(port);
        }

        if let Some(required) = overrides.auth_required {
            info!("{ENV_AUTH_REQUIRED} sets auth_required={required}");
            self.server.auth_required = required;
        }
    }
}

// ============================================
// ENVIRONMENT OVERRIDES
// ============================================

/// Values read from `HEARTH_*` process variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub mode: Option<Mode>,
    pub pinned_port: Option<u16>,
    pub auth_required: Option<bool>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    ///
    /// Development builds also load a `.env` file first. Packaged builds never
    /// read one.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        if Mode::from_build().is_development() {
            match dotenvy::dotenv() {
                Ok(path) => info!("Loaded environment file {}", path.display()),
                Err(e) if e.not_found() => {}
                Err(e) => warn!("Ignoring unreadable environment file: {e}"),
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`. Unset or blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mode = read(ENV_MODE)
            .map(|value| value.parse::<Mode>())
            .transpose()?;

        let pinned_port = match read(ENV_PORT) {
            Some(value) => Some(parse_port(&value)?),
            None => None,
        };

        let auth_required = match read(ENV_AUTH_REQUIRED) {
            Some(value) => Some(parse_flag(ENV_AUTH_REQUIRED, &value)?),
            None => None,
        };

        Ok(Self {
            mode,
            pinned_port,
            auth_required,
        })
    }

    /// The mode a `build` binary runs in.
    ///
    /// `HEARTH_MODE` can move a development build to production for local
    /// testing. A production build always runs as production.
    pub fn mode_for(&self, build: Mode) -> Mode {
        match (build, self.mode) {
            (Mode::Development, Some(mode)) => mode,
            (Mode::Production, Some(Mode::Development)) => {
                error!("{ENV_MODE}=development ignored in a production build");
                Mode::Production
            }
            _ => build,
        }
    }
}

#[track_caller]
fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::Override {
            location: ErrorLocation::from(Location::caller()),
            key: ENV_PORT.to_string(),
            reason: format!("'{value}' is not a port in 1-65535"),
        }),
    }
}

#[track_caller]
fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Override {
            location: ErrorLocation::from(Location::caller()),
            key: key.to_string(),
            reason: format!("'{value}' is not a boolean"),
        }),
    }
}
