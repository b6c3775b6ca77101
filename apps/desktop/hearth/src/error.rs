use server_core::error::{ConfigError, CoreError, LifecycleError, ProbeError, SecretError};

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the host: startup wiring and Tauri commands.
///
/// Serialized with a type tag so command failures reach the renderer with
/// their structure intact.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum HearthError {
    /// Error from the host itself (paths, windows, logger)
    #[error("Hearth Error: {message} {location}")]
    Hearth {
        message: String,
        location: ErrorLocation,
    },

    /// Error from server-core (secret, port, lifecycle, config, probe)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// The embedded server is not running
    #[error("Not Running Error: {message} {location}")]
    NotRunning {
        message: String,
        location: ErrorLocation,
    },
}

impl HearthError {
    #[track_caller]
    pub fn hearth(message: impl Into<String>) -> Self {
        HearthError::Hearth {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_running(message: impl Into<String>) -> Self {
        HearthError::NotRunning {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for HearthError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        HearthError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SecretError> for HearthError {
    #[track_caller]
    fn from(error: SecretError) -> Self {
        HearthError::from(CoreError::from(error))
    }
}

impl From<ConfigError> for HearthError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HearthError::from(CoreError::from(error))
    }
}

impl From<LifecycleError> for HearthError {
    #[track_caller]
    fn from(error: LifecycleError) -> Self {
        HearthError::from(CoreError::from(error))
    }
}

impl From<ProbeError> for HearthError {
    #[track_caller]
    fn from(error: ProbeError) -> Self {
        HearthError::from(CoreError::from(error))
    }
}
