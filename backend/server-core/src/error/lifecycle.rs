use crate::error::port::PortError;

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LifecycleError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Server Start Error: {message} {location}")]
    StartFailure {
        message: String,
        location: ErrorLocation,
    },

    #[error("Lifecycle Actor Error: {message} {location}")]
    Actor {
        message: String,
        location: ErrorLocation,
    },
}

impl LifecycleError {
    #[track_caller]
    pub fn start_failure(message: impl Into<String>) -> Self {
        LifecycleError::StartFailure {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn actor(message: impl Into<String>) -> Self {
        LifecycleError::Actor {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for LifecycleError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        LifecycleError::StartFailure {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
