use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProbeError {
    #[error("Probe Client Error: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },

    #[error("Probe Rejected: HTTP {status_code} - {message} {location}")]
    Rejected {
        status_code: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Probe Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },
}

impl ProbeError {
    #[track_caller]
    pub fn client(message: impl Into<String>) -> Self {
        ProbeError::Client {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn rejected(status_code: HttpStatusCode, message: impl Into<String>) -> Self {
        ProbeError::Rejected {
            status_code,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        ProbeError::Timeout {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
