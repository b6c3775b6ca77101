use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PortError {
    #[error("Port Exhaustion Error: {message} {location}")]
    Exhausted {
        message: String,
        location: ErrorLocation,
    },
}

impl PortError {
    #[track_caller]
    pub fn exhausted(message: impl Into<String>) -> Self {
        PortError::Exhausted {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
