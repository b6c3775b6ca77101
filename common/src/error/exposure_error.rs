use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a secret is about to leave the process through a generic path.
#[derive(Debug, ThisError)]
pub enum ExposureError {
    #[error("Secret exposure refused: {message} {location}")]
    Refused {
        message: String,
        location: ErrorLocation,
    },
}
