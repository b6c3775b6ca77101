use common::ErrorLocation;

use std::error::Error as StdError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SecretError {
    #[error("Secret Generation Error: {message} {location}")]
    Generation {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl SecretError {
    #[track_caller]
    pub fn generation(error: impl StdError + Send + Sync + 'static) -> Self {
        SecretError::Generation {
            message: format!("Entropy source unavailable: {error}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(error),
        }
    }
}
