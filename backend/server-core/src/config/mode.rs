use crate::error::ConfigError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Development vs. production, decided once at startup.
///
/// Development defers to an externally owned dev server and never binds a
/// local listener; production runs the embedded server behind the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Mode implied by the build profile.
    pub const fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    pub fn is_development(self) -> bool {
        self == Mode::Development
    }

    pub fn is_production(self) -> bool {
        self == Mode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    #[track_caller]
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(ConfigError::Validation {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Unknown mode '{other}' (expected development or production)"),
            }),
        }
    }
}
