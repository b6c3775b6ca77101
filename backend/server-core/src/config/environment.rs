//! The immutable configuration the embedded server runs with.
//!
//! This replaces ambient process environment variables (app data path, mode,
//! auth flag, shared secret). A [`ServerEnvironment`] is built once, moved into
//! the [`ServerLifecycle`](crate::lifecycle::ServerLifecycle) and shared behind
//! an `Arc`, so every value is fixed before a listener can exist.

use crate::config::Mode;
use crate::credential::CredentialHeader;
use crate::error::ConfigError;

use common::{ErrorLocation, RedactedSecret};

use std::panic::Location;
use std::path::{Path, PathBuf};

const DATABASE_FILE_NAME: &str = "app.db";

#[derive(Debug, Clone)]
pub struct ServerEnvironment {
    app_data_dir: PathBuf,
    mode: Mode,
    auth_required: bool,
    secret: Option<RedactedSecret>,
}

impl ServerEnvironment {
    pub fn builder() -> ServerEnvironmentBuilder {
        ServerEnvironmentBuilder::default()
    }

    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }

    /// Location of the application database inside the app data directory.
    pub fn database_path(&self) -> PathBuf {
        self.app_data_dir.join(DATABASE_FILE_NAME)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    pub fn secret(&self) -> Option<&RedactedSecret> {
        self.secret.as_ref()
    }

    /// Credential the renderer must attach, if a secret is configured.
    pub fn credential(&self) -> Option<CredentialHeader> {
        self.secret
            .as_ref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| CredentialHeader::new(secret.clone()))
    }
}

/// Builder for a validated [`ServerEnvironment`].
#[derive(Debug, Default)]
pub struct ServerEnvironmentBuilder {
    app_data_dir: Option<PathBuf>,
    mode: Option<Mode>,
    auth_required: Option<bool>,
    secret: Option<RedactedSecret>,
}

impl ServerEnvironmentBuilder {
    pub fn with_app_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.app_data_dir = Some(dir.into());
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_auth_required(mut self, required: bool) -> Self {
        self.auth_required = Some(required);
        self
    }

    pub fn with_secret(mut self, secret: RedactedSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Build the environment with validation.
    ///
    /// `auth_required` defaults to `true`. The secret is optional here; a
    /// missing secret with auth required surfaces per request as
    /// `SecretNotConfigured`.
    #[track_caller]
    pub fn build(self) -> Result<ServerEnvironment, ConfigError> {
        let app_data_dir = self.app_data_dir.ok_or_else(|| ConfigError::Validation {
            location: ErrorLocation::from(Location::caller()),
            reason: String::from("App data directory is required"),
        })?;

        if app_data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("App data directory cannot be empty"),
            });
        }

        let mode = self.mode.ok_or_else(|| ConfigError::Validation {
            location: ErrorLocation::from(Location::caller()),
            reason: String::from("Mode is required"),
        })?;

        Ok(ServerEnvironment {
            app_data_dir,
            mode,
            auth_required: self.auth_required.unwrap_or(true),
            secret: self.secret,
        })
    }
}
