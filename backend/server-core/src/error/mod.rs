pub mod auth;
pub mod config;
pub mod lifecycle;
pub mod port;
pub mod probe;
pub mod secret;

pub use auth::AuthRejection;
pub use config::ConfigError;
pub use lifecycle::LifecycleError;
pub use port::PortError;
pub use probe::ProbeError;
pub use secret::SecretError;

use thiserror::Error;

/// Every failure that aborts host startup.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}
