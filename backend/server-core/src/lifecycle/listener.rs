use crate::config::ServerEnvironment;

use std::error::Error as StdError;

use axum::Router;

pub type ListenerError = Box<dyn StdError + Send + Sync>;

/// The application-level request handler the embedded server delegates to.
///
/// A listener is activated exactly once, after the environment is fixed and
/// immediately before the socket is bound. Returning an error aborts the start.
pub trait RequestListener: Send + 'static {
    fn activate(self: Box<Self>, environment: &ServerEnvironment) -> Result<Router, ListenerError>;
}

impl RequestListener for Router {
    fn activate(self: Box<Self>, _environment: &ServerEnvironment) -> Result<Router, ListenerError> {
        Ok(*self)
    }
}
