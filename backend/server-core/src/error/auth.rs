use common::HttpStatusCode;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error as ThisError;

/// Per-request rejection produced by the auth gate.
///
/// Bodies are fixed strings: no credential or secret material is echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum AuthRejection {
    /// Missing or mismatching credential header.
    #[error("InvalidCredential")]
    InvalidCredential,

    /// Auth is required but no secret was configured at startup.
    #[error("SecretNotConfigured")]
    SecretNotConfigured,
}

impl AuthRejection {
    pub fn status_code(&self) -> HttpStatusCode {
        match self {
            AuthRejection::InvalidCredential => HttpStatusCode::UNAUTHORIZED,
            AuthRejection::SecretNotConfigured => HttpStatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            AuthRejection::InvalidCredential => "InvalidCredential",
            AuthRejection::SecretNotConfigured => "SecretNotConfigured",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = match self {
            AuthRejection::InvalidCredential => StatusCode::UNAUTHORIZED,
            AuthRejection::SecretNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.body()).into_response()
    }
}
