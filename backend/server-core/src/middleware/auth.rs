//! Shared-secret authentication for requests reaching the embedded server.

use crate::AUTH_HEADER;
use crate::config::ServerEnvironment;
use crate::error::AuthRejection;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{debug, error, warn};
use subtle::ConstantTimeEq;

/// Decide whether a request may proceed.
///
/// A missing header is treated as an empty credential, so it fails the same
/// comparison as a wrong one.
///
/// # Errors
///
/// - [`AuthRejection::SecretNotConfigured`] when auth is required but no
///   secret was configured.
/// - [`AuthRejection::InvalidCredential`] when the header is absent or does
///   not match the secret exactly.
pub fn authenticate(
    headers: &HeaderMap,
    environment: &ServerEnvironment,
) -> Result<(), AuthRejection> {
    if !environment.auth_required() {
        warn!("Auth gate disabled: serving request without credential check");
        return Ok(());
    }

    let expected = match environment.secret() {
        Some(secret) if !secret.is_empty() => secret,
        _ => {
            error!("Auth required but no shared secret is configured");
            return Err(AuthRejection::SecretNotConfigured);
        }
    };

    let provided = headers
        .get(AUTH_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if credentials_match(provided, expected.expose().as_bytes()) {
        Ok(())
    } else {
        debug!(
            "Rejecting request: credential {} ({} bytes)",
            if provided.is_empty() { "missing" } else { "mismatched" },
            provided.len()
        );
        Err(AuthRejection::InvalidCredential)
    }
}

/// Compare a provided credential against the expected secret.
///
/// Lengths are compared first; equal-length inputs are compared in constant
/// time so timing does not reveal how many leading bytes matched.
pub fn credentials_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided.ct_eq(expected).into()
}

/// axum middleware enforcing [`authenticate`] before any handler runs.
pub async fn auth_gate(
    State(environment): State<Arc<ServerEnvironment>>,
    request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &environment) {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}
