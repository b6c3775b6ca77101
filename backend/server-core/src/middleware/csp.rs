//! Content isolation policy attached to every response.
//!
//! Each request gets a fresh nonce. The nonce is placed in the request
//! extensions so handlers can stamp it onto inline scripts, and the same value
//! is written into the `Content-Security-Policy` header of the response.

use crate::config::Mode;

use std::fmt::{Display, Formatter, Result as FormatResult};

use axum::extract::{Request, State};
use axum::http::header::{CONTENT_SECURITY_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use log::error;
use uuid::Uuid;

/// Per-request script nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspNonce(String);

impl CspNonce {
    /// Base64 of a freshly generated v4 UUID.
    pub fn generate() -> Self {
        CspNonce(BASE64_STANDARD.encode(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CspNonce {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}

/// Directive table for one run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentPolicy {
    mode: Mode,
}

impl ContentPolicy {
    pub fn for_mode(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Ordered `(directive, sources)` pairs for `nonce`.
    pub fn directives(&self, nonce: &CspNonce) -> Vec<(&'static str, String)> {
        // Bundler workers are loaded from blob: URLs in development only.
        let worker_src = if self.mode.is_development() {
            "'self' blob:"
        } else {
            "'self'"
        };

        vec![
            ("default-src", String::from("'self'")),
            ("script-src", format!("'self' 'nonce-{nonce}'")),
            ("style-src", String::from("'self' 'unsafe-inline'")),
            ("worker-src", String::from(worker_src)),
            ("img-src", String::from("'self' data: blob:")),
            ("font-src", String::from("'self'")),
            ("connect-src", String::from("'self'")),
            ("frame-ancestors", String::from("'self'")),
            ("base-uri", String::from("'self'")),
            ("form-action", String::from("'self'")),
        ]
    }

    /// The serialized `Content-Security-Policy` header value.
    pub fn header_value(&self, nonce: &CspNonce) -> String {
        self.directives(nonce)
            .into_iter()
            .map(|(name, sources)| format!("{name} {sources}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// axum middleware: generate the nonce, run the inner service, then attach
/// the policy and hardening headers to whatever response comes back.
pub async fn content_policy(
    State(policy): State<ContentPolicy>,
    mut request: Request,
    next: Next,
) -> Response {
    let nonce = CspNonce::generate();
    let header = policy.header_value(&nonce);
    request.extensions_mut().insert(nonce);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    match HeaderValue::from_str(&header) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => error!("Content-Security-Policy header could not be encoded: {e}"),
    }
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    response
}
