//! The request-header credential the renderer attaches to every request.

use crate::AUTH_HEADER;

use common::RedactedSecret;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use log::error;

/// Header name + shared secret, ready to be attached to outgoing requests.
#[derive(Debug, Clone)]
pub struct CredentialHeader {
    secret: RedactedSecret,
}

impl CredentialHeader {
    pub fn new(secret: RedactedSecret) -> Self {
        Self { secret }
    }

    pub fn name(&self) -> &'static str {
        AUTH_HEADER
    }

    pub fn secret(&self) -> &RedactedSecret {
        &self.secret
    }

    /// Build the header value, marked sensitive so it is hidden from HTTP debug output.
    pub fn header_value(&self) -> Option<HeaderValue> {
        match HeaderValue::from_str(self.secret.expose()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some(value)
            }
            Err(e) => {
                error!("Shared secret is not a valid header value: {e}");
                None
            }
        }
    }

    /// Attach the credential to `headers`, replacing any previous value.
    ///
    /// Returns `false` if the secret cannot be represented as a header value.
    pub fn apply(&self, headers: &mut HeaderMap) -> bool {
        match self.header_value() {
            Some(value) => {
                headers.insert(HeaderName::from_static(AUTH_HEADER), value);
                true
            }
            None => false,
        }
    }
}
