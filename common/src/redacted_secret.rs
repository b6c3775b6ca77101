//! Shared-secret handling with redacted Debug/Display output.

use crate::{ErrorLocation, ExposureError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// A secret string that never exposes its value in logs or debug output.
///
/// The backing buffer is zeroized when the value is dropped, so every clone
/// wipes its own copy at the end of its lifetime.
#[derive(Clone)]
pub struct RedactedSecret {
    inner: String,
}

impl RedactedSecret {
    /// Wrap a secret value.
    pub fn new(secret: String) -> Self {
        Self { inner: secret }
    }

    /// Get the actual secret value.
    ///
    /// # Security Note
    /// Only call this when comparing credentials or attaching them to a request.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Get the secret length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the secret is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedSecret([REDACTED])")
    }
}

impl fmt::Display for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for RedactedSecret {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Never leaves the process through serde
impl serde::Serialize for RedactedSecret {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(ExposureError::Refused {
            message: String::from("RedactedSecret cannot be serialized - use expose() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
