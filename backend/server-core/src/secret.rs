//! Per-run shared secret.
//!
//! The secret is generated exactly once by the composition root and handed to
//! both the auth gate (through [`ServerEnvironment`](crate::config::ServerEnvironment))
//! and the renderer's credential-attachment path. Regenerating it mid-run would
//! make the two disagree, so nothing in this crate calls [`generate_secret`]
//! on its own.

use crate::error::SecretError;

use common::RedactedSecret;

use log::debug;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// Number of random bytes behind each secret (hex-encoded to twice as many chars).
pub const SECRET_BYTES: usize = 32;

/// Generate a fresh secret from the operating system CSPRNG.
///
/// # Errors
///
/// Returns [`SecretError::Generation`] if the entropy source is unavailable.
/// Callers treat this as fatal to startup.
#[track_caller]
pub fn generate_secret() -> Result<RedactedSecret, SecretError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SecretError::generation(e))?;

    let secret = RedactedSecret::new(hex::encode(bytes));
    bytes.zeroize();

    debug!("Generated shared secret ({} chars)", secret.len());
    Ok(secret)
}
