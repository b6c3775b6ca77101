//! Shared building blocks for the Hearth workspace.
//!
//! This crate holds the small pieces every other crate leans on:
//!
//! - [`ErrorLocation`]: source position attached to every error variant
//! - [`RedactedSecret`]: the per-run shared secret, never printed, zeroized on drop
//! - [`HttpStatusCode`]: status categorisation used by probes and rejections
//!
//! ## Architecture
//!
//! - **common** (this crate): leaf types with no business logic
//! - **server-core**: embedded server lifecycle and trust boundary
//! - **hearth**: Tauri host wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::exposure_error::ExposureError;
pub use http_status::{HttpStatusCode, Readiness};
pub use redacted_secret::RedactedSecret;
