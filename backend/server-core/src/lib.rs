//! Embedded server lifecycle and local trust boundary.
//!
//! Everything between the Tauri host and the web application it renders lives
//! here:
//!
//! - [`secret`]: the per-run shared secret
//! - [`port`]: loopback port negotiation across development/production
//! - [`lifecycle`]: the single embedded server, started and stopped through a serialized actor
//! - [`middleware`]: the auth gate and the content isolation policy wrapped around every request
//! - [`navigation`]: host-side allowlist for renderer navigation, windows and permissions
//! - [`config`]: persisted settings, environment overrides and the immutable server environment

pub mod config;
pub mod credential;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod navigation;
pub mod port;
pub mod secret;

#[cfg(test)]
mod tests;

pub const LOOPBACK_HOSTNAME: &str = "127.0.0.1";
pub const LOCALHOST_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEV_SERVER_PORT: u16 = 3000;
pub const AUTH_HEADER: &str = "x-hearth-auth";
pub const HEALTH_ROUTE: &str = "/healthz";
/// Custom URI scheme the host uses to proxy webview requests to the loopback server.
pub const PROXY_SCHEME: &str = "hearth";
pub const PROXY_HOST: &str = const_format::concatcp!(PROXY_SCHEME, ".", LOCALHOST_HOSTNAME);
pub const LOOPBACK_BASE_URL: &str = const_format::concatcp!("http://", LOOPBACK_HOSTNAME);
pub const LOCALHOST_BASE_URL: &str = const_format::concatcp!("http://", LOCALHOST_HOSTNAME);
