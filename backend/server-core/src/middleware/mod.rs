//! Request middleware wrapped around every embedded-server route.

pub mod auth;
pub mod csp;

pub use auth::{auth_gate, authenticate, credentials_match};
pub use csp::{ContentPolicy, CspNonce, content_policy};
