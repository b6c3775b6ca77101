//! Loopback port negotiation.

use crate::config::Mode;
use crate::error::PortError;

use std::io::Result as IoResult;
use std::net::Ipv4Addr;

use log::{debug, info, warn};
use tokio::net::TcpListener;

/// Port `0` asks the OS for any free ephemeral port.
const EPHEMERAL_PORT: u16 = 0;

/// Decide which port the embedded server binds to.
///
/// Development mode returns `dev_server_port` without touching the network:
/// an external dev server already owns it. Production mode probes `preferred`
/// on the loopback interface and falls back to an OS-assigned port.
///
/// The probe socket is closed before returning, so the port is only reserved
/// in the sense that it was free a moment ago. The lifecycle manager reports a
/// lost race as a start failure.
///
/// # Errors
///
/// Returns [`PortError::Exhausted`] if neither `preferred` nor an ephemeral
/// port can be bound.
pub async fn resolve_port(
    preferred: u16,
    mode: Mode,
    dev_server_port: u16,
) -> Result<u16, PortError> {
    if mode.is_development() {
        debug!("Development mode: deferring to dev server on port {dev_server_port}");
        return Ok(dev_server_port);
    }

    match probe_loopback(preferred).await {
        Ok(port) => {
            debug!("Preferred port {port} is free");
            Ok(port)
        }
        Err(preferred_err) => {
            warn!("Preferred port {preferred} unavailable ({preferred_err}), asking OS for a free port");
            let port = probe_loopback(EPHEMERAL_PORT).await.map_err(|e| {
                PortError::exhausted(format!(
                    "Preferred port {preferred} unavailable ({preferred_err}) and no ephemeral port available: {e}"
                ))
            })?;
            info!("Falling back to ephemeral port {port}");
            Ok(port)
        }
    }
}

/// Check a port pinned through configuration. No fallback is attempted.
///
/// # Errors
///
/// Returns [`PortError::Exhausted`] if the pinned port cannot be bound.
pub async fn resolve_pinned_port(pinned: u16) -> Result<u16, PortError> {
    probe_loopback(pinned)
        .await
        .map_err(|e| PortError::exhausted(format!("Pinned port {pinned} unavailable: {e}")))
}

async fn probe_loopback(port: u16) -> IoResult<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
    let bound = listener.local_addr()?.port();
    drop(listener);
    Ok(bound)
}
