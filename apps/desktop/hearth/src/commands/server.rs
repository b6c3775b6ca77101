use crate::error::HearthError;
use crate::state::AppState;

use server_core::lifecycle::ServerPhase;

use log::{debug, info, warn};
use serde::Serialize;
use tauri::{State, command as TauriCommand};

/// What the renderer needs to attach the credential to its requests.
#[derive(Debug, Clone, Serialize)]
pub struct AuthCredentialResponse {
    pub header: String,
    pub secret: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerStatusResponse {
    #[serde(flatten)]
    pub phase: ServerPhase,
}

/// Build the credential response for the current server.
///
/// Development windows load a page the host does not serve, so the secret
/// is only handed out in production.
///
/// # Errors
///
/// - [`HearthError::Hearth`] in development, or if no secret is configured
/// - [`HearthError::NotRunning`] if the server has no port
pub async fn credential_response(state: &AppState) -> Result<AuthCredentialResponse, HearthError> {
    if state.mode().is_development() {
        warn!("Credential request refused in development");
        return Err(HearthError::hearth("Credential is not issued in development"));
    }

    let port = state
        .lifecycle()
        .port()
        .await
        .ok_or_else(|| HearthError::not_running("Embedded server is not running"))?;

    let credential = state
        .credential()
        .ok_or_else(|| HearthError::hearth("No shared secret configured"))?;

    Ok(AuthCredentialResponse {
        header: credential.name().to_string(),
        secret: credential.secret().expose().to_string(),
        port,
    })
}

/// Hand the renderer the header name, secret and port.
#[TauriCommand]
pub async fn get_auth_credential(
    state: State<'_, AppState>,
) -> Result<AuthCredentialResponse, HearthError> {
    info!("Renderer requested auth credential");
    credential_response(&state).await
}

/// Report the embedded server's phase.
#[TauriCommand]
pub async fn get_server_status(
    state: State<'_, AppState>,
) -> Result<ServerStatusResponse, HearthError> {
    let phase = state.phase().await;
    debug!("Server status requested: {phase}");
    Ok(ServerStatusResponse { phase })
}
