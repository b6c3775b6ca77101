//! Main window creation with the navigation guard attached.

use crate::error::HearthError;
use crate::permissions;
use crate::proxy::proxy_origin;

use server_core::LOCALHOST_BASE_URL;
use server_core::config::Mode;
use server_core::navigation::{NavigationDecision, NavigationGuard};

use log::info;
use tauri::webview::NewWindowResponse;
use tauri::{AppHandle, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use url::Url;

pub const MAIN_WINDOW_LABEL: &str = "main";
const MAIN_WINDOW_TITLE: &str = "Hearth";
const MAIN_WINDOW_SIZE: (f64, f64) = (1280.0, 800.0);

/// URL the main window loads.
///
/// Development points at the dev server through `localhost`. Production
/// loads the proxy origin, which forwards to the embedded server with the
/// credential attached.
pub fn main_window_url(mode: Mode, port: u16) -> Result<Url, HearthError> {
    if mode.is_production() {
        return proxy_origin();
    }

    Url::parse(&format!("{LOCALHOST_BASE_URL}:{port}/"))
        .map_err(|e| HearthError::hearth(format!("Invalid window URL for port {port}: {e}")))
}

/// Tauri's answer for a guarded window-open request.
pub fn new_window_response<R: Runtime>(decision: NavigationDecision) -> NewWindowResponse<R> {
    match decision {
        NavigationDecision::Allow => NewWindowResponse::Allow,
        NavigationDecision::Block => NewWindowResponse::Deny,
    }
}

/// Create the main window pointed at the server on `port`.
///
/// Navigation and window-open requests outside the allowlist are blocked,
/// and permission prompts go through the same guard.
pub fn create_main_window<R: Runtime>(
    app: &AppHandle<R>,
    mode: Mode,
    port: u16,
) -> Result<WebviewWindow<R>, HearthError> {
    let url = main_window_url(mode, port)?;
    let guard = NavigationGuard::new();

    info!("Opening main window at {url}");

    let window = WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::External(url))
        .title(MAIN_WINDOW_TITLE)
        .inner_size(MAIN_WINDOW_SIZE.0, MAIN_WINDOW_SIZE.1)
        .on_navigation(move |target| guard.on_navigate(target).is_allowed())
        .on_new_window(move |target, _features| new_window_response(guard.on_new_window(&target)))
        .build()
        .map_err(|e| HearthError::hearth(format!("Failed to create main window: {e}")))?;

    permissions::install(&window, guard)?;

    #[cfg(debug_assertions)]
    if mode.is_development() {
        window.open_devtools();
    }

    Ok(window)
}
