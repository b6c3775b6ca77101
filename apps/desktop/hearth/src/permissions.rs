//! Routes webview permission prompts through the navigation guard.
//!
//! Tauri has no cross-platform permission callback, so each engine is hooked
//! directly: WebView2's `PermissionRequested` event on Windows and WebKitGTK's
//! `permission-request` signal on Linux.

use crate::error::HearthError;

use server_core::navigation::{NavigationGuard, PermissionDecision, PermissionKind};

use tauri::{Runtime, WebviewWindow};

/// Whether the guard lets a page have `kind`.
pub fn grants(guard: &NavigationGuard, kind: PermissionKind) -> bool {
    guard.on_permission_request(kind) == PermissionDecision::Allow
}

/// Attach the guard to the window's permission prompts.
///
/// # Errors
///
/// Returns [`HearthError::Hearth`] if the native webview cannot be reached.
pub fn install<R: Runtime>(
    window: &WebviewWindow<R>,
    guard: NavigationGuard,
) -> Result<(), HearthError> {
    window
        .with_webview(move |webview| platform::install(webview, guard))
        .map_err(|e| HearthError::hearth(format!("Failed to reach webview: {e}")))
}

#[cfg(windows)]
mod platform {
    use super::grants;

    use server_core::navigation::{NavigationGuard, PermissionKind};

    use log::{debug, error};
    use tauri::webview::PlatformWebview;
    use webview2_com::Microsoft::Web::WebView2::Win32::{
        COREWEBVIEW2_PERMISSION_KIND, COREWEBVIEW2_PERMISSION_KIND_CAMERA,
        COREWEBVIEW2_PERMISSION_KIND_CLIPBOARD_READ, COREWEBVIEW2_PERMISSION_KIND_GEOLOCATION,
        COREWEBVIEW2_PERMISSION_KIND_MICROPHONE,
        COREWEBVIEW2_PERMISSION_KIND_MIDI_SYSTEM_EXCLUSIVE_MESSAGES,
        COREWEBVIEW2_PERMISSION_KIND_NOTIFICATIONS, COREWEBVIEW2_PERMISSION_STATE_ALLOW,
        COREWEBVIEW2_PERMISSION_STATE_DENY,
    };
    use webview2_com::PermissionRequestedEventHandler;

    fn kind_of(kind: COREWEBVIEW2_PERMISSION_KIND) -> PermissionKind {
        match kind {
            COREWEBVIEW2_PERMISSION_KIND_CAMERA => PermissionKind::Camera,
            COREWEBVIEW2_PERMISSION_KIND_MICROPHONE => PermissionKind::Microphone,
            COREWEBVIEW2_PERMISSION_KIND_GEOLOCATION => PermissionKind::Geolocation,
            COREWEBVIEW2_PERMISSION_KIND_NOTIFICATIONS => PermissionKind::Notifications,
            COREWEBVIEW2_PERMISSION_KIND_CLIPBOARD_READ => PermissionKind::ClipboardRead,
            COREWEBVIEW2_PERMISSION_KIND_MIDI_SYSTEM_EXCLUSIVE_MESSAGES => PermissionKind::Midi,
            other => PermissionKind::Other(format!("webview2-kind-{}", other.0)),
        }
    }

    pub(super) fn install(webview: PlatformWebview, guard: NavigationGuard) {
        let handler = PermissionRequestedEventHandler::create(Box::new(move |_sender, args| {
            let Some(args) = args else {
                return Ok(());
            };

            let mut raw = COREWEBVIEW2_PERMISSION_KIND::default();
            unsafe { args.PermissionKind(&mut raw)? };

            let state = if grants(&guard, kind_of(raw)) {
                COREWEBVIEW2_PERMISSION_STATE_ALLOW
            } else {
                COREWEBVIEW2_PERMISSION_STATE_DENY
            };
            unsafe { args.SetState(state) }
        }));

        let mut token = 0;
        let result = unsafe {
            webview
                .controller()
                .CoreWebView2()
                .and_then(|core| core.add_PermissionRequested(&handler, &mut token))
        };

        match result {
            Ok(()) => debug!("WebView2 permission handler installed"),
            Err(e) => error!("Failed to install WebView2 permission handler: {e}"),
        }
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::grants;

    use server_core::navigation::{NavigationGuard, PermissionKind};

    use log::debug;
    use tauri::webview::PlatformWebview;
    use webkit2gtk::{PermissionRequestExt, WebViewExt};

    const WEBKIT_PERMISSION: &str = "webkitgtk";

    pub(super) fn install(webview: PlatformWebview, guard: NavigationGuard) {
        webview
            .inner()
            .connect_permission_request(move |_webview, request| {
                if grants(&guard, PermissionKind::Other(WEBKIT_PERMISSION.to_string())) {
                    request.allow();
                } else {
                    request.deny();
                }
                true
            });
        debug!("WebKitGTK permission handler installed");
    }
}

// WKWebView and the mobile webviews answer permission prompts on delegates
// wry owns, so there is nothing to attach to. Pages on those platforms get
// the engine's own prompt.
#[cfg(not(any(windows, target_os = "linux")))]
mod platform {
    use server_core::navigation::NavigationGuard;

    use log::debug;
    use tauri::webview::PlatformWebview;

    pub(super) fn install(_webview: PlatformWebview, _guard: NavigationGuard) {
        debug!("No permission hook on this platform");
    }
}
