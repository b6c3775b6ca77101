//! Host-side allowlist for what the renderer may navigate to or open.
//!
//! The renderer only ever talks to the loopback server. Anything that would
//! take it elsewhere (navigation, new windows, device permissions) is refused
//! here and logged, never raised as an error. The host's custom-scheme proxy
//! forwards only to the loopback server, so its origin is admitted too.

use crate::{LOCALHOST_HOSTNAME, LOOPBACK_HOSTNAME, PROXY_HOST, PROXY_SCHEME};

use std::fmt::{Display, Formatter, Result as FormatResult};

use log::{debug, warn};
use url::Url;

/// Hosts the renderer may load.
pub const ALLOWED_HOSTS: [&str; 2] = [LOCALHOST_HOSTNAME, LOOPBACK_HOSTNAME];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Block,
}

impl NavigationDecision {
    pub fn is_allowed(self) -> bool {
        self == NavigationDecision::Allow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Allow,
    Deny,
}

/// Capabilities a page can ask the webview for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionKind {
    Camera,
    Microphone,
    Geolocation,
    Notifications,
    ClipboardRead,
    Midi,
    Other(String),
}

impl Display for PermissionKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            PermissionKind::Camera => formatter.write_str("camera"),
            PermissionKind::Microphone => formatter.write_str("microphone"),
            PermissionKind::Geolocation => formatter.write_str("geolocation"),
            PermissionKind::Notifications => formatter.write_str("notifications"),
            PermissionKind::ClipboardRead => formatter.write_str("clipboard-read"),
            PermissionKind::Midi => formatter.write_str("midi"),
            PermissionKind::Other(name) => formatter.write_str(name),
        }
    }
}

/// Whether `url` points at one of the [`ALLOWED_HOSTS`].
///
/// Only the host is checked: any scheme or port on an allowed host passes.
pub fn is_allowed_origin(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| ALLOWED_HOSTS.contains(&host))
}

/// Whether `url` is the host's proxy in front of the loopback server.
///
/// Webviews that cannot serve custom schemes natively expose them as
/// `http(s)://<scheme>.localhost`.
pub fn is_proxy_origin(url: &Url) -> bool {
    match url.scheme() {
        PROXY_SCHEME => url.host_str() == Some(LOCALHOST_HOSTNAME),
        "http" | "https" => url.host_str() == Some(PROXY_HOST),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationGuard;

impl NavigationGuard {
    pub fn new() -> Self {
        Self
    }

    fn admits(&self, url: &Url) -> bool {
        is_allowed_origin(url) || is_proxy_origin(url)
    }

    /// Top-level navigation: allowed only to [`ALLOWED_HOSTS`] and the proxy.
    pub fn on_navigate(&self, url: &Url) -> NavigationDecision {
        if self.admits(url) {
            debug!("Navigation allowed: {url}");
            NavigationDecision::Allow
        } else {
            warn!("Blocked navigation to {url}");
            NavigationDecision::Block
        }
    }

    /// Window-open requests pass the same allowlist; anything else is refused.
    pub fn on_new_window(&self, url: &Url) -> NavigationDecision {
        if self.admits(url) {
            debug!("Window open allowed: {url}");
            NavigationDecision::Allow
        } else {
            warn!("Blocked window open for {url}");
            NavigationDecision::Block
        }
    }

    /// Device and capability permissions are never granted.
    pub fn on_permission_request(&self, kind: PermissionKind) -> PermissionDecision {
        warn!("Denied permission request: {kind}");
        PermissionDecision::Deny
    }
}
