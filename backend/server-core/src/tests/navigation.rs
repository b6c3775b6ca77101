use crate::navigation::{
    ALLOWED_HOSTS, NavigationDecision, NavigationGuard, PermissionDecision, PermissionKind,
    is_allowed_origin, is_proxy_origin,
};

use url::Url;

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("valid url")
}

/// **VALUE**: Verifies loopback navigation is allowed on any port.
///
/// **WHY THIS MATTERS**: The production port can be OS-assigned, so the allowlist
/// cannot be port-specific.
///
/// **BUG THIS CATCHES**: Would catch the guard blocking the app's own origin.
#[test]
fn given_loopback_urls_when_on_navigate_then_allowed() {
    // GIVEN: The guard
    let guard = NavigationGuard::new();

    // WHEN/THEN: Both allowed hosts pass
    assert_eq!(guard.on_navigate(&url("http://localhost:3000/")), NavigationDecision::Allow);
    assert_eq!(
        guard.on_navigate(&url("http://127.0.0.1:49152/settings")),
        NavigationDecision::Allow
    );
    assert_eq!(ALLOWED_HOSTS, ["localhost", "127.0.0.1"]);
}

/// **VALUE**: Verifies external and lookalike origins are blocked.
///
/// **WHY THIS MATTERS**: A page that navigates away keeps the webview's privileges
/// while running someone else's content.
///
/// **BUG THIS CATCHES**: Would catch substring matching (`localhost.evil.com`) or
/// userinfo tricks (`http://localhost@evil.com`).
#[test]
fn given_external_urls_when_on_navigate_then_blocked() {
    // GIVEN: The guard
    let guard = NavigationGuard::new();

    // WHEN/THEN: Every external origin is blocked
    for raw in [
        "https://example.com/",
        "http://localhost.evil.com/",
        "http://localhost@evil.com/",
        "http://127.0.0.2/",
        "http://0.0.0.0:3000/",
        "file:///etc/passwd",
    ] {
        assert_eq!(
            guard.on_navigate(&url(raw)),
            NavigationDecision::Block,
            "{raw} should be blocked"
        );
    }
}

/// **VALUE**: Verifies window-open requests pass the loopback allowlist and nothing else.
///
/// **WHY THIS MATTERS**: The UI may open a second window onto its own server, but a
/// window onto an external site would escape the main window's navigation hook.
///
/// **BUG THIS CATCHES**: Would catch window-open blocking the app's own origin, or
/// allowing external hosts.
#[test]
fn given_loopback_and_external_urls_when_on_new_window_then_only_loopback_allowed() {
    // GIVEN: The guard
    let guard = NavigationGuard::new();

    // WHEN/THEN: Loopback and the proxy origin are allowed
    for raw in [
        "http://127.0.0.1:3000/",
        "http://localhost:5173/docs",
        "hearth://localhost/settings",
        "http://hearth.localhost/",
    ] {
        assert_eq!(
            guard.on_new_window(&url(raw)),
            NavigationDecision::Allow,
            "{raw} should be allowed"
        );
    }

    // THEN: External hosts are blocked
    for raw in ["https://example.com", "http://hearth.localhost.evil.com/", "hearth://evil.com/"] {
        assert_eq!(
            guard.on_new_window(&url(raw)),
            NavigationDecision::Block,
            "{raw} should be blocked"
        );
    }
}

/// **VALUE**: Verifies the proxy origin is recognised in both platform spellings.
///
/// **WHY THIS MATTERS**: The production window loads through the host's proxy scheme.
/// Blocking it would leave the window blank.
///
/// **BUG THIS CATCHES**: Would catch the proxy check matching on scheme alone.
#[test]
fn given_proxy_urls_when_is_proxy_origin_then_only_exact_host_matches() {
    assert!(is_proxy_origin(&url("hearth://localhost/index.html")));
    assert!(is_proxy_origin(&url("https://hearth.localhost/")));
    assert!(!is_proxy_origin(&url("hearth://127.0.0.2/")));
    assert!(!is_proxy_origin(&url("http://localhost/")));
    assert!(NavigationGuard::new().on_navigate(&url("hearth://localhost/")).is_allowed());
}

/// **VALUE**: Verifies every permission request is denied.
///
/// **WHY THIS MATTERS**: The app needs no device access; granting any widens the blast
/// radius of a compromised page.
///
/// **BUG THIS CATCHES**: Would catch an allow-list creeping into the permission path.
#[test]
fn given_permission_requests_when_on_permission_request_then_denied() {
    // GIVEN: The guard
    let guard = NavigationGuard::new();

    // WHEN/THEN
    for kind in [
        PermissionKind::Camera,
        PermissionKind::Microphone,
        PermissionKind::Geolocation,
        PermissionKind::Notifications,
        PermissionKind::ClipboardRead,
        PermissionKind::Midi,
        PermissionKind::Other(String::from("usb")),
    ] {
        assert_eq!(guard.on_permission_request(kind), PermissionDecision::Deny);
    }
}

/// **VALUE**: Verifies URLs without a host are not treated as allowed.
///
/// **BUG THIS CATCHES**: Would catch `host_str() == None` matching by accident.
#[test]
fn given_hostless_url_when_is_allowed_origin_then_false() {
    assert!(!is_allowed_origin(&url("data:text/html,hi")));
    assert!(!is_allowed_origin(&url("about:blank")));
}
