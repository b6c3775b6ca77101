use crate::proxy::proxy_origin;
use crate::window::{main_window_url, new_window_response};

use server_core::config::Mode;
use server_core::navigation::{NavigationDecision, NavigationGuard};

use tauri::webview::NewWindowResponse;
use url::Url;

/// **VALUE**: Verifies the window URL per mode.
///
/// **WHY THIS MATTERS**: Development must hit the dev server via `localhost`. Production
/// must load through the proxy, since a direct loopback load carries no credential and
/// the gate answers 401.
///
/// **BUG THIS CATCHES**: Would catch production pointing the webview straight at
/// `127.0.0.1`, which shows a blank window.
#[test]
fn given_mode_and_port_when_main_window_url_then_uses_mode_origin() {
    // GIVEN/WHEN
    let dev = main_window_url(Mode::Development, 3000).expect("dev url");
    let prod = main_window_url(Mode::Production, 49152).expect("prod url");

    // THEN
    assert_eq!(dev.as_str(), "http://localhost:3000/");
    assert_eq!(prod, proxy_origin().expect("proxy origin"));
    assert_ne!(prod.host_str(), Some("127.0.0.1"));
}

/// **VALUE**: Verifies the window's own URL passes the navigation guard.
///
/// **WHY THIS MATTERS**: A guard that blocks the initial load shows a blank window.
///
/// **BUG THIS CATCHES**: Would catch the allowlist and the window URL drifting apart.
#[test]
fn given_main_window_urls_when_checked_by_guard_then_allowed() {
    // GIVEN: The guard
    let guard = NavigationGuard::new();

    // WHEN/THEN
    for mode in [Mode::Development, Mode::Production] {
        let url = main_window_url(mode, 3000).expect("url");
        assert_eq!(guard.on_navigate(&url), NavigationDecision::Allow);
    }
}

/// **VALUE**: Verifies the guard's window-open decision reaches Tauri unchanged.
///
/// **WHY THIS MATTERS**: The UI opens secondary windows on its own origin; those must
/// open while external links stay refused.
///
/// **BUG THIS CATCHES**: Would catch the callback ignoring the guard and denying
/// (or allowing) everything.
#[test]
fn given_guard_decisions_when_mapped_to_new_window_response_then_allow_only_loopback() {
    // GIVEN
    let guard = NavigationGuard::new();
    let local = Url::parse("http://127.0.0.1:3000/settings").expect("url");
    let external = Url::parse("https://example.com/").expect("url");

    // WHEN
    let local_response = new_window_response::<tauri::Wry>(guard.on_new_window(&local));
    let external_response = new_window_response::<tauri::Wry>(guard.on_new_window(&external));

    // THEN
    assert!(matches!(local_response, NewWindowResponse::Allow));
    assert!(matches!(external_response, NewWindowResponse::Deny));
}
