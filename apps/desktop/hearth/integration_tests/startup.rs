use hearth::error::HearthError;
use hearth::frontend::{FrontendListener, NONCE_PLACEHOLDER};
use hearth::host::launch;
use hearth::proxy::{LoopbackProxy, proxy_origin};

use server_core::AUTH_HEADER;
use server_core::config::{Mode, ServerEnvironment};
use server_core::lifecycle::{LifecycleSettings, ServerLifecycle, ServerPhase};

use common::RedactedSecret;

use std::net::{Ipv4Addr, TcpListener};
use std::time::Duration;

use tauri::http::Request;
use tempfile::TempDir;

const SECRET: &str = "9b8a7c6d5e4f3a2b1c0d9e8f7a6b5c4d";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn free_port() -> u16 {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("ephemeral port")
}

fn lifecycle(mode: Mode) -> ServerLifecycle {
    let environment = ServerEnvironment::builder()
        .with_app_data_dir(std::env::temp_dir().join("hearth-startup"))
        .with_mode(mode)
        .with_secret(RedactedSecret::new(String::from(SECRET)))
        .build()
        .expect("environment");
    ServerLifecycle::new(
        environment,
        LifecycleSettings {
            preferred_port: free_port(),
            dev_server_port: free_port(),
            ..LifecycleSettings::default()
        },
    )
}

fn packaged_ui() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("index.html"),
        format!("<script nonce=\"{NONCE_PLACEHOLDER}\"></script>"),
    )
    .expect("write index");
    dir
}

/// **VALUE**: Verifies the production startup path end to end: start, probe, serve.
///
/// **WHY THIS MATTERS**: This is exactly what the setup hook runs before showing a window.
///
/// **BUG THIS CATCHES**: Would catch the probe and the gate disagreeing, or the UI not
/// reaching the renderer with its nonce.
#[tokio::test]
async fn given_packaged_ui_when_launched_in_production_then_ready_and_serving() {
    // GIVEN: A packaged UI and a production lifecycle
    let ui = packaged_ui();
    let lifecycle = lifecycle(Mode::Production);

    // WHEN: Launching
    let port = launch(&lifecycle, FrontendListener::new(ui.path()), PROBE_TIMEOUT)
        .await
        .expect("launch should succeed");

    // THEN: The page is served with the credential, refused without it
    let client = reqwest::Client::builder().no_proxy().build().expect("client");
    let ok = client
        .get(format!("http://127.0.0.1:{port}/"))
        .header(AUTH_HEADER, SECRET)
        .send()
        .await
        .expect("request");
    assert_eq!(ok.status().as_u16(), 200);
    let csp = ok
        .headers()
        .get("content-security-policy")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("CSP header");
    let body = ok.text().await.expect("body");
    assert!(!body.contains(NONCE_PLACEHOLDER));
    assert!(csp.contains("'nonce-"));

    let refused = client
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .expect("request");
    assert_eq!(refused.status().as_u16(), 401);

    lifecycle.stop().await.expect("stop");
}

/// **VALUE**: Verifies startup fails closed when the UI is missing.
///
/// **WHY THIS MATTERS**: The host must exit rather than open a window onto nothing.
///
/// **BUG THIS CATCHES**: Would catch a missing UI being reported as a successful start.
#[tokio::test]
async fn given_missing_ui_when_launched_then_error_and_stopped() {
    // GIVEN: No packaged UI
    let dir = TempDir::new().expect("temp dir");
    let lifecycle = lifecycle(Mode::Production);

    // WHEN
    let result = launch(
        &lifecycle,
        FrontendListener::new(dir.path().join("missing")),
        PROBE_TIMEOUT,
    )
    .await;

    // THEN
    match result {
        Err(HearthError::Core { message, .. }) => assert!(message.contains("does not exist")),
        other => panic!("Expected Core error, got {other:?}"),
    }
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);
}

/// **VALUE**: Verifies development launch skips binding and probing.
///
/// **WHY THIS MATTERS**: The dev server may still be compiling; probing it would delay or
/// fail startup for no reason.
///
/// **BUG THIS CATCHES**: Would catch the probe running against a remote dev server.
#[tokio::test]
async fn given_development_mode_when_launched_then_returns_dev_port_immediately() {
    // GIVEN: A development lifecycle and no UI at all
    let lifecycle = lifecycle(Mode::Development);
    let dev_port = lifecycle.settings().dev_server_port;

    // WHEN
    let port = launch(&lifecycle, FrontendListener::new("/nonexistent"), PROBE_TIMEOUT)
        .await
        .expect("development launch should succeed");

    // THEN
    assert_eq!(port, dev_port);
    assert_eq!(
        lifecycle.phase().await,
        ServerPhase::Running {
            port: dev_port,
            local: false
        }
    );
}

/// **VALUE**: Verifies the page load the production webview actually makes: a request on
/// the proxy origin with no credential of its own.
///
/// **WHY THIS MATTERS**: The webview cannot set headers on navigations. Only the proxy
/// adds the credential, so this is the path that decides whether the window shows the
/// UI or a 401.
///
/// **BUG THIS CATCHES**: Would catch the proxy dropping the credential, forwarding to the
/// wrong port, or losing the CSP header on the way back.
#[tokio::test]
async fn given_running_production_server_when_webview_loads_proxy_origin_then_page_served() {
    // GIVEN: A launched production server and the host's proxy
    let ui = packaged_ui();
    let lifecycle = lifecycle(Mode::Production);
    let port = launch(&lifecycle, FrontendListener::new(ui.path()), PROBE_TIMEOUT)
        .await
        .expect("launch should succeed");
    let proxy = LoopbackProxy::new().expect("proxy");
    let credential = lifecycle.credential();
    let origin = proxy_origin().expect("origin");

    // WHEN: The webview requests its start page
    let page = Request::builder()
        .uri(origin.as_str())
        .header("accept", "text/html")
        .body(Vec::new())
        .expect("request");
    let response = proxy.forward(port, credential.as_ref(), page).await;

    // THEN: The page arrives rendered with its nonce and policy
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().contains_key("content-security-policy"));
    let body = String::from_utf8(response.body().clone()).expect("utf-8 body");
    assert!(body.contains("nonce=\""));
    assert!(!body.contains(NONCE_PLACEHOLDER));

    lifecycle.stop().await.expect("stop");
}

/// **VALUE**: Verifies the proxy owns the credential: a page cannot substitute its own,
/// and without the host's the gate still refuses.
///
/// **WHY THIS MATTERS**: Script in the page controls its request headers. The only
/// credential that may reach the server is the one the host holds.
///
/// **BUG THIS CATCHES**: Would catch the proxy passing a page-supplied header through, or
/// forwarding unauthenticated requests the gate then accepts.
#[tokio::test]
async fn given_page_supplied_credential_when_forwarded_then_host_credential_decides() {
    // GIVEN
    let ui = packaged_ui();
    let lifecycle = lifecycle(Mode::Production);
    let port = launch(&lifecycle, FrontendListener::new(ui.path()), PROBE_TIMEOUT)
        .await
        .expect("launch should succeed");
    let proxy = LoopbackProxy::new().expect("proxy");
    let credential = lifecycle.credential();
    let forged = || {
        Request::builder()
            .uri("hearth://localhost/")
            .header(AUTH_HEADER, "not-the-secret")
            .body(Vec::new())
            .expect("request")
    };

    // WHEN
    let with_host_credential = proxy.forward(port, credential.as_ref(), forged()).await;
    let without_host_credential = proxy.forward(port, None, forged()).await;

    // THEN
    assert_eq!(with_host_credential.status().as_u16(), 200);
    assert_eq!(without_host_credential.status().as_u16(), 401);

    lifecycle.stop().await.expect("stop");
}
