use crate::frontend::{FrontendListener, NONCE_PLACEHOLDER};

use server_core::config::{Mode, ServerEnvironment};
use server_core::lifecycle::{RequestListener, compose};

use common::RedactedSecret;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::CONTENT_SECURITY_POLICY;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "5ec2e7";

fn environment() -> ServerEnvironment {
    ServerEnvironment::builder()
        .with_app_data_dir("/tmp/hearth")
        .with_mode(Mode::Production)
        .with_secret(RedactedSecret::new(String::from(SECRET)))
        .build()
        .expect("environment")
}

fn web_root() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("index.html"),
        format!(
            "<html><head><script nonce=\"{NONCE_PLACEHOLDER}\">boot()</script></head></html>"
        ),
    )
    .expect("write index");
    std::fs::create_dir_all(dir.path().join("assets")).expect("assets dir");
    std::fs::write(dir.path().join("assets/app.js"), "console.log('hearth');").expect("write js");
    dir
}

fn composed(root: &TempDir) -> Router {
    let environment = environment();
    let app = Box::new(FrontendListener::new(root.path()))
        .activate(&environment)
        .expect("activation should succeed");
    compose(app, Arc::new(environment))
}

async fn get(router: Router, path: &str) -> (StatusCode, Option<String>, String) {
    let response = router
        .oneshot(
            Request::builder()
                .uri(path)
                .header("x-hearth-auth", SECRET)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("infallible");
    let status = response.status();
    let csp = response
        .headers()
        .get(CONTENT_SECURITY_POLICY)
        .map(|value| value.to_str().expect("ascii").to_string());
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, csp, String::from_utf8(body.to_vec()).expect("utf8"))
}

fn nonce_from_csp(csp: &str) -> &str {
    let start = csp.find("'nonce-").expect("nonce directive") + "'nonce-".len();
    let end = start + csp[start..].find('\'').expect("closing quote");
    &csp[start..end]
}

/// **VALUE**: Verifies activation fails when the UI was not packaged.
///
/// **WHY THIS MATTERS**: A server with nothing to serve shows a blank window; the host
/// must fail closed instead.
///
/// **BUG THIS CATCHES**: Would catch the missing directory being discovered only per request.
#[test]
fn given_missing_frontend_dir_when_activated_then_error() {
    // GIVEN: A path that does not exist
    let dir = TempDir::new().expect("temp dir");
    let listener = Box::new(FrontendListener::new(dir.path().join("missing")));

    // WHEN
    let result = listener.activate(&environment());

    // THEN
    let message = result.err().expect("activation should fail").to_string();
    assert!(message.contains("does not exist"));
}

/// **VALUE**: Verifies activation fails without `index.html`.
///
/// **BUG THIS CATCHES**: Would catch a lazily read index turning into per-request 500s.
#[test]
fn given_frontend_dir_without_index_when_activated_then_error() {
    // GIVEN: An empty directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN/THEN
    assert!(
        Box::new(FrontendListener::new(dir.path()))
            .activate(&environment())
            .is_err()
    );
}

/// **VALUE**: Verifies the index page carries the same nonce as the CSP header.
///
/// **WHY THIS MATTERS**: The boot script only runs if its nonce matches the header.
///
/// **BUG THIS CATCHES**: Would catch the placeholder left in place or a second nonce.
#[tokio::test]
async fn given_index_request_when_served_then_placeholder_replaced_with_header_nonce() {
    // GIVEN: A packaged UI
    let root = web_root();

    // WHEN
    let (status, csp, body) = get(composed(&root), "/").await;

    // THEN
    assert_eq!(status, StatusCode::OK);
    let csp = csp.expect("CSP header");
    let nonce = nonce_from_csp(&csp);
    assert!(!body.contains(NONCE_PLACEHOLDER));
    assert!(body.contains(&format!("nonce=\"{nonce}\"")));
}

/// **VALUE**: Verifies static assets are served as files.
///
/// **BUG THIS CATCHES**: Would catch every path falling back to the index page.
#[tokio::test]
async fn given_asset_request_when_served_then_returns_file() {
    // GIVEN: A packaged UI
    let root = web_root();

    // WHEN
    let (status, _, body) = get(composed(&root), "/assets/app.js").await;

    // THEN
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "console.log('hearth');");
}

/// **VALUE**: Verifies unknown paths fall back to the index page.
///
/// **WHY THIS MATTERS**: Client-side routes (`/settings`) are reloaded directly.
///
/// **BUG THIS CATCHES**: Would catch a 404 on client-side routes.
#[tokio::test]
async fn given_client_route_when_served_then_returns_index() {
    // GIVEN: A packaged UI
    let root = web_root();

    // WHEN
    let (status, csp, body) = get(composed(&root), "/settings/profile").await;

    // THEN
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("boot()"));
    assert!(body.contains(nonce_from_csp(&csp.expect("CSP header"))));
}
