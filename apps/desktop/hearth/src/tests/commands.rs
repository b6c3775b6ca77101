use crate::commands::server::credential_response;
use crate::error::HearthError;
use crate::frontend::FrontendListener;
use crate::proxy::LoopbackProxy;
use crate::state::AppState;

use server_core::AUTH_HEADER;
use server_core::config::{Mode, ServerEnvironment};
use server_core::lifecycle::{LifecycleSettings, ServerLifecycle};

use common::RedactedSecret;

use std::net::{Ipv4Addr, TcpListener};
use std::time::Duration;

use axum::Router;

fn free_port() -> u16 {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("ephemeral port")
}

fn state(mode: Mode, port: u16) -> AppState {
    let environment = ServerEnvironment::builder()
        .with_app_data_dir("/tmp/hearth")
        .with_mode(mode)
        .with_secret(RedactedSecret::new(String::from("c0ffee")))
        .build()
        .expect("environment");
    let settings = LifecycleSettings {
        preferred_port: port,
        dev_server_port: port,
        ..LifecycleSettings::default()
    };
    AppState::new(
        ServerLifecycle::new(environment, settings),
        FrontendListener::new("/nonexistent"),
        LoopbackProxy::new().expect("proxy"),
        Duration::from_secs(1),
    )
}

/// **VALUE**: Verifies the credential is withheld until the server runs.
///
/// **WHY THIS MATTERS**: A renderer that gets a port before the server is up races it.
///
/// **BUG THIS CATCHES**: Would catch a response with port 0.
#[tokio::test]
async fn given_stopped_server_when_credential_requested_then_not_running() {
    // GIVEN
    let state = state(Mode::Production, free_port());

    // WHEN
    let result = credential_response(&state).await;

    // THEN
    assert!(matches!(result, Err(HearthError::NotRunning { .. })));
}

/// **VALUE**: Verifies the credential response once running.
///
/// **WHY THIS MATTERS**: This is the renderer's only way to learn the header and secret.
///
/// **BUG THIS CATCHES**: Would catch a header name other than the one the gate reads.
#[tokio::test]
async fn given_running_server_when_credential_requested_then_returns_header_secret_and_port() {
    // GIVEN: A production server running on a loopback port
    let state = state(Mode::Production, free_port());
    let port = state.lifecycle().start(Router::new()).await.expect("start");

    // WHEN
    let response = credential_response(&state).await.expect("credential");

    // THEN
    assert_eq!(response.header, AUTH_HEADER);
    assert_eq!(response.secret, "c0ffee");
    assert_eq!(response.port, port);

    state.lifecycle().stop().await.expect("stop");
}

/// **VALUE**: Verifies development never hands out the secret.
///
/// **WHY THIS MATTERS**: A development window renders whatever answers on the dev port,
/// which may be any local process. That page must not be able to read the secret.
///
/// **BUG THIS CATCHES**: Would catch the command returning the secret to a dev-server page.
#[tokio::test]
async fn given_running_development_server_when_credential_requested_then_refused() {
    // GIVEN: A development server "running" on 4100
    let state = state(Mode::Development, 4100);
    state.lifecycle().start(Router::new()).await.expect("start");

    // WHEN
    let result = credential_response(&state).await;

    // THEN
    match result {
        Err(HearthError::Hearth { message, .. }) => assert!(message.contains("development")),
        other => panic!("Expected Hearth error, got {other:?}"),
    }
}
