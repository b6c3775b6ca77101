use crate::helpers::{
    TEST_SECRET, app_router, get_with_credential, production_lifecycle, free_port,
    settings_with_preferred,
};

use server_core::lifecycle::ServerLifecycle;
use server_core::config::{Mode, ServerEnvironment};

/// **VALUE**: Verifies the gate over a real socket: 200 with the secret, 401 otherwise.
///
/// **WHY THIS MATTERS**: In-process router tests skip the network stack; this proves the
/// bound server enforces the same rules.
///
/// **BUG THIS CATCHES**: Would catch the lifecycle serving the raw app router instead of
/// the composed one.
#[tokio::test]
async fn given_running_server_when_requests_sent_then_only_credentialed_succeed() {
    // GIVEN: A running production server
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));
    let port = lifecycle.start(app_router()).await.expect("start");

    // WHEN: Sending with, without and with a wrong credential
    let ok = get_with_credential(port, Some(TEST_SECRET)).await;
    let missing = get_with_credential(port, None).await;
    let wrong = get_with_credential(port, Some("not-the-secret")).await;

    // THEN
    assert_eq!(ok.status().as_u16(), 200);
    assert_eq!(ok.text().await.expect("body"), "hello from hearth");
    assert_eq!(missing.status().as_u16(), 401);
    assert_eq!(missing.text().await.expect("body"), "InvalidCredential");
    assert_eq!(wrong.status().as_u16(), 401);

    lifecycle.stop().await.expect("stop");
}

/// **VALUE**: Verifies a server started without a secret answers 500, never 200.
///
/// **WHY THIS MATTERS**: Misconfiguration must fail closed and be distinguishable from a
/// bad credential.
///
/// **BUG THIS CATCHES**: Would catch an unconfigured secret letting requests through.
#[tokio::test]
async fn given_server_without_secret_when_request_sent_then_secret_not_configured() {
    // GIVEN: A production server with no secret
    let environment = ServerEnvironment::builder()
        .with_app_data_dir(std::env::temp_dir())
        .with_mode(Mode::Production)
        .build()
        .expect("environment");
    let lifecycle = ServerLifecycle::new(environment, settings_with_preferred(free_port()));
    let port = lifecycle.start(app_router()).await.expect("start");

    // WHEN
    let response = get_with_credential(port, Some("")).await;

    // THEN
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.text().await.expect("body"), "SecretNotConfigured");

    lifecycle.stop().await.expect("stop");
}
