use crate::helpers::{TEST_SECRET, app_router, free_port, production_lifecycle, settings_with_preferred};

use server_core::lifecycle::wait_until_ready;
use server_core::credential::CredentialHeader;
use server_core::error::ProbeError;
use server_core::{AUTH_HEADER, HEALTH_ROUTE};

use common::RedactedSecret;

use std::time::{Duration, Instant};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credential() -> CredentialHeader {
    CredentialHeader::new(RedactedSecret::new(String::from(TEST_SECRET)))
}

/// **VALUE**: Verifies the probe sends the credential and accepts a 200.
///
/// **WHY THIS MATTERS**: The host only shows the window after this succeeds.
///
/// **BUG THIS CATCHES**: Would catch the probe hitting the wrong path or omitting the header.
#[tokio::test]
async fn given_healthy_server_when_probed_then_ready() {
    // GIVEN: A server answering 200 only with the credential
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_ROUTE))
        .and(header(AUTH_HEADER, TEST_SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN
    let result = wait_until_ready(
        server.address().port(),
        Some(&credential()),
        Duration::from_secs(5),
    )
    .await;

    // THEN
    assert!(result.is_ok(), "Probe should succeed: {result:?}");
}

/// **VALUE**: Verifies transient 5xx answers are retried.
///
/// **WHY THIS MATTERS**: The first requests can race the listener warming up.
///
/// **BUG THIS CATCHES**: Would catch 5xx being treated as a permanent failure.
#[tokio::test]
async fn given_server_returning_503_then_200_when_probed_then_ready_after_retry() {
    // GIVEN: Two 503s followed by 200
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_ROUTE))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(HEALTH_ROUTE))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(2)
        .mount(&server)
        .await;

    // WHEN
    let result = wait_until_ready(
        server.address().port(),
        Some(&credential()),
        Duration::from_secs(10),
    )
    .await;

    // THEN
    assert!(result.is_ok(), "Probe should succeed after retries: {result:?}");
}

/// **VALUE**: Verifies a 401 fails the probe immediately.
///
/// **WHY THIS MATTERS**: A wrong credential never fixes itself; retrying only delays
/// the fail-closed exit.
///
/// **BUG THIS CATCHES**: Would catch 4xx being retried until timeout.
#[tokio::test]
async fn given_server_rejecting_credential_when_probed_then_rejected_without_waiting() {
    // GIVEN: A server that always answers 401
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_ROUTE))
        .respond_with(ResponseTemplate::new(401).set_body_string("InvalidCredential"))
        .mount(&server)
        .await;

    // WHEN
    let begun = Instant::now();
    let result = wait_until_ready(
        server.address().port(),
        Some(&credential()),
        Duration::from_secs(30),
    )
    .await;

    // THEN
    match result {
        Err(ProbeError::Rejected { status_code, .. }) => assert_eq!(status_code.0, 401),
        other => panic!("Expected Rejected, got {other:?}"),
    }
    assert!(begun.elapsed() < Duration::from_secs(5));
}

/// **VALUE**: Verifies an absent server times out.
///
/// **BUG THIS CATCHES**: Would catch the probe looping forever.
#[tokio::test]
async fn given_nothing_listening_when_probed_then_times_out() {
    // GIVEN: A port with no server
    let port = free_port();

    // WHEN
    let result = wait_until_ready(port, Some(&credential()), Duration::from_millis(500)).await;

    // THEN
    assert!(matches!(result, Err(ProbeError::Timeout { .. })));
}

/// **VALUE**: Verifies the probe against the real composed server.
///
/// **WHY THIS MATTERS**: Ties the health route, the auth gate and the probe together.
///
/// **BUG THIS CATCHES**: Would catch the probe and the gate disagreeing on the header.
#[tokio::test]
async fn given_started_lifecycle_when_probed_with_its_credential_then_ready() {
    // GIVEN: A running production server
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));
    let port = lifecycle.start(app_router()).await.expect("start");
    let credential = lifecycle.credential().expect("credential");

    // WHEN
    let ready = wait_until_ready(port, Some(&credential), Duration::from_secs(5)).await;
    let unauthenticated = wait_until_ready(port, None, Duration::from_secs(5)).await;

    // THEN
    assert!(ready.is_ok(), "Probe should succeed: {ready:?}");
    assert!(matches!(unauthenticated, Err(ProbeError::Rejected { .. })));

    lifecycle.stop().await.expect("stop");
}
