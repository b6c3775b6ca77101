use crate::helpers::{
    CountingListener, FailingListener, TEST_SECRET, app_router, environment, free_port,
    get_with_credential, occupy_port, port_is_free, production_lifecycle, settings_with_preferred,
};

use server_core::DEFAULT_PORT;
use server_core::config::Mode;
use server_core::error::{LifecycleError, PortError};
use server_core::lifecycle::{LifecycleSettings, ServerLifecycle, ServerPhase, StopOutcome};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::get;
use serial_test::serial;
use tokio::sync::Notify;

/// **VALUE**: Verifies the full production path on the default port.
///
/// **WHY THIS MATTERS**: This is what a packaged app does on every launch: negotiate
/// 3000, bind loopback, serve, and release the port on stop.
///
/// **BUG THIS CATCHES**: Would catch a bind to `0.0.0.0`, a leaked listener after stop,
/// or a phase left at `Stopping`.
#[tokio::test]
#[serial]
async fn given_free_default_port_when_started_in_production_then_serves_on_3000_until_stopped() {
    // GIVEN: Port 3000 is free
    if !port_is_free(DEFAULT_PORT) {
        eprintln!("Skipping: port {DEFAULT_PORT} is in use on this machine");
        return;
    }
    let lifecycle = production_lifecycle(LifecycleSettings::default());

    // WHEN: Starting
    let port = lifecycle.start(app_router()).await.expect("start should succeed");

    // THEN: Serving on 3000 behind the gate
    assert_eq!(port, DEFAULT_PORT);
    assert_eq!(
        lifecycle.phase().await,
        ServerPhase::Running { port, local: true }
    );
    let response = get_with_credential(port, Some(TEST_SECRET)).await;
    assert_eq!(response.status().as_u16(), 200);

    // AND WHEN: Stopping
    let outcome = lifecycle.stop().await.expect("stop should succeed");

    // THEN: Stopped and the port is released
    assert_eq!(outcome, StopOutcome::Stopped);
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);
    assert!(port_is_free(DEFAULT_PORT), "Port should be released after stop");
}

/// **VALUE**: Verifies fallback when 3000 is already taken.
///
/// **WHY THIS MATTERS**: Developers often have something else on 3000.
///
/// **BUG THIS CATCHES**: Would catch a start failure instead of fallback.
#[tokio::test]
#[serial]
async fn given_occupied_default_port_when_started_in_production_then_uses_other_port() {
    // GIVEN: Port 3000 is held (by us, or already by someone else)
    let _guard = std::net::TcpListener::bind(("127.0.0.1", DEFAULT_PORT)).ok();
    let lifecycle = production_lifecycle(LifecycleSettings::default());

    // WHEN: Starting
    let port = lifecycle.start(app_router()).await.expect("start should succeed");

    // THEN: Another port, reachable
    assert_ne!(port, DEFAULT_PORT);
    let response = get_with_credential(port, Some(TEST_SECRET)).await;
    assert_eq!(response.status().as_u16(), 200);

    lifecycle.stop().await.expect("stop should succeed");
}

/// **VALUE**: Verifies development mode defers to the dev server and binds nothing.
///
/// **WHY THIS MATTERS**: Binding the dev port would collide with the dev server itself.
///
/// **BUG THIS CATCHES**: Would catch development starting a local listener.
#[tokio::test]
async fn given_development_mode_when_started_then_running_remote_without_binding() {
    // GIVEN: A development lifecycle with a free dev port
    let dev_port = free_port();
    let settings = LifecycleSettings {
        dev_server_port: dev_port,
        ..LifecycleSettings::default()
    };
    let activations = Arc::new(AtomicUsize::new(0));
    let lifecycle = ServerLifecycle::new(environment(Mode::Development), settings);

    // WHEN: Starting
    let port = lifecycle
        .start(CountingListener {
            activations: Arc::clone(&activations),
        })
        .await
        .expect("start should succeed");

    // THEN: Dev port, not local, nothing bound, listener unused
    assert_eq!(port, dev_port);
    assert_eq!(
        lifecycle.phase().await,
        ServerPhase::Running {
            port: dev_port,
            local: false
        }
    );
    assert!(port_is_free(dev_port));
    assert_eq!(activations.load(Ordering::SeqCst), 0);

    // AND: Stop returns to Stopped
    assert_eq!(lifecycle.stop().await.expect("stop"), StopOutcome::Stopped);
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);
}

/// **VALUE**: Verifies stop is idempotent.
///
/// **WHY THIS MATTERS**: Window-close and quit signals both call stop, often back to back.
///
/// **BUG THIS CATCHES**: Would catch a second stop erroring or hanging.
#[tokio::test]
async fn given_running_server_when_stopped_twice_then_second_stop_is_noop() {
    // GIVEN: A running server
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));
    lifecycle.start(app_router()).await.expect("start should succeed");

    // WHEN: Stopping twice
    let first = lifecycle.stop().await.expect("first stop");
    let second = lifecycle.stop().await.expect("second stop");

    // THEN
    assert_eq!(first, StopOutcome::Stopped);
    assert_eq!(second, StopOutcome::AlreadyStopped);
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);
}

/// **VALUE**: Verifies stop before any start is a no-op.
///
/// **BUG THIS CATCHES**: Would catch stop assuming a handle exists.
#[tokio::test]
async fn given_never_started_when_stopped_then_already_stopped() {
    // GIVEN/WHEN
    let lifecycle = production_lifecycle(LifecycleSettings::default());
    let outcome = lifecycle.stop().await.expect("stop");

    // THEN
    assert_eq!(outcome, StopOutcome::AlreadyStopped);
}

/// **VALUE**: Verifies a second start keeps the first server.
///
/// **WHY THIS MATTERS**: macOS reopen and setup can both request a start. Two servers
/// would split the renderer across ports.
///
/// **BUG THIS CATCHES**: Would catch the second listener being activated or bound.
#[tokio::test]
async fn given_running_server_when_started_again_then_returns_same_port_without_activation() {
    // GIVEN: A running server
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));
    let first_port = lifecycle.start(app_router()).await.expect("first start");
    let activations = Arc::new(AtomicUsize::new(0));

    // WHEN: Starting again
    let second_port = lifecycle
        .start(CountingListener {
            activations: Arc::clone(&activations),
        })
        .await
        .expect("second start");

    // THEN: Same port, second listener never activated
    assert_eq!(first_port, second_port);
    assert_eq!(activations.load(Ordering::SeqCst), 0);

    lifecycle.stop().await.expect("stop");
}

/// **VALUE**: Verifies concurrent start and stop leave a consistent state.
///
/// **WHY THIS MATTERS**: Host signals arrive from different threads.
///
/// **BUG THIS CATCHES**: Would catch interleaving that leaves the phase `Running`
/// with no server, or a server bound while the phase says `Stopped`.
#[tokio::test]
async fn given_concurrent_start_and_stop_when_both_complete_then_phase_matches_reality() {
    // GIVEN: A lifecycle shared by two callers
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));
    let starter = lifecycle.clone();
    let stopper = lifecycle.clone();

    // WHEN: Racing start and stop
    let (started, stopped) = tokio::join!(
        async move { starter.start(app_router()).await },
        async move { stopper.stop().await }
    );
    let port = started.expect("start should succeed");
    let outcome = stopped.expect("stop should succeed");

    // THEN: Either order is fine, but the phase must match what actually happened
    match (outcome, lifecycle.phase().await) {
        (StopOutcome::AlreadyStopped, ServerPhase::Running { port: running, .. }) => {
            assert_eq!(running, port);
            let response = get_with_credential(port, Some(TEST_SECRET)).await;
            assert_eq!(response.status().as_u16(), 200);
        }
        (StopOutcome::Stopped, ServerPhase::Stopped) => {
            assert!(port_is_free(port));
        }
        other => panic!("Inconsistent lifecycle state: {other:?}"),
    }

    lifecycle.stop().await.expect("final stop");
}

/// **VALUE**: Verifies a failing listener activation is a start failure with cleanup.
///
/// **WHY THIS MATTERS**: The host fails closed on start failure; a half-started state
/// would block the retry after the user fixes the install.
///
/// **BUG THIS CATCHES**: Would catch the phase sticking at `Starting`.
#[tokio::test]
async fn given_failing_listener_when_started_then_start_failure_and_stopped() {
    // GIVEN: A lifecycle
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));

    // WHEN: Starting with a listener that fails
    let result = lifecycle.start(FailingListener).await;

    // THEN: StartFailure, Stopped, and a later start still works
    match result {
        Err(LifecycleError::StartFailure { message, .. }) => {
            assert!(message.contains("static assets missing"));
        }
        other => panic!("Expected StartFailure, got {other:?}"),
    }
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);

    lifecycle.start(app_router()).await.expect("later start should succeed");
    lifecycle.stop().await.expect("stop");
}

/// **VALUE**: Verifies a busy pinned port surfaces as port exhaustion.
///
/// **BUG THIS CATCHES**: Would catch pinned ports falling back silently.
#[tokio::test]
async fn given_busy_pinned_port_when_started_then_port_exhaustion() {
    // GIVEN: A pinned port that is held
    let (_guard, pinned) = occupy_port();
    let lifecycle = production_lifecycle(LifecycleSettings {
        pinned_port: Some(pinned),
        ..LifecycleSettings::default()
    });

    // WHEN
    let result = lifecycle.start(app_router()).await;

    // THEN
    let error = result.expect_err("start should fail");
    assert!(
        matches!(error, LifecycleError::Port(PortError::Exhausted { .. })),
        "Expected port exhaustion, got {error:?}"
    );
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);
}

/// **VALUE**: Verifies stop waits for an in-flight request that finishes in time.
///
/// **WHY THIS MATTERS**: Cutting a database write mid-request on quit corrupts user data.
///
/// **BUG THIS CATCHES**: Would catch stop aborting immediately instead of draining.
#[tokio::test]
async fn given_in_flight_request_when_stopped_then_request_completes() {
    // GIVEN: A handler that takes a moment, with a request in flight
    let entered = Arc::new(Notify::new());
    let signal = Arc::clone(&entered);
    let app = Router::new().route(
        "/",
        get(move || {
            let signal = Arc::clone(&signal);
            async move {
                signal.notify_one();
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }
        }),
    );
    let lifecycle = production_lifecycle(settings_with_preferred(free_port()));
    let port = lifecycle.start(app).await.expect("start");
    let in_flight = tokio::spawn(async move { get_with_credential(port, Some(TEST_SECRET)).await });
    entered.notified().await;

    // WHEN: Stopping
    let outcome = lifecycle.stop().await.expect("stop");

    // THEN: Graceful, and the request got its answer
    assert_eq!(outcome, StopOutcome::Stopped);
    let response = in_flight.await.expect("request task");
    assert_eq!(response.status().as_u16(), 200);
}

/// **VALUE**: Verifies stop is bounded when a request never finishes.
///
/// **WHY THIS MATTERS**: Quit must not hang forever on a stuck handler.
///
/// **BUG THIS CATCHES**: Would catch stop awaiting the serve task without a deadline.
#[tokio::test]
async fn given_stuck_request_when_stopped_then_forced_after_timeout() {
    // GIVEN: A handler that outlives the shutdown timeout, with a request in flight
    let entered = Arc::new(Notify::new());
    let signal = Arc::clone(&entered);
    let app = Router::new().route(
        "/",
        get(move || {
            let signal = Arc::clone(&signal);
            async move {
                signal.notify_one();
                tokio::time::sleep(Duration::from_secs(30)).await;
                "never"
            }
        }),
    );
    let lifecycle = production_lifecycle(LifecycleSettings {
        preferred_port: free_port(),
        shutdown_timeout: Duration::from_millis(200),
        ..LifecycleSettings::default()
    });
    let port = lifecycle.start(app).await.expect("start");
    let _in_flight = tokio::spawn(async move { get_with_credential(port, Some(TEST_SECRET)).await });
    entered.notified().await;

    // WHEN: Stopping
    let begun = Instant::now();
    let outcome = lifecycle.stop().await.expect("stop");

    // THEN: Forced, promptly, and Stopped
    assert_eq!(outcome, StopOutcome::ForcedAfterTimeout);
    assert!(begun.elapsed() < Duration::from_secs(5));
    assert_eq!(lifecycle.phase().await, ServerPhase::Stopped);
}
