use crate::AUTH_HEADER;
use crate::config::{Mode, ServerEnvironment};
use crate::error::AuthRejection;
use crate::middleware::{authenticate, credentials_match};

use common::{HttpStatusCode, RedactedSecret};

use std::hint::black_box;
use std::time::{Duration, Instant};

use axum::body::to_bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

const TEST_SECRET: &str = "4f1c2a9e7b3d5f60818293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8";

fn environment(secret: Option<&str>, auth_required: bool) -> ServerEnvironment {
    let mut builder = ServerEnvironment::builder()
        .with_app_data_dir("/tmp/hearth")
        .with_mode(Mode::Production)
        .with_auth_required(auth_required);
    if let Some(secret) = secret {
        builder = builder.with_secret(RedactedSecret::new(secret.to_string()));
    }
    builder.build().expect("environment should build")
}

fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTH_HEADER,
        HeaderValue::from_str(value).expect("valid header value"),
    );
    headers
}

/// **VALUE**: Verifies the exact secret is accepted.
///
/// **WHY THIS MATTERS**: Every legitimate renderer request depends on this path.
///
/// **BUG THIS CATCHES**: Would catch a comparison that rejects equal inputs
/// (e.g. comparing against the wrong header).
#[test]
fn given_matching_credential_when_authenticate_then_passes() {
    // GIVEN: An environment and a request carrying the secret
    let environment = environment(Some(TEST_SECRET), true);
    let headers = headers_with(TEST_SECRET);

    // WHEN/THEN
    assert_eq!(authenticate(&headers, &environment), Ok(()));
}

/// **VALUE**: Verifies missing and wrong credentials are rejected with 401.
///
/// **WHY THIS MATTERS**: This is the whole trust boundary. Any other local process
/// can reach the loopback port.
///
/// **BUG THIS CATCHES**: Would catch prefix matching, case-insensitive matching or
/// a missing header being waved through.
#[test]
fn given_missing_or_wrong_credential_when_authenticate_then_invalid_credential() {
    // GIVEN: An environment with a secret
    let environment = environment(Some(TEST_SECRET), true);
    let prefix = &TEST_SECRET[..TEST_SECRET.len() - 1];
    let longer = format!("{TEST_SECRET}0");
    let upper = TEST_SECRET.to_ascii_uppercase();

    let cases = [
        HeaderMap::new(),
        headers_with(""),
        headers_with("wrong"),
        headers_with(prefix),
        headers_with(&longer),
        headers_with(&upper),
    ];

    // WHEN/THEN: Every case is InvalidCredential
    for headers in cases {
        assert_eq!(
            authenticate(&headers, &environment),
            Err(AuthRejection::InvalidCredential)
        );
    }
}

/// **VALUE**: Verifies a missing or empty secret is a server error, not an open door.
///
/// **WHY THIS MATTERS**: With no secret, an empty header would "match" an empty secret.
///
/// **BUG THIS CATCHES**: Would catch comparing an empty header against an empty secret.
#[test]
fn given_no_secret_when_authenticate_then_secret_not_configured() {
    // GIVEN: Environments with no secret and an empty secret
    let missing = environment(None, true);
    let empty = environment(Some(""), true);

    // WHEN/THEN: Both reject, even with an empty header
    assert_eq!(
        authenticate(&HeaderMap::new(), &missing),
        Err(AuthRejection::SecretNotConfigured)
    );
    assert_eq!(
        authenticate(&headers_with(""), &empty),
        Err(AuthRejection::SecretNotConfigured)
    );
}

/// **VALUE**: Verifies requests pass when auth is disabled.
///
/// **WHY THIS MATTERS**: Development tooling hits the server without a credential.
///
/// **BUG THIS CATCHES**: Would catch the flag being ignored by the gate.
#[test]
fn given_auth_disabled_when_authenticate_then_passes_without_header() {
    // GIVEN: Auth disabled, no secret
    let environment = environment(None, false);

    // WHEN/THEN
    assert_eq!(authenticate(&HeaderMap::new(), &environment), Ok(()));
}

/// **VALUE**: Verifies rejection responses carry fixed status codes and bodies.
///
/// **WHY THIS MATTERS**: The renderer tells "wrong credential" from "host misconfigured"
/// by status. Bodies must never include secret material.
///
/// **BUG THIS CATCHES**: Would catch swapped status codes or bodies that echo input.
#[tokio::test]
async fn given_rejection_when_into_response_then_status_and_body_are_fixed() {
    // GIVEN: Both rejections
    for (rejection, status, body) in [
        (
            AuthRejection::InvalidCredential,
            StatusCode::UNAUTHORIZED,
            "InvalidCredential",
        ),
        (
            AuthRejection::SecretNotConfigured,
            StatusCode::INTERNAL_SERVER_ERROR,
            "SecretNotConfigured",
        ),
    ] {
        // WHEN: Converting to a response
        let response = rejection.into_response();

        // THEN: Fixed status and body
        assert_eq!(response.status(), status);
        assert_eq!(HttpStatusCode(status.as_u16()), rejection.status_code());
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(&bytes[..], body.as_bytes());
    }
}

/// **VALUE**: Verifies the comparison primitive on equal, different and mismatched-length inputs.
///
/// **WHY THIS MATTERS**: `ct_eq` on different lengths returns false, but the explicit
/// length check is what keeps a truncated credential from ever being compared.
///
/// **BUG THIS CATCHES**: Would catch an inverted result from `Choice` conversion.
#[test]
fn given_byte_strings_when_credentials_match_then_only_exact_equal() {
    // GIVEN/WHEN/THEN
    assert!(credentials_match(b"abcdef", b"abcdef"));
    assert!(!credentials_match(b"abcdeg", b"abcdef"));
    assert!(!credentials_match(b"abcde", b"abcdef"));
    assert!(!credentials_match(b"", b"abcdef"));
}

fn fastest_batch(provided: &[u8], expected: &[u8]) -> Duration {
    const SAMPLES: usize = 30;
    const BATCH: usize = 2_000;

    (0..SAMPLES)
        .map(|_| {
            let start = Instant::now();
            for _ in 0..BATCH {
                black_box(credentials_match(black_box(provided), black_box(expected)));
            }
            start.elapsed()
        })
        .min()
        .unwrap_or_default()
}

/// **VALUE**: Verifies comparison time does not depend on how many leading bytes match.
///
/// **WHY THIS MATTERS**: An early-exit comparison lets a local attacker recover the
/// secret byte by byte from response timing.
///
/// **BUG THIS CATCHES**: Would catch `==` on slices replacing the constant-time compare.
/// The bound is loose on purpose: only an order-of-magnitude gap fails.
#[test]
fn given_early_and_late_mismatch_when_compared_then_timing_is_similar() {
    // GIVEN: Long credentials that differ at the first or the last byte
    let expected = vec![b'a'; 4096];
    let mut early = expected.clone();
    early[0] = b'b';
    let mut late = expected.clone();
    late[4095] = b'b';

    // WHEN: Timing the fastest batch of each
    let early_time = fastest_batch(&early, &expected).as_nanos().max(1) as f64;
    let late_time = fastest_batch(&late, &expected).as_nanos().max(1) as f64;

    // THEN: Within a generous factor of each other
    let ratio = late_time.max(early_time) / late_time.min(early_time);
    assert!(
        ratio < 5.0,
        "Comparison time depends on mismatch position (ratio {ratio:.2})"
    );
}
