use crate::config::{Mode, ServerEnvironment};
use crate::error::ConfigError;

use common::RedactedSecret;

use std::path::PathBuf;

/// **VALUE**: Verifies the builder defaults auth to required.
///
/// **WHY THIS MATTERS**: Forgetting to set the flag must fail safe.
///
/// **BUG THIS CATCHES**: Would catch `bool::default()` (false) leaking through.
#[test]
fn given_builder_without_auth_flag_when_build_then_auth_required() {
    // GIVEN/WHEN: An environment built without an auth flag
    let environment = ServerEnvironment::builder()
        .with_app_data_dir("/tmp/hearth")
        .with_mode(Mode::Production)
        .build()
        .expect("environment should build");

    // THEN: Auth is required
    assert!(environment.auth_required());
    assert!(environment.secret().is_none());
}

/// **VALUE**: Verifies the database path sits inside the app data directory.
///
/// **WHY THIS MATTERS**: The data store locates its file through this path.
///
/// **BUG THIS CATCHES**: Would catch a renamed database file.
#[test]
fn given_app_data_dir_when_database_path_then_joins_app_db() {
    // GIVEN: An environment
    let environment = ServerEnvironment::builder()
        .with_app_data_dir("/data/hearth")
        .with_mode(Mode::Development)
        .build()
        .expect("environment should build");

    // WHEN/THEN
    assert_eq!(
        environment.database_path(),
        PathBuf::from("/data/hearth").join("app.db")
    );
}

/// **VALUE**: Verifies required fields are enforced.
///
/// **WHY THIS MATTERS**: The server must never start with a half-formed environment.
///
/// **BUG THIS CATCHES**: Would catch defaults being invented for the path or mode.
#[test]
fn given_missing_fields_when_build_then_returns_validation_error() {
    // GIVEN/WHEN: Builders missing one field each
    let no_dir = ServerEnvironment::builder().with_mode(Mode::Production).build();
    let empty_dir = ServerEnvironment::builder()
        .with_app_data_dir("")
        .with_mode(Mode::Production)
        .build();
    let no_mode = ServerEnvironment::builder().with_app_data_dir("/tmp").build();

    // THEN: All fail validation
    for result in [no_dir, empty_dir, no_mode] {
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }
}

/// **VALUE**: Verifies an empty secret produces no credential.
///
/// **WHY THIS MATTERS**: Handing the renderer an empty credential would look like
/// success while every request fails with 500.
///
/// **BUG THIS CATCHES**: Would catch the empty check being dropped.
#[test]
fn given_empty_secret_when_credential_then_none() {
    // GIVEN: Environments with an empty and a real secret
    let empty = ServerEnvironment::builder()
        .with_app_data_dir("/tmp")
        .with_mode(Mode::Production)
        .with_secret(RedactedSecret::new(String::new()))
        .build()
        .expect("environment should build");
    let real = ServerEnvironment::builder()
        .with_app_data_dir("/tmp")
        .with_mode(Mode::Production)
        .with_secret(RedactedSecret::new(String::from("abc123")))
        .build()
        .expect("environment should build");

    // WHEN/THEN
    assert!(empty.credential().is_none());
    let credential = real.credential().expect("credential for real secret");
    assert_eq!(credential.secret().expose(), "abc123");
}

/// **VALUE**: Verifies Debug output of the environment hides the secret.
///
/// **WHY THIS MATTERS**: The environment is logged at startup.
///
/// **BUG THIS CATCHES**: Would catch the secret field becoming a plain `String`.
#[test]
fn given_environment_with_secret_when_debug_formatted_then_secret_hidden() {
    // GIVEN: An environment with a secret
    let environment = ServerEnvironment::builder()
        .with_app_data_dir("/tmp")
        .with_mode(Mode::Production)
        .with_secret(RedactedSecret::new(String::from("super-secret-value")))
        .build()
        .expect("environment should build");

    // WHEN: Formatting
    let debug = format!("{environment:?}");

    // THEN: No secret
    assert!(!debug.contains("super-secret-value"));
}
