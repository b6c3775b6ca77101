use crate::{ErrorLocation, ExposureError};

use std::panic::Location;

#[track_caller]
fn refuse(message: &str) -> ExposureError {
    ExposureError::Refused {
        message: message.to_owned(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// **VALUE**: Verifies that a `#[track_caller]` error constructor records the line that
/// called it, not its own body.
///
/// **WHY THIS MATTERS**: Startup failures are diagnosed from the log alone. Each error
/// must point at the step in the lifecycle that produced it.
///
/// **BUG THIS CATCHES**: Would catch a constructor that loses `#[track_caller]` or a
/// location captured inside a closure.
#[test]
fn given_track_caller_constructor_when_called_then_location_is_call_site() {
    // GIVEN: The line of the call
    let expected_line = line!() + 3;

    // WHEN: Building an error through the helper
    let error = refuse("probe");

    // THEN: The location is this file and line
    let ExposureError::Refused { location, .. } = error;
    assert!(location.file.ends_with("error_location.rs"));
    assert_eq!(location.line, expected_line);
}

/// **VALUE**: Verifies the `[file:line:column]` suffix every error message ends with.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops a component.
#[test]
fn given_error_when_displayed_then_message_ends_with_bracketed_location() {
    let error = refuse("secret left the process");
    let ExposureError::Refused { location, .. } = &error;

    let rendered = error.to_string();

    assert!(rendered.contains("secret left the process"));
    assert!(rendered.ends_with(&format!(
        "[{}:{}:{}]",
        location.file, location.line, location.column
    )));
}

/// **VALUE**: Verifies that the location serializes as a plain object.
///
/// **WHY THIS MATTERS**: Host errors cross the IPC boundary as JSON and keep their
/// location so the renderer can report it.
#[test]
fn given_error_location_when_serialized_then_has_file_line_column_fields() {
    let location = ErrorLocation::from(Location::caller());

    let json = serde_json::to_value(location).expect("location should serialize");

    assert_eq!(json["line"], location.line);
    assert_eq!(json["column"], location.column);
    assert!(json["file"].as_str().is_some_and(|f| f.ends_with("error_location.rs")));
}
