use crate::{HttpStatusCode, Readiness};

/// **VALUE**: Verifies how health-route answers map onto readiness.
///
/// **WHY THIS MATTERS**: The probe stops retrying on a refusal (a wrong credential
/// will never fix itself) and keeps polling while the server warms up.
///
/// **BUG THIS CATCHES**: Would catch if 401 were treated as pending, turning a
/// misconfigured secret into a probe that spins until its deadline.
#[test]
fn given_status_codes_when_mapped_to_readiness_then_match_probe_expectations() {
    assert_eq!(HttpStatusCode::OK.readiness(), Readiness::Ready);
    assert_eq!(HttpStatusCode(204).readiness(), Readiness::Ready);
    assert_eq!(HttpStatusCode::UNAUTHORIZED.readiness(), Readiness::Refused);
    assert_eq!(HttpStatusCode(404).readiness(), Readiness::Refused);
    assert_eq!(HttpStatusCode::INTERNAL_SERVER_ERROR.readiness(), Readiness::Pending);
    assert_eq!(HttpStatusCode::from(503).readiness(), Readiness::Pending);
}

#[test]
fn given_status_code_when_displayed_then_prints_bare_number() {
    assert_eq!(HttpStatusCode(404).to_string(), "404");
}
