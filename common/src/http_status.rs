//! Status codes as seen by the auth gate and the readiness probe.

use std::fmt;

/// What a health-route answer means for a server that was just started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// `2xx`: the server is up and the credential was accepted.
    Ready,
    /// `4xx`: the server is up but will never accept this probe.
    Refused,
    /// Anything else: try again later.
    Pending,
}

/// Raw HTTP status code carried in rejections and probe errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const OK: HttpStatusCode = HttpStatusCode(200);
    pub const UNAUTHORIZED: HttpStatusCode = HttpStatusCode(401);
    pub const INTERNAL_SERVER_ERROR: HttpStatusCode = HttpStatusCode(500);

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn readiness(self) -> Readiness {
        if self.is_success() {
            Readiness::Ready
        } else if self.is_client_error() {
            Readiness::Refused
        } else {
            Readiness::Pending
        }
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
