use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::Serialize;

/// Where the embedded server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ServerPhase {
    Stopped,
    Starting,
    /// `local` is `false` when an external dev server owns `port`.
    Running { port: u16, local: bool },
    Stopping,
}

impl ServerPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, ServerPhase::Running { .. })
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            ServerPhase::Running { port, .. } => Some(*port),
            _ => None,
        }
    }
}

impl Display for ServerPhase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            ServerPhase::Stopped => formatter.write_str("stopped"),
            ServerPhase::Starting => formatter.write_str("starting"),
            ServerPhase::Running { port, local: true } => write!(formatter, "running on port {port}"),
            ServerPhase::Running { port, local: false } => {
                write!(formatter, "deferring to dev server on port {port}")
            }
            ServerPhase::Stopping => formatter.write_str("stopping"),
        }
    }
}

/// How a `stop` request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    /// Nothing was running.
    AlreadyStopped,
    /// The server drained and exited within the shutdown timeout.
    Stopped,
    /// In-flight requests outlived the shutdown timeout and the serve task was aborted.
    ForcedAfterTimeout,
}
