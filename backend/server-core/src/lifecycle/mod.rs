//! The single embedded server, started and stopped through a serialized actor.
//!
//! [`ServerLifecycle`] is the only way to bring the loopback server up or down.
//! Every transition runs on one actor task, so a `start` and a `stop` can never
//! interleave. The current [`ServerPhase`] is readable at any time without
//! going through the actor.

pub mod handle;
pub mod listener;
pub mod manager;
pub mod phase;
pub mod probe;
pub mod router;

pub use handle::ServerHandle;
pub use listener::{ListenerError, RequestListener};
pub use manager::{LifecycleSettings, ServerLifecycle};
pub use phase::{ServerPhase, StopOutcome};
pub use probe::wait_until_ready;
pub use router::compose;
