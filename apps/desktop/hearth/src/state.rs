use crate::frontend::FrontendListener;
use crate::proxy::LoopbackProxy;

use server_core::config::Mode;
use server_core::credential::CredentialHeader;
use server_core::lifecycle::{ServerLifecycle, ServerPhase};

use std::time::Duration;

/// Managed Tauri state: the embedded server, the proxy in front of it and
/// what the host needs to bring it back after a macOS reopen.
#[derive(Clone)]
pub struct AppState {
    lifecycle: ServerLifecycle,
    frontend: FrontendListener,
    proxy: LoopbackProxy,
    probe_timeout: Duration,
}

impl AppState {
    pub fn new(
        lifecycle: ServerLifecycle,
        frontend: FrontendListener,
        proxy: LoopbackProxy,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            lifecycle,
            frontend,
            proxy,
            probe_timeout,
        }
    }

    pub fn lifecycle(&self) -> &ServerLifecycle {
        &self.lifecycle
    }

    pub fn mode(&self) -> Mode {
        self.lifecycle.environment().mode()
    }

    pub fn frontend(&self) -> &FrontendListener {
        &self.frontend
    }

    pub fn proxy(&self) -> &LoopbackProxy {
        &self.proxy
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn credential(&self) -> Option<CredentialHeader> {
        self.lifecycle.credential()
    }

    pub async fn phase(&self) -> ServerPhase {
        self.lifecycle.phase().await
    }
}
