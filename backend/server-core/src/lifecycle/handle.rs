use crate::lifecycle::StopOutcome;

use std::io::Result as IoResult;
use std::time::Duration;

use axum::Router;
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// A running serve task and the means to stop it.
#[derive(Debug)]
pub struct ServerHandle {
    port: u16,
    shutdown: CancellationToken,
    task: JoinHandle<IoResult<()>>,
}

impl ServerHandle {
    /// Serve `router` on an already bound listener.
    pub fn spawn(listener: TcpListener, router: Router) -> IoResult<Self> {
        let port = listener.local_addr()?.port();
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        debug!("Serve task spawned on port {port}");
        Ok(Self {
            port,
            shutdown,
            task,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting connections and drain in-flight requests.
    ///
    /// If draining takes longer than `grace`, the serve task is aborted.
    pub async fn shutdown(self, grace: Duration) -> StopOutcome {
        let ServerHandle {
            port,
            shutdown,
            mut task,
        } = self;

        shutdown.cancel();

        match timeout(grace, &mut task).await {
            Ok(Ok(Ok(()))) => {
                info!("Server on port {port} shut down gracefully");
                StopOutcome::Stopped
            }
            Ok(Ok(Err(e))) => {
                warn!("Server on port {port} exited with error during shutdown: {e}");
                StopOutcome::Stopped
            }
            Ok(Err(e)) => {
                error!("Serve task for port {port} failed: {e}");
                StopOutcome::Stopped
            }
            Err(_) => {
                warn!("Server on port {port} did not drain within {grace:?}, aborting");
                task.abort();
                StopOutcome::ForcedAfterTimeout
            }
        }
    }
}
