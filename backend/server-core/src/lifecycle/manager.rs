use crate::config::{ServerEnvironment, ServerSettings};
use crate::credential::CredentialHeader;
use crate::error::LifecycleError;
use crate::lifecycle::{RequestListener, ServerHandle, ServerPhase, StopOutcome, compose};
use crate::port::{resolve_pinned_port, resolve_port};
use crate::{DEFAULT_PORT, DEV_SERVER_PORT, LOOPBACK_HOSTNAME};

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

const COMMAND_CHANNEL_CAPACITY: usize = 16;
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Port and shutdown parameters for the lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub preferred_port: u16,
    pub dev_server_port: u16,
    pub pinned_port: Option<u16>,
    pub shutdown_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            preferred_port: DEFAULT_PORT,
            dev_server_port: DEV_SERVER_PORT,
            pinned_port: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl From<&ServerSettings> for LifecycleSettings {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            preferred_port: settings.preferred_port,
            dev_server_port: settings.dev_server_port,
            pinned_port: settings.pinned_port,
            shutdown_timeout: settings.shutdown_timeout(),
        }
    }
}

/// Commands processed by the lifecycle actor.
enum LifecycleCommand {
    Start {
        listener: Box<dyn RequestListener>,
        reply: oneshot::Sender<Result<u16, LifecycleError>>,
    },
    Stop {
        reply: oneshot::Sender<StopOutcome>,
    },
}

/// Owner of the one embedded server.
///
/// Uses an actor pattern: `start` and `stop` send commands that a single task
/// processes in order. Cloning is cheap and every clone drives the same server.
/// When the last clone is dropped the actor stops any running server and exits.
#[derive(Clone)]
pub struct ServerLifecycle {
    /// Channel to send lifecycle commands to the actor
    command_tx: Arc<Mutex<Option<mpsc::Sender<LifecycleCommand>>>>,

    /// Shared read access to the current phase
    phase: Arc<RwLock<ServerPhase>>,

    /// Track if actor has been initialized
    actor_init: Arc<Mutex<bool>>,

    environment: Arc<ServerEnvironment>,
    settings: LifecycleSettings,
}

impl ServerLifecycle {
    /// Create a manager for `environment`.
    ///
    /// The environment is frozen here, before any listener can exist. The
    /// actor is spawned lazily on first use within an async context.
    pub fn new(environment: ServerEnvironment, settings: LifecycleSettings) -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            phase: Arc::new(RwLock::new(ServerPhase::Stopped)),
            actor_init: Arc::new(Mutex::new(false)),
            environment: Arc::new(environment),
            settings,
        }
    }

    pub fn environment(&self) -> &ServerEnvironment {
        &self.environment
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Credential the renderer must attach to reach the server.
    pub fn credential(&self) -> Option<CredentialHeader> {
        self.environment.credential()
    }

    /// Current phase (read without going through the actor).
    pub async fn phase(&self) -> ServerPhase {
        *self.phase.read().await
    }

    /// Port of the running server, if any.
    pub async fn port(&self) -> Option<u16> {
        self.phase.read().await.port()
    }

    /// Start the server with `listener` and return the port it answers on.
    ///
    /// Calling `start` while already running keeps the existing server and
    /// returns its port; `listener` is dropped unused.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Port`] if no loopback port could be negotiated
    /// - [`LifecycleError::StartFailure`] if the listener fails to activate or the bind fails
    /// - [`LifecycleError::Actor`] if the lifecycle actor is gone
    pub async fn start<L: RequestListener>(&self, listener: L) -> Result<u16, LifecycleError> {
        let (reply, response) = oneshot::channel();
        self.send(LifecycleCommand::Start {
            listener: Box::new(listener),
            reply,
        })
        .await?;

        response
            .await
            .map_err(|e| LifecycleError::actor(format!("Lifecycle actor dropped start reply: {e}")))?
    }

    /// Stop the server. Safe to call any number of times.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Actor`] if the lifecycle actor is gone.
    pub async fn stop(&self) -> Result<StopOutcome, LifecycleError> {
        let (reply, response) = oneshot::channel();
        self.send(LifecycleCommand::Stop { reply }).await?;

        response
            .await
            .map_err(|e| LifecycleError::actor(format!("Lifecycle actor dropped stop reply: {e}")))
    }

    async fn send(&self, command: LifecycleCommand) -> Result<(), LifecycleError> {
        self.ensure_actor().await;

        let tx = {
            let tx_guard = self.command_tx.lock().await;
            tx_guard
                .as_ref()
                .cloned()
                .ok_or_else(|| LifecycleError::actor("Lifecycle actor not initialized"))?
        };

        tx.send(command)
            .await
            .map_err(|e| LifecycleError::actor(format!("Lifecycle actor died: {e}")))
    }

    /// Ensure actor is spawned (called lazily from async context)
    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

            // Store tx before spawning so no command can miss the actor
            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            let actor = LifecycleActor {
                phase: Arc::clone(&self.phase),
                environment: Arc::clone(&self.environment),
                settings: self.settings,
                handle: None,
            };

            tokio::spawn(lifecycle_actor(rx, actor));
            *init_guard = true;
            info!("Lifecycle actor spawned");
        }
    }
}

/// State owned by the actor task. Only the actor writes the phase.
struct LifecycleActor {
    phase: Arc<RwLock<ServerPhase>>,
    environment: Arc<ServerEnvironment>,
    settings: LifecycleSettings,
    handle: Option<ServerHandle>,
}

impl LifecycleActor {
    async fn set_phase(&self, next: ServerPhase) {
        let mut phase = self.phase.write().await;
        debug!("Server phase: {} -> {}", *phase, next);
        *phase = next;
    }

    async fn start(&mut self, listener: Box<dyn RequestListener>) -> Result<u16, LifecycleError> {
        let current = *self.phase.read().await;
        if let ServerPhase::Running { port, .. } = current {
            warn!("Start requested while already running on port {port}; keeping existing server");
            return Ok(port);
        }

        self.set_phase(ServerPhase::Starting).await;

        match self.bring_up(listener).await {
            Ok(running) => {
                self.set_phase(running).await;
                match running {
                    ServerPhase::Running { port, .. } => Ok(port),
                    _ => Err(LifecycleError::start_failure("Start finished without a port")),
                }
            }
            Err(e) => {
                error!("Server start failed: {e}");
                self.set_phase(ServerPhase::Stopped).await;
                Err(e)
            }
        }
    }

    async fn bring_up(
        &mut self,
        listener: Box<dyn RequestListener>,
    ) -> Result<ServerPhase, LifecycleError> {
        let mode = self.environment.mode();

        if mode.is_development() {
            let port = resolve_port(
                self.settings.preferred_port,
                mode,
                self.settings.dev_server_port,
            )
            .await?;
            info!("Development mode: renderer uses the dev server on port {port}");
            return Ok(ServerPhase::Running { port, local: false });
        }

        let port = match self.settings.pinned_port {
            Some(pinned) => resolve_pinned_port(pinned).await?,
            None => resolve_port(
                self.settings.preferred_port,
                mode,
                self.settings.dev_server_port,
            )
            .await?,
        };

        let app = listener.activate(&self.environment).map_err(|e| {
            LifecycleError::start_failure(format!("Request listener failed to activate: {e}"))
        })?;
        let router = compose(app, Arc::clone(&self.environment));

        let tcp = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .map_err(|e| {
                LifecycleError::start_failure(format!(
                    "Failed to bind {LOOPBACK_HOSTNAME}:{port}: {e}"
                ))
            })?;

        let handle = ServerHandle::spawn(tcp, router)?;
        let port = handle.port();
        self.handle = Some(handle);

        info!("Embedded server listening on {LOOPBACK_HOSTNAME}:{port}");
        Ok(ServerPhase::Running { port, local: true })
    }

    async fn stop(&mut self) -> StopOutcome {
        let current = *self.phase.read().await;

        match (self.handle.take(), current) {
            (Some(handle), _) => {
                self.set_phase(ServerPhase::Stopping).await;
                let outcome = handle.shutdown(self.settings.shutdown_timeout).await;
                self.set_phase(ServerPhase::Stopped).await;
                outcome
            }
            (None, ServerPhase::Running { port, .. }) => {
                info!("Releasing dev server on port {port}");
                self.set_phase(ServerPhase::Stopped).await;
                StopOutcome::Stopped
            }
            (None, _) => {
                debug!("Stop requested while already stopped");
                StopOutcome::AlreadyStopped
            }
        }
    }
}

/// The lifecycle actor task.
///
/// Processes commands one at a time, so transitions never overlap. Exits once
/// every [`ServerLifecycle`] clone is dropped, stopping the server first.
async fn lifecycle_actor(mut command_rx: mpsc::Receiver<LifecycleCommand>, mut actor: LifecycleActor) {
    info!("Lifecycle actor started");

    while let Some(command) = command_rx.recv().await {
        match command {
            LifecycleCommand::Start { listener, reply } => {
                let result = actor.start(listener).await;
                if reply.send(result).is_err() {
                    warn!("Start requester went away before the reply");
                }
            }
            LifecycleCommand::Stop { reply } => {
                let outcome = actor.stop().await;
                if reply.send(outcome).is_err() {
                    warn!("Stop requester went away before the reply");
                }
            }
        }
    }

    if actor.handle.is_some() {
        warn!("Lifecycle handle dropped with the server still running; stopping it");
        actor.stop().await;
    }

    info!("Lifecycle actor stopped");
}
