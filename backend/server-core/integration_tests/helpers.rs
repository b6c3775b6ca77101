use server_core::AUTH_HEADER;
use server_core::config::{Mode, ServerEnvironment};
use server_core::lifecycle::{LifecycleSettings, ListenerError, RequestListener, ServerLifecycle};

use common::RedactedSecret;

use std::net::{Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::routing::get;

pub const TEST_SECRET: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0";

pub fn environment(mode: Mode) -> ServerEnvironment {
    ServerEnvironment::builder()
        .with_app_data_dir(std::env::temp_dir().join("hearth-integration"))
        .with_mode(mode)
        .with_secret(RedactedSecret::new(String::from(TEST_SECRET)))
        .build()
        .expect("environment should build")
}

/// A port that was free when this returned.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// Hold a loopback port for the lifetime of the returned listener.
pub fn occupy_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

pub fn port_is_free(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

pub fn settings_with_preferred(port: u16) -> LifecycleSettings {
    LifecycleSettings {
        preferred_port: port,
        ..LifecycleSettings::default()
    }
}

pub fn production_lifecycle(settings: LifecycleSettings) -> ServerLifecycle {
    ServerLifecycle::new(environment(Mode::Production), settings)
}

pub fn app_router() -> Router {
    Router::new().route("/", get(|| async { "hello from hearth" }))
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client")
}

pub async fn get_with_credential(port: u16, credential: Option<&str>) -> reqwest::Response {
    let mut request = http_client().get(format!("http://127.0.0.1:{port}/"));
    if let Some(credential) = credential {
        request = request.header(AUTH_HEADER, credential);
    }
    request.send().await.expect("request should reach server")
}

/// Counts activations so tests can tell whether a listener was used.
pub struct CountingListener {
    pub activations: Arc<AtomicUsize>,
}

impl RequestListener for CountingListener {
    fn activate(self: Box<Self>, _environment: &ServerEnvironment) -> Result<Router, ListenerError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(app_router())
    }
}

/// A listener whose activation always fails.
pub struct FailingListener;

impl RequestListener for FailingListener {
    fn activate(self: Box<Self>, _environment: &ServerEnvironment) -> Result<Router, ListenerError> {
        Err("static assets missing".into())
    }
}
