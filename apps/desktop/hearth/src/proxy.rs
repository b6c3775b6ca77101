//! Custom-scheme proxy from the webview to the embedded server.
//!
//! A webview cannot add headers to its own page loads, so production windows
//! load the [`PROXY_SCHEME`] origin instead of the loopback address. Every
//! request on that scheme is forwarded here to `127.0.0.1:<port>` with the
//! credential header attached, and the server's answer is relayed back as-is.

use crate::error::HearthError;
use crate::state::AppState;

use server_core::credential::CredentialHeader;
use server_core::lifecycle::ServerPhase;
use server_core::{AUTH_HEADER, LOCALHOST_HOSTNAME, LOOPBACK_BASE_URL, PROXY_HOST, PROXY_SCHEME};

use std::time::Duration;

use log::{debug, trace, warn};
use reqwest::Client;
use reqwest::redirect::Policy;
use tauri::http::header::CONTENT_TYPE;
use tauri::http::{HeaderMap, HeaderValue, Request, Response, StatusCode, Uri};
use tauri::{Builder, Manager, Runtime};
use url::Url;

const PROXY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that describe a single hop and are never forwarded.
const HOP_HEADERS: [&str; 7] = [
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// The origin production windows load.
///
/// WebView2 and the Android webview only serve custom schemes as
/// `http://<scheme>.localhost`.
pub fn proxy_origin() -> Result<Url, HearthError> {
    let raw = if cfg!(any(windows, target_os = "android")) {
        format!("http://{PROXY_HOST}/")
    } else {
        format!("{PROXY_SCHEME}://{LOCALHOST_HOSTNAME}/")
    };

    Url::parse(&raw).map_err(|e| HearthError::hearth(format!("Invalid proxy origin {raw}: {e}")))
}

/// Loopback URL a proxied request is sent to.
pub fn target_url(port: u16, uri: &Uri) -> String {
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("{LOOPBACK_BASE_URL}:{port}{path}")
}

/// HTTP client that forwards webview requests to the loopback server.
#[derive(Debug, Clone)]
pub struct LoopbackProxy {
    client: Client,
}

impl LoopbackProxy {
    /// # Errors
    ///
    /// Returns [`HearthError::Hearth`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, HearthError> {
        let client = Client::builder()
            .no_proxy()
            .redirect(Policy::none())
            .timeout(PROXY_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HearthError::hearth(format!("Failed to build proxy client: {e}")))?;

        Ok(Self { client })
    }

    /// Forward one webview request to the server on `port`.
    ///
    /// Whatever credential the page sent is dropped and replaced with the
    /// host's own. Transport failures become `502`.
    pub async fn forward(
        &self,
        port: u16,
        credential: Option<&CredentialHeader>,
        request: Request<Vec<u8>>,
    ) -> Response<Vec<u8>> {
        let (parts, body) = request.into_parts();
        let url = target_url(port, &parts.uri);

        let mut headers = parts.headers;
        strip_hop_headers(&mut headers);
        headers.remove(AUTH_HEADER);
        if let Some(credential) = credential {
            if !credential.apply(&mut headers) {
                return plain(StatusCode::INTERNAL_SERVER_ERROR, "Credential cannot be sent");
            }
        }

        trace!("Proxying {} {url}", parts.method);

        let upstream = match self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
        {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!("Proxy request to {url} failed: {e}");
                return plain(StatusCode::BAD_GATEWAY, "Embedded server unreachable");
            }
        };

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_headers(&mut headers);

        match upstream.bytes().await {
            Ok(body) => {
                let mut response = Response::new(body.to_vec());
                *response.status_mut() = status;
                *response.headers_mut() = headers;
                response
            }
            Err(e) => {
                warn!("Proxy response body from {url} failed: {e}");
                plain(StatusCode::BAD_GATEWAY, "Embedded server response truncated")
            }
        }
    }
}

/// Answer a proxy-scheme request from the managed state.
///
/// Only a local production server is proxied; anything else is `503`.
pub async fn handle(state: &AppState, request: Request<Vec<u8>>) -> Response<Vec<u8>> {
    match state.phase().await {
        ServerPhase::Running { port, local: true } => {
            let credential = state.credential();
            state.proxy().forward(port, credential.as_ref(), request).await
        }
        phase => {
            debug!("Proxy request refused while server is {phase}");
            plain(StatusCode::SERVICE_UNAVAILABLE, "Embedded server is not running")
        }
    }
}

/// Register the proxy scheme on the Tauri builder.
pub fn register<R: Runtime>(builder: Builder<R>) -> Builder<R> {
    builder.register_asynchronous_uri_scheme_protocol(PROXY_SCHEME, |ctx, request, responder| {
        let state = ctx
            .app_handle()
            .try_state::<AppState>()
            .map(|state| state.inner().clone());

        tauri::async_runtime::spawn(async move {
            let response = match state {
                Some(state) => handle(&state, request).await,
                None => plain(StatusCode::SERVICE_UNAVAILABLE, "Host is still starting"),
            };
            responder.respond(response);
        });
    })
}

fn strip_hop_headers(headers: &mut HeaderMap) {
    for name in HOP_HEADERS {
        headers.remove(name);
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Vec<u8>> {
    let mut response = Response::new(message.as_bytes().to_vec());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}
