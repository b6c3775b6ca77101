//! Request listener serving the packaged web UI.
//!
//! Static files come from `<resource_dir>/.output/public`. Any path that is
//! not a file falls back to `index.html` so client-side routes resolve, and
//! every `index.html` response carries the request's CSP nonce in place of
//! [`NONCE_PLACEHOLDER`].

use server_core::config::ServerEnvironment;
use server_core::lifecycle::{ListenerError, RequestListener};
use server_core::middleware::CspNonce;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Extension, Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use log::{debug, info};
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Directory of the built web UI, relative to the resource directory.
pub const FRONTEND_OUTPUT_DIR: &str = ".output/public";

pub const INDEX_FILE_NAME: &str = "index.html";

/// Marker in `index.html` replaced with the per-request nonce.
pub const NONCE_PLACEHOLDER: &str = "__CSP_NONCE__";

/// `index.html` loaded once at activation.
#[derive(Debug, Clone)]
pub struct IndexTemplate {
    html: Arc<str>,
}

impl IndexTemplate {
    pub fn new(html: impl Into<Arc<str>>) -> Self {
        Self { html: html.into() }
    }

    pub fn render(&self, nonce: &CspNonce) -> String {
        self.html.replace(NONCE_PLACEHOLDER, nonce.as_str())
    }
}

#[derive(Clone)]
struct FrontendAssets {
    files: ServeDir,
    index: IndexTemplate,
}

/// Serves the web UI from a directory on disk.
#[derive(Debug, Clone)]
pub struct FrontendListener {
    root: PathBuf,
}

impl FrontendListener {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Listener for the UI bundled under `resource_dir`.
    pub fn from_resource_dir(resource_dir: &Path) -> Self {
        Self::new(resource_dir.join(FRONTEND_OUTPUT_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RequestListener for FrontendListener {
    fn activate(self: Box<Self>, _environment: &ServerEnvironment) -> Result<Router, ListenerError> {
        if !self.root.is_dir() {
            return Err(format!("Frontend directory {} does not exist", self.root.display()).into());
        }

        let index_path = self.root.join(INDEX_FILE_NAME);
        let html = std::fs::read_to_string(&index_path)
            .map_err(|e| format!("Failed to read {}: {e}", index_path.display()))?;

        info!("Serving web UI from {}", self.root.display());

        let assets = FrontendAssets {
            files: ServeDir::new(&self.root).append_index_html_on_directories(false),
            index: IndexTemplate::new(html),
        };

        Ok(Router::new()
            .route("/", get(serve_index))
            .route("/index.html", get(serve_index))
            .fallback(serve_asset)
            .with_state(assets))
    }
}

async fn serve_index(
    State(assets): State<FrontendAssets>,
    Extension(nonce): Extension<CspNonce>,
) -> Html<String> {
    Html(assets.index.render(&nonce))
}

async fn serve_asset(
    State(assets): State<FrontendAssets>,
    Extension(nonce): Extension<CspNonce>,
    request: Request,
) -> Response {
    let path = request.uri().path().to_owned();

    match assets.files.oneshot(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.map(Body::new),
        Ok(_) => {
            debug!("No asset at {path}, serving {INDEX_FILE_NAME}");
            Html(assets.index.render(&nonce)).into_response()
        }
        Err(never) => match never {},
    }
}
