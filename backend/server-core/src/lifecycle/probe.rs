//! Readiness probe run by the host right after a production start.

use crate::credential::CredentialHeader;
use crate::error::ProbeError;
use crate::{HEALTH_ROUTE, LOOPBACK_BASE_URL};

use common::{HttpStatusCode, Readiness};

use std::time::Duration;

use axum::http::HeaderMap;
use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace};
use reqwest::Client;
use tokio::time::sleep;

const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const PROBE_INITIAL_INTERVAL: Duration = Duration::from_millis(50);
const PROBE_MAX_INTERVAL: Duration = Duration::from_secs(1);

/// URL of the health route on the loopback server.
pub fn probe_url(port: u16) -> String {
    format!("{LOOPBACK_BASE_URL}:{port}{HEALTH_ROUTE}")
}

/// Poll the health route until it answers `2xx`.
///
/// Connection failures and `5xx` answers are retried with exponential backoff
/// until `max_wait` elapses. A `4xx` answer means the credential is wrong and
/// fails immediately.
///
/// # Errors
///
/// - [`ProbeError::Client`] if the HTTP client cannot be built
/// - [`ProbeError::Rejected`] on a `4xx` answer
/// - [`ProbeError::Timeout`] if the server never became ready
pub async fn wait_until_ready(
    port: u16,
    credential: Option<&CredentialHeader>,
    max_wait: Duration,
) -> Result<(), ProbeError> {
    let client = Client::builder()
        .timeout(PROBE_REQUEST_TIMEOUT)
        .no_proxy()
        .build()
        .map_err(|e| ProbeError::client(format!("Failed to build probe client: {e}")))?;

    let mut headers = HeaderMap::new();
    if let Some(credential) = credential {
        if !credential.apply(&mut headers) {
            return Err(ProbeError::client("Credential cannot be sent as a header"));
        }
    }

    let url = probe_url(port);
    let mut backoff = ExponentialBackoff {
        initial_interval: PROBE_INITIAL_INTERVAL,
        max_interval: PROBE_MAX_INTERVAL,
        max_elapsed_time: Some(max_wait),
        ..Default::default()
    };

    debug!("Waiting for server readiness at {url}");

    loop {
        match client.get(&url).headers(headers.clone()).send().await {
            Ok(response) => {
                let status = HttpStatusCode(response.status().as_u16());

                match status.readiness() {
                    Readiness::Ready => {
                        info!("Server is ready at {url}");
                        return Ok(());
                    }
                    Readiness::Refused => {
                        return Err(ProbeError::rejected(
                            status,
                            format!("Health check at {url} was refused"),
                        ));
                    }
                    Readiness::Pending => {}
                }

                trace!("Health check answered {status}, retrying");
            }
            Err(e) => trace!("Health check failed: {e}"),
        }

        match backoff.next_backoff() {
            Some(duration) => sleep(duration).await,
            None => {
                return Err(ProbeError::timeout(format!(
                    "Server at {url} did not become ready within {max_wait:?}"
                )));
            }
        }
    }
}
