use crate::HEALTH_ROUTE;
use crate::config::ServerEnvironment;
use crate::middleware::{ContentPolicy, auth_gate, content_policy};

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;

/// Wrap an application router with the trust boundary.
///
/// Layers run outermost first: the content policy, then the auth gate, then
/// the route. Rejections from the auth gate therefore still carry the policy
/// headers, and no handler runs for an unauthenticated request.
///
/// `HEALTH_ROUTE` is reserved; `app` must not define it.
pub fn compose(app: Router, environment: Arc<ServerEnvironment>) -> Router {
    let policy = ContentPolicy::for_mode(environment.mode());

    app.route(HEALTH_ROUTE, get(health))
        .layer(from_fn_with_state(environment, auth_gate))
        .layer(from_fn_with_state(policy, content_policy))
}

async fn health() -> &'static str {
    "ok"
}
