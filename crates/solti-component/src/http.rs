use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use solti_model::Credentials;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::stats::StatsCache;

const TEXT_CONTENT_TYPE: &str = "text/plaintext";
const JSON_CONTENT_TYPE: &str = "application/json";
const AUTH_CHALLENGE: &str = "Basic realm=\"component\"";

/// Basic-auth protected `/healthz` and `/varz` endpoints.
pub struct HttpExposer {
    credentials: Credentials,
    cache: Arc<StatsCache>,
}

impl HttpExposer {
    pub fn new(credentials: Credentials, cache: Arc<StatsCache>) -> Self {
        Self { credentials, cache }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes (both behind basic auth):
    /// - GET /healthz - liveness text
    /// - GET /varz - pretty-printed varz JSON
    pub fn router(self) -> Router {
        let credentials = Arc::new(self.credentials);
        Router::new()
            .route("/healthz", get(healthz))
            .route("/varz", get(varz))
            .route_layer(middleware::from_fn_with_state(
                credentials,
                require_basic_auth,
            ))
            .with_state(self.cache)
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub fn start(self, listener: TcpListener, shutdown: CancellationToken) -> JoinHandle<()> {
        let router = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!(error = %e, "http exposer stopped");
            }
        })
    }
}

// ============================================================================
// Auth
// ============================================================================

async fn require_basic_auth(
    State(credentials): State<Arc<Credentials>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = basic_credentials(req.headers())
        .is_some_and(|(user, pass)| credentials.matches(&user, &pass));
    if !authorized {
        debug!(path = %req.uri().path(), "rejected request with bad credentials");
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, AUTH_CHALLENGE)],
            "Unauthorized\n",
        )
            .into_response();
    }
    next.run(req).await
}

/// Extract `(username, password)` from an `Authorization: Basic ...` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /healthz
async fn healthz(State(cache): State<Arc<StatsCache>>) -> impl IntoResponse {
    let body = cache.get_healthz().await;
    ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body)
}

/// GET /varz
async fn varz(State(cache): State<Arc<StatsCache>>) -> Response {
    let snapshot = cache.get_varz().await;
    match serde_json::to_string_pretty(&snapshot) {
        Ok(mut body) => {
            body.push('\n');
            ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to encode varz");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
