//! quill-gateway - reverse proxy with verified identity injection.
//!
//! Forwards `/api/auth/*` verbatim and `/api/notes/*` with authentication:
//! the bearer token is verified locally against the shared `TOKEN_SECRET`,
//! and the verified subject is attached as `x-user-id` for the upstream.
//! Any client-supplied `x-user-id` is discarded; identity only ever comes
//! from the token.
//!
//! The proxy relays method, path, query string, body, and response
//! status/body untouched. There are no retries and no circuit breaking; an
//! unreachable upstream is a 502.

use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use quill_auth::{bearer_token, Claims, JwtKeys};
use quill_core::{defaults, Result};

/// Header carrying the verified user id to upstreams.
pub const USER_ID_HEADER: &str = "x-user-id";

// =============================================================================
// STATE & CONFIGURATION
// =============================================================================

/// Shared gateway state: one HTTP client, the token keys, and upstream URLs.
#[derive(Clone)]
pub struct GatewayState {
    client: reqwest::Client,
    keys: JwtKeys,
    auth_upstream: String,
    notes_upstream: String,
}

impl GatewayState {
    /// Build state with explicit configuration.
    pub fn new(
        keys: JwtKeys,
        auth_upstream: String,
        notes_upstream: String,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            keys,
            auth_upstream: auth_upstream.trim_end_matches('/').to_string(),
            notes_upstream: notes_upstream.trim_end_matches('/').to_string(),
        }
    }

    /// Build state from the environment.
    ///
    /// `TOKEN_SECRET` is required (shared with the API so both sides agree on
    /// token validity). `GATEWAY_AUTH_UPSTREAM` and `GATEWAY_NOTES_UPSTREAM`
    /// default to the primary backend; `GATEWAY_TIMEOUT_SECS` defaults to 10.
    pub fn from_env() -> Result<Self> {
        let keys = JwtKeys::from_env()?;
        let auth_upstream = std::env::var("GATEWAY_AUTH_UPSTREAM")
            .unwrap_or_else(|_| defaults::GATEWAY_UPSTREAM_URL.to_string());
        let notes_upstream = std::env::var("GATEWAY_NOTES_UPSTREAM")
            .unwrap_or_else(|_| defaults::GATEWAY_UPSTREAM_URL.to_string());
        let timeout_secs = std::env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GATEWAY_TIMEOUT_SECS);

        info!(
            auth_upstream = %auth_upstream,
            notes_upstream = %notes_upstream,
            timeout_secs,
            "Gateway configured"
        );

        Ok(Self::new(keys, auth_upstream, notes_upstream, timeout_secs))
    }

    /// Auth upstream base URL.
    pub fn auth_upstream(&self) -> &str {
        &self.auth_upstream
    }

    /// Notes upstream base URL.
    pub fn notes_upstream(&self) -> &str {
        &self.notes_upstream
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors the gateway produces itself. Upstream-origin errors are relayed
/// as-is and never pass through this type.
#[derive(Debug)]
pub enum GatewayError {
    /// Missing or invalid bearer token.
    Unauthorized(String),
    /// The inbound request could not be read.
    BadRequest(String),
    /// The upstream could not be reached or did not answer.
    BadGateway(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            GatewayError::BadGateway(msg) => {
                warn!(error = %msg, "Upstream failure");
                (StatusCode::BAD_GATEWAY, msg)
            }
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

// =============================================================================
// PROXY CORE
// =============================================================================

/// Hop-by-hop headers (RFC 7230 section 6.1). Meaningful only for a single
/// connection, so a proxy must not relay them in either direction.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Verify the bearer token on an inbound request.
fn authenticate(state: &GatewayState, headers: &HeaderMap) -> std::result::Result<Claims, GatewayError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| GatewayError::Unauthorized("missing authorization header".to_string()))?;

    let token = bearer_token(header)
        .ok_or_else(|| GatewayError::Unauthorized("expected a bearer token".to_string()))?;

    state
        .keys
        .verify(token)
        .map_err(|e| GatewayError::Unauthorized(e.to_string()))
}

/// Relay a request to `upstream`, optionally attaching a verified identity.
///
/// The full path and query string carry over unchanged. Hop-by-hop headers,
/// `host`, `content-length`, and any inbound `x-user-id` are dropped before
/// forwarding; the response comes back with its status, headers, and body
/// intact apart from the same hop-by-hop filtering.
async fn forward(
    state: &GatewayState,
    upstream: &str,
    req: Request,
    user_id: Option<uuid::Uuid>,
) -> std::result::Result<Response, GatewayError> {
    let (parts, body) = req.into_parts();

    let bytes = axum::body::to_bytes(body, defaults::MAX_BODY_SIZE_BYTES)
        .await
        .map_err(|e| GatewayError::BadRequest(format!("failed to read request body: {}", e)))?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let url = format!("{}{}", upstream, path_and_query);

    let mut headers = HeaderMap::new();
    for (name, value) in parts.headers.iter() {
        if is_hop_by_hop(name)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || name.as_str() == USER_ID_HEADER
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if let Some(id) = user_id {
        // A hyphenated UUID is always a valid header value.
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
    }

    let upstream_response = state
        .client
        .request(parts.method.clone(), &url)
        .headers(headers)
        .body(bytes)
        .send()
        .await
        .map_err(|e| GatewayError::BadGateway(format!("upstream request failed: {}", e)))?;

    let status = upstream_response.status();
    // append, not insert: repeated names like set-cookie must all survive
    let mut response_headers = HeaderMap::new();
    for (name, value) in upstream_response.headers().iter() {
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        response_headers.append(name.clone(), value.clone());
    }

    let response_body = upstream_response.bytes().await.map_err(|e| {
        GatewayError::BadGateway(format!("failed to read upstream response: {}", e))
    })?;

    tracing::debug!(
        method = %parts.method,
        path = %parts.uri.path(),
        status = %status,
        "Forwarded"
    );

    let mut response = Response::new(Body::from(response_body));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Forward `/api/auth/*` without verification; register and login have no
/// token yet.
pub async fn forward_auth(
    State(state): State<GatewayState>,
    req: Request,
) -> std::result::Result<Response, GatewayError> {
    forward(&state, &state.auth_upstream, req, None).await
}

/// Forward `/api/notes/*` with the verified subject as `x-user-id`.
pub async fn forward_notes(
    State(state): State<GatewayState>,
    req: Request,
) -> std::result::Result<Response, GatewayError> {
    let claims = authenticate(&state, req.headers())?;
    forward(&state, &state.notes_upstream, req, Some(claims.sub)).await
}

/// Gateway liveness. Reports the configured upstreams without probing them.
pub async fn health_check(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "upstreams": {
            "auth": state.auth_upstream,
            "notes": state.notes_upstream,
        }
    }))
}

/// Build the gateway router.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/*path", any(forward_auth))
        .route("/api/notes/*path", any(forward_notes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
