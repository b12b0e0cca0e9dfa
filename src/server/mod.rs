//! HTTP routing and the login handler.

use std::sync::Arc;

use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::core::{PlayerRecord, Result};
use crate::storage::PlayerStore;
use crate::token::TokenSigner;
use crate::web::{ApiFailure, HEADER_DEVICE_ID, HEADER_REQ_ID, success};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PlayerStore>,
    pub tokens: Arc<TokenSigner>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginData {
    token: String,
    player: PlayerRecord,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/player/login", post(login).fallback(wrong_method))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the store and signer from configuration and serve forever.
///
/// Store initialization failures propagate out and abort startup: the
/// service never runs without its backing file.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(PlayerStore::open(
        config.player_list_path(),
        config.allocator(),
    )?);
    let tokens = Arc::new(
        TokenSigner::new(&config.token_secret).with_ttl_secs(config.token_ttl_secs),
    );
    let app = router(AppState { store, tokens });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("player login server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> &'static str {
    "playerdb is running. POST /player/login with Device-ID and Req-ID headers to sign in.\n"
}

async fn wrong_method(headers: HeaderMap) -> Response {
    ApiFailure::wrong_method()
        .with_req_id(header_value(&headers, HEADER_REQ_ID))
        .into_response()
}

async fn login(State(state): State<AppState>, request: Request) -> Response {
    let req_id = header_value(request.headers(), HEADER_REQ_ID);
    let device_id = header_value(request.headers(), HEADER_DEVICE_ID);
    let (req_id, device_id) = match (req_id, device_id) {
        (Some(req_id), Some(device_id)) => (req_id, device_id),
        (req_id, _) => {
            return ApiFailure::missing_headers()
                .with_req_id(req_id)
                .into_response();
        }
    };

    let bytes = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to read login body for device {device_id}: {err}");
            return ApiFailure::body_read()
                .with_req_id(Some(req_id))
                .into_response();
        }
    };

    // An empty body is the device-id-only login variant.
    let username = if bytes.is_empty() {
        None
    } else {
        match serde_json::from_slice::<LoginRequest>(&bytes) {
            Ok(parsed) => parsed.username,
            Err(err) => {
                warn!("malformed login body for device {device_id}: {err}");
                return ApiFailure::bad_body()
                    .with_req_id(Some(req_id))
                    .into_response();
            }
        }
    };

    let player = match resolve_player(&state.store, username.as_deref(), &device_id) {
        Ok(player) => player,
        Err(err) => {
            error!("login failed for device {device_id}: {err}");
            return ApiFailure::from(err)
                .with_req_id(Some(req_id))
                .into_response();
        }
    };

    match state.tokens.issue(&player.id) {
        Ok(token) => success(&req_id, LoginData { token, player }),
        Err(err) => {
            error!("token issuance failed for player {}: {err}", player.id);
            ApiFailure::from(err)
                .with_req_id(Some(req_id))
                .into_response()
        }
    }
}

/// Resolve a device to its player: touch the existing record or create one.
///
/// Two concurrent first logins may both miss the find; the store's `create`
/// holds the write lock for its whole check-then-act, so the loser of that
/// race resolves to the winner's record instead of creating a duplicate.
fn resolve_player(
    store: &PlayerStore,
    username: Option<&str>,
    device_id: &str,
) -> Result<PlayerRecord> {
    if let Some(existing) = store.find_by_user_id(device_id)? {
        store.update_last_login(&existing.id)?;
        return Ok(store.find_by_user_id(&existing.id)?.unwrap_or(existing));
    }
    store.create(username, device_id)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
