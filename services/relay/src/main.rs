mod config;
mod proxy;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::ws::{WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;

#[derive(serde::Deserialize)]
struct SessionQuery {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(serde::Deserialize)]
struct TokenRequest {
    user_id: String,
    session_id: String,
}

#[derive(serde::Serialize)]
struct SessionGrant {
    relay_url: String,
    model: String,
    expires_at: u64,
}

/// Issues a session grant: the relay's own address and model binding, with
/// an expiry. The upstream credential is never part of the response.
async fn token_handler(
    State(config): State<Arc<Config>>,
    Json(request): Json<TokenRequest>,
) -> Json<SessionGrant> {
    info!(
        user = %request.user_id,
        session = %request.session_id,
        "issuing session grant"
    );
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Json(SessionGrant {
        relay_url: config.advertised_url.clone(),
        model: config.model.clone(),
        expires_at: now + config.token_ttl_secs,
    })
}

/// Handles WebSocket upgrade requests for relayed sessions.
async fn ws_handler(
    State(config): State<Arc<Config>>,
    Query(query): Query<SessionQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let session_id = query.session_id.unwrap_or_else(|| "anonymous".to_string());
    info!(session = %session_id, "WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, config, session_id))
}

/// Dials upstream with the credential attached, then pumps both legs until
/// either side closes or errors; the pair is torn down together.
async fn handle_socket(client: WebSocket, config: Arc<Config>, session_id: String) {
    let request = match proxy::build_upstream_request(&config) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(session = %session_id, "failed to build upstream request: {}", e);
            return;
        }
    };

    let upstream = match tokio_tungstenite::connect_async(request).await {
        Ok((upstream, _)) => upstream,
        Err(e) => {
            tracing::error!(session = %session_id, "upstream connect failed: {}", e);
            return;
        }
    };

    info!(session = %session_id, "relay session established");
    proxy::proxy_session(client, upstream, config.queue_depth).await;
    info!(session = %session_id, "relay session ended");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // A permissive CORS policy so a separate frontend can reach the token
    // endpoint and upgrade the WebSocket.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let bind_address = config.bind_address;
    let app = Router::new()
        .route("/session", get(ws_handler))
        .route("/token", post(token_handler))
        .layer(cors)
        .with_state(Arc::new(config));

    info!("Starting relay, listening on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
