use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use lobby_core::{ConnectionBridge, LobbyRegistry, Outbox, SessionCoordinator, WordValidator};
use serde::{Deserialize, Serialize};
use service_clients::{AuthServiceClient, DictionaryApiClient};
use shared::{domain::ConnectionId, protocol::ClientRequest};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod stats;

use app_state::AppState;
use config::load_settings;

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LobbyCountResponse {
    lobbies: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let dictionary = DictionaryApiClient::new(&settings.dictionary_url, settings.dictionary_timeout())?;
    let validator = WordValidator::new(Arc::new(dictionary)).with_timeout(settings.dictionary_timeout());
    let mut coordinator = SessionCoordinator::new(LobbyRegistry::new(), validator);

    let auth = settings
        .auth_service_url
        .as_deref()
        .map(|url| AuthServiceClient::new(url, settings.auth_timeout()))
        .transpose()?;
    let finished = match &auth {
        Some(_) => {
            let (tx, rx) = mpsc::unbounded_channel();
            coordinator = coordinator.with_finished_sessions(tx);
            Some(rx)
        }
        None => None,
    };

    let bridge = ConnectionBridge::new(coordinator);
    if let (Some(auth), Some(finished)) = (auth.clone(), finished) {
        info!(auth_service = auth.base_url(), "final scores will be reported");
        tokio::spawn(stats::report_finished_sessions(finished, bridge.clone(), auth));
    } else {
        info!("no auth service configured; final scores stay local");
    }

    let app = build_router(Arc::new(AppState { bridge, auth }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, dictionary = %settings.dictionary_url, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/lobbies/count", get(lobby_count))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn lobby_count(State(state): State<Arc<AppState>>) -> Json<LobbyCountResponse> {
    let lobbies = state.bridge.coordinator().registry().len().await;
    Json(LobbyCountResponse { lobbies })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(q): Query<WsQuery>,
) -> impl IntoResponse {
    let token = verified_token(&state, q.token).await;
    ws.on_upgrade(move |socket| ws_connection(state, socket, token))
}

/// Keeps a `?token=` only if the auth service vouches for it. Without an
/// auth service there is nothing to report to, so the token is dropped.
async fn verified_token(state: &AppState, token: Option<String>) -> Option<String> {
    let token = token.filter(|t| !t.trim().is_empty())?;
    let auth = state.auth.as_ref()?;
    match auth.me(&token).await {
        Ok(user) => {
            debug!(user = %user.username, "websocket token accepted");
            Some(token)
        }
        Err(error) => {
            warn!(%error, "websocket token rejected; playing as guest");
            None
        }
    }
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket, token: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut outbox_rx) = mpsc::unbounded_channel();
    let connection = state.bridge.connect(Outbox::new(tx), token).await;
    info!(%connection, "websocket connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(error) => {
                    warn!(%connection, %error, "failed to encode server event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => handle_text(&state.bridge, connection, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.bridge.disconnect(connection).await;
    send_task.abort();
    info!(%connection, "websocket closed");
}

async fn handle_text(bridge: &ConnectionBridge, connection: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientRequest>(text) {
        Ok(request) => bridge.handle(connection, request).await,
        Err(error) => bridge.reject_malformed(connection, &error.to_string()).await,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
