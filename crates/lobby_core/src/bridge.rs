use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::{
    domain::{ConnectionId, LobbyCode, PlayerId},
    error::{ApiError, ErrorCode},
    protocol::{ClientRequest, ServerEvent},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    coordinator::SessionCoordinator,
    error::GameError,
    lobby::{Outbox, Seat},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub lobby: LobbyCode,
    pub player: PlayerId,
}

struct Connection {
    outbox: Outbox,
    auth_token: Option<String>,
    binding: Option<Binding>,
}

/// Maps transport connections onto `(lobby, player)` pairs and turns their
/// requests into coordinator intents.
#[derive(Clone)]
pub struct ConnectionBridge {
    coordinator: SessionCoordinator,
    connections: Arc<Mutex<HashMap<ConnectionId, Connection>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionBridge {
    pub fn new(coordinator: SessionCoordinator) -> Self {
        Self {
            coordinator,
            connections: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub async fn connect(&self, outbox: Outbox, auth_token: Option<String>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.connections.lock().await.insert(
            id,
            Connection {
                outbox,
                auth_token,
                binding: None,
            },
        );
        debug!(connection = %id, "connection registered");
        id
    }

    pub async fn binding(&self, connection: ConnectionId) -> Option<Binding> {
        self.connections
            .lock()
            .await
            .get(&connection)
            .and_then(|c| c.binding.clone())
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Bearer token supplied by whichever connection currently plays `player` in `lobby`.
    pub async fn auth_token(&self, lobby: &LobbyCode, player: &PlayerId) -> Option<String> {
        self.connections
            .lock()
            .await
            .values()
            .find(|c| {
                c.binding
                    .as_ref()
                    .is_some_and(|b| &b.lobby == lobby && &b.player == player)
            })
            .and_then(|c| c.auth_token.clone())
    }

    pub async fn handle(&self, connection: ConnectionId, request: ClientRequest) {
        let submitted_word = match &request {
            ClientRequest::SubmitWord { word, .. } => Some(word.clone()),
            _ => None,
        };
        if let Err(error) = self.dispatch(connection, request).await {
            self.report(connection, error, submitted_word).await;
        }
    }

    /// Tells a connection its frame could not be understood.
    pub async fn reject_malformed(&self, connection: ConnectionId, detail: &str) {
        debug!(connection = %connection, detail, "malformed frame dropped");
        self.send(
            connection,
            ServerEvent::Error(ApiError::new(
                ErrorCode::Validation,
                format!("malformed message: {detail}"),
            )),
        )
        .await;
    }

    /// Turns a vanished connection into a leave for whatever it was bound to.
    /// Safe to call more than once.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let removed = self.connections.lock().await.remove(&connection);
        let Some(removed) = removed else {
            return;
        };
        if let Some(binding) = removed.binding {
            info!(
                connection = %connection,
                lobby = %binding.lobby,
                player = %binding.player,
                "connection dropped; leaving lobby"
            );
            self.coordinator
                .leave(&binding.lobby, &binding.player, Some(connection))
                .await;
        }
    }

    async fn dispatch(&self, connection: ConnectionId, request: ClientRequest) -> Result<(), GameError> {
        match request {
            ClientRequest::CreateLobby {
                player_name,
                lobby_id,
                player_id,
            } => {
                let seat = self.seat(connection).await?;
                let code = self
                    .coordinator
                    .create_lobby(player_id.clone(), &player_name, lobby_id.as_deref(), seat)
                    .await?;
                self.rebind(connection, Binding { lobby: code, player: player_id })
                    .await;
            }
            ClientRequest::JoinLobby {
                lobby_id,
                player_name,
                player_id,
            } => {
                let seat = self.seat(connection).await?;
                let code = LobbyCode::normalized(&lobby_id);
                self.coordinator
                    .join(&code, player_id.clone(), &player_name, seat)
                    .await?;
                self.rebind(connection, Binding { lobby: code, player: player_id })
                    .await;
            }
            ClientRequest::StartGame(settings) => {
                let bound = self.bound(connection).await?;
                self.coordinator
                    .start_game(&bound.lobby, &bound.player, settings)
                    .await?;
            }
            ClientRequest::PlayAgain(settings) => {
                let bound = self.bound(connection).await?;
                self.coordinator
                    .play_again(&bound.lobby, &bound.player, settings)
                    .await?;
            }
            ClientRequest::ReturnToLobby {} => {
                let bound = self.bound(connection).await?;
                self.coordinator
                    .return_to_lobby(&bound.lobby, &bound.player)
                    .await?;
            }
            ClientRequest::SubmitWord { word, .. } => {
                let bound = self.bound(connection).await?;
                self.coordinator
                    .submit_word(&bound.lobby, &bound.player, &word)
                    .await?;
            }
            ClientRequest::LeaveLobby {} => {
                let previous = self.take_binding(connection).await;
                if let Some(previous) = previous {
                    self.coordinator
                        .leave(&previous.lobby, &previous.player, Some(connection))
                        .await;
                }
            }
        }
        Ok(())
    }

    async fn report(&self, connection: ConnectionId, error: GameError, submitted_word: Option<String>) {
        match submitted_word {
            Some(word) if error.is_word_rejection() => {
                debug!(connection = %connection, %word, %error, "word rejected");
                self.send(
                    connection,
                    ServerEvent::WordRejected {
                        word,
                        reason: error.to_string(),
                    },
                )
                .await;
            }
            _ if error.is_silent() => {
                debug!(connection = %connection, %error, "intent ignored");
            }
            _ => {
                debug!(connection = %connection, %error, "intent rejected");
                self.send(connection, ServerEvent::Error(error.into())).await;
            }
        }
    }

    async fn send(&self, connection: ConnectionId, event: ServerEvent) {
        if let Some(c) = self.connections.lock().await.get(&connection) {
            c.outbox.send(event);
        }
    }

    async fn seat(&self, connection: ConnectionId) -> Result<Seat, GameError> {
        self.connections
            .lock()
            .await
            .get(&connection)
            .map(|c| Seat::new(connection, c.outbox.clone()))
            .ok_or(GameError::NotInLobby)
    }

    async fn bound(&self, connection: ConnectionId) -> Result<Binding, GameError> {
        self.binding(connection).await.ok_or(GameError::NotInLobby)
    }

    async fn take_binding(&self, connection: ConnectionId) -> Option<Binding> {
        self.connections
            .lock()
            .await
            .get_mut(&connection)
            .and_then(|c| c.binding.take())
    }

    /// Records the new binding and leaves whatever the connection was playing before.
    /// Any other connection still bound to the same seat loses its binding.
    async fn rebind(&self, connection: ConnectionId, binding: Binding) {
        let previous = {
            let mut connections = self.connections.lock().await;
            for (id, other) in connections.iter_mut() {
                if *id != connection && other.binding.as_ref() == Some(&binding) {
                    other.binding = None;
                    debug!(connection = %id, lobby = %binding.lobby, player = %binding.player, "superseded binding cleared");
                }
            }
            match connections.get_mut(&connection) {
                Some(c) => c.binding.replace(binding.clone()),
                None => None,
            }
        };
        if let Some(previous) = previous.filter(|p| p != &binding) {
            self.coordinator
                .leave(&previous.lobby, &previous.player, Some(connection))
                .await;
        }
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
