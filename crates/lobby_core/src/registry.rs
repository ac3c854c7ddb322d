use std::{collections::HashMap, sync::Arc};

use rand::Rng;
use shared::domain::LobbyCode;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{
    error::GameError,
    lobby::{Lobby, Player},
};

pub const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MIN_REQUESTED_CODE_LEN: usize = 4;
const MAX_REQUESTED_CODE_LEN: usize = 12;

pub type LobbyHandle = Arc<Mutex<Lobby>>;

/// Owns every live lobby. The map lock is only held to look up, insert or
/// remove entries; lobby state is guarded by each lobby's own mutex, and the
/// map lock is always taken before a lobby lock.
#[derive(Clone, Default)]
pub struct LobbyRegistry {
    lobbies: Arc<RwLock<HashMap<LobbyCode, LobbyHandle>>>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_lobby(&self, host: Player, preferred: Option<&str>) -> LobbyCode {
        let mut lobbies = self.lobbies.write().await;
        let code = match preferred
            .map(LobbyCode::normalized)
            .filter(|code| is_well_formed(code) && !lobbies.contains_key(code))
        {
            Some(code) => code,
            None => loop {
                let candidate = random_code();
                if !lobbies.contains_key(&candidate) {
                    break candidate;
                }
                debug!(code = %candidate, "lobby code collision; regenerating");
            },
        };
        lobbies.insert(code.clone(), Arc::new(Mutex::new(Lobby::new(code.clone(), host))));
        info!(lobby = %code, live = lobbies.len(), "lobby created");
        code
    }

    pub async fn find(&self, code: &LobbyCode) -> Result<LobbyHandle, GameError> {
        self.lobbies
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(GameError::LobbyNotFound)
    }

    /// Deletes the lobby iff it has no players left. Absent codes are a no-op.
    pub async fn remove_if_empty(&self, code: &LobbyCode) -> bool {
        let mut lobbies = self.lobbies.write().await;
        let Some(handle) = lobbies.get(code).cloned() else {
            return false;
        };
        let mut lobby = handle.lock().await;
        if !lobby.is_empty() {
            return false;
        }
        lobby.mark_evicted();
        lobbies.remove(code);
        info!(lobby = %code, live = lobbies.len(), "empty lobby evicted");
        true
    }

    pub async fn len(&self) -> usize {
        self.lobbies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lobbies.read().await.is_empty()
    }

    pub async fn codes(&self) -> Vec<LobbyCode> {
        let mut codes: Vec<LobbyCode> = self.lobbies.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }
}

fn is_well_formed(code: &LobbyCode) -> bool {
    let len = code.as_str().len();
    (MIN_REQUESTED_CODE_LEN..=MAX_REQUESTED_CODE_LEN).contains(&len)
        && code.as_str().bytes().all(|b| b.is_ascii_alphanumeric())
}

fn random_code() -> LobbyCode {
    let mut rng = rand::thread_rng();
    let code = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    LobbyCode(code)
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
