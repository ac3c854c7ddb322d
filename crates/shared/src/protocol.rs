use serde::{Deserialize, Serialize};

use crate::{
    domain::{Difficulty, Grid, LobbyCode, PlayerId, PlayerSummary, SessionSnapshot},
    error::ApiError,
};

/// Host-chosen settings for a round, shared by `startGame` and `playAgain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Grid produced by the host's client. When absent the server generates one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    pub grid_size: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub game_duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientRequest {
    #[serde(rename_all = "camelCase")]
    CreateLobby {
        player_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lobby_id: Option<String>,
        player_id: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    JoinLobby {
        lobby_id: String,
        player_name: String,
        player_id: PlayerId,
    },
    StartGame(GameSettings),
    SubmitWord {
        word: String,
        /// Client-computed score; the server recomputes and ignores it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<u32>,
    },
    LeaveLobby {},
    ReturnToLobby {},
    PlayAgain(GameSettings),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    LobbyJoined {
        lobby_id: LobbyCode,
        player_id: PlayerId,
        players: Vec<PlayerSummary>,
    },
    PlayerJoined {
        players: Vec<PlayerSummary>,
    },
    PlayerLeft {
        players: Vec<PlayerSummary>,
    },
    GameStarted(SessionSnapshot),
    #[serde(rename_all = "camelCase")]
    TimerTick {
        remaining_seconds: u32,
    },
    #[serde(rename_all = "camelCase")]
    TimeExpired {
        remaining_seconds: u32,
        is_active: bool,
        players: Vec<PlayerSummary>,
    },
    #[serde(rename_all = "camelCase")]
    WordSubmitted {
        player_id: PlayerId,
        word: String,
        score: u32,
        players: Vec<PlayerSummary>,
    },
    WordRejected {
        word: String,
        reason: String,
    },
    ReturnedToLobby {
        players: Vec<PlayerSummary>,
    },
    Error(ApiError),
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
