use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Lobby not found")]
    LobbyNotFound,
    #[error("Lobby is full")]
    LobbyFull,
    #[error("only the host can do that")]
    NotHost,
    #[error("not allowed in the current phase")]
    WrongPhase,
    #[error("you are not in a lobby")]
    NotInLobby,
    #[error("{0}")]
    InvalidSettings(String),
    #[error("words need at least {min} letters")]
    WordTooShort { min: usize },
    #[error("letters are not available in the grid")]
    LettersUnavailable,
    #[error("already found")]
    DuplicateWord,
    #[error("not a valid word")]
    InvalidWord,
}

impl GameError {
    /// Errors that are expected under normal UI races and are dropped without a reply.
    pub fn is_silent(&self) -> bool {
        matches!(self, GameError::NotHost | GameError::WrongPhase)
    }

    /// Rejections that only concern the submitting player's word.
    pub fn is_word_rejection(&self) -> bool {
        matches!(
            self,
            GameError::WordTooShort { .. }
                | GameError::LettersUnavailable
                | GameError::DuplicateWord
                | GameError::InvalidWord
                | GameError::WrongPhase
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::LobbyNotFound => ErrorCode::NotFound,
            GameError::LobbyFull | GameError::DuplicateWord => ErrorCode::Conflict,
            GameError::NotHost => ErrorCode::Forbidden,
            GameError::WrongPhase
            | GameError::NotInLobby
            | GameError::InvalidSettings(_)
            | GameError::WordTooShort { .. }
            | GameError::LettersUnavailable
            | GameError::InvalidWord => ErrorCode::Validation,
        }
    }
}

impl From<GameError> for ApiError {
    fn from(value: GameError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}
