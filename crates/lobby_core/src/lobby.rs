use std::collections::HashSet;

use shared::{
    domain::{ConnectionId, Difficulty, Grid, LobbyCode, PlayerId, PlayerSummary, SessionSnapshot},
    protocol::ServerEvent,
};
use tokio::sync::{mpsc, watch};

use crate::{error::GameError, grid::letters_available};

pub const MAX_PLAYERS: usize = 8;
pub const MIN_WORD_LEN: usize = 3;
pub const POINTS_PER_LETTER: u32 = 10;

#[derive(Debug, Clone)]
pub struct Outbox(mpsc::UnboundedSender<ServerEvent>);

impl Outbox {
    pub fn new(tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self(tx)
    }

    pub fn send(&self, event: ServerEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct Seat {
    pub connection: ConnectionId,
    pub outbox: Outbox,
}

impl Seat {
    pub fn new(connection: ConnectionId, outbox: Outbox) -> Self {
        Self { connection, outbox }
    }
}

#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub score: u32,
    pub is_host: bool,
    pub join_order: u32,
    pub seat: Seat,
}

impl Player {
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            score: self.score,
            is_host: self.is_host,
            join_order: self.join_order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Forming,
    Active,
    Ended,
}

#[derive(Debug)]
pub struct GameSession {
    pub grid: Grid,
    pub difficulty: Difficulty,
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    pub is_active: bool,
    pub generation: u64,
    found_words: HashSet<(PlayerId, String)>,
    timer: Option<watch::Sender<bool>>,
}

impl GameSession {
    pub fn has_found(&self, player: &PlayerId, word: &str) -> bool {
        self.found_words.contains(&(player.clone(), word.to_string()))
    }

    pub fn found_count(&self) -> usize {
        self.found_words.len()
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            let _ = timer.send(true);
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

pub(crate) enum TickOutcome {
    /// The timer belongs to a session that is gone, replaced or already over.
    Stale,
    Running(u32),
    Expired,
}

#[derive(Debug)]
pub struct Lobby {
    code: LobbyCode,
    players: Vec<Player>,
    session: Option<GameSession>,
    next_join_order: u32,
    generation: u64,
    evicted: bool,
}

impl Lobby {
    pub(crate) fn new(code: LobbyCode, mut host: Player) -> Self {
        host.is_host = true;
        host.join_order = 1;
        Self {
            code,
            players: vec![host],
            session: None,
            next_join_order: 2,
            generation: 0,
            evicted: false,
        }
    }

    pub fn code(&self) -> &LobbyCode {
        &self.code
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.is_host)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Phase {
        match &self.session {
            None => Phase::Forming,
            Some(session) if session.is_active => Phase::Active,
            Some(_) => Phase::Ended,
        }
    }

    pub fn roster(&self) -> Vec<PlayerSummary> {
        self.players.iter().map(Player::summary).collect()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|session| SessionSnapshot {
            grid: session.grid.clone(),
            grid_size: session.grid.len(),
            difficulty: session.difficulty,
            duration_seconds: session.duration_seconds,
            remaining_seconds: session.remaining_seconds,
            is_active: session.is_active,
            players: self.roster(),
        })
    }

    pub(crate) fn mark_evicted(&mut self) {
        self.evicted = true;
        self.session = None;
    }

    pub(crate) fn add_player(
        &mut self,
        id: PlayerId,
        display_name: String,
        seat: Seat,
    ) -> Result<(), GameError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::LobbyFull);
        }
        let join_order = self.next_join_order;
        self.next_join_order += 1;
        let is_host = self.players.is_empty();
        self.players.push(Player {
            id,
            display_name,
            score: 0,
            is_host,
            join_order,
            seat,
        });
        Ok(())
    }

    pub(crate) fn rebind(&mut self, id: &PlayerId, display_name: String, seat: Seat) -> bool {
        match self.players.iter_mut().find(|p| &p.id == id) {
            Some(player) => {
                player.display_name = display_name;
                player.seat = seat;
                true
            }
            None => false,
        }
    }

    /// Removes a player and hands the host flag to the earliest remaining
    /// joiner when needed. With `connection` set, the removal only happens if
    /// the player is still bound to that connection.
    pub(crate) fn remove_player(
        &mut self,
        id: &PlayerId,
        connection: Option<ConnectionId>,
    ) -> Option<Player> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        if connection.is_some_and(|c| self.players[index].seat.connection != c) {
            return None;
        }
        let removed = self.players.remove(index);
        if removed.is_host {
            if let Some(next) = self.players.iter_mut().min_by_key(|p| p.join_order) {
                next.is_host = true;
            }
        }
        if self.players.is_empty() {
            self.session = None;
        }
        Some(removed)
    }

    pub(crate) fn begin_session(
        &mut self,
        grid: Grid,
        difficulty: Difficulty,
        duration_seconds: u32,
        timer: watch::Sender<bool>,
    ) -> u64 {
        self.generation += 1;
        for player in &mut self.players {
            player.score = 0;
        }
        self.session = Some(GameSession {
            grid,
            difficulty,
            duration_seconds,
            remaining_seconds: duration_seconds,
            is_active: true,
            generation: self.generation,
            found_words: HashSet::new(),
            timer: Some(timer),
        });
        self.generation
    }

    pub(crate) fn clear_session(&mut self) {
        self.session = None;
    }

    pub(crate) fn tick(&mut self, generation: u64) -> TickOutcome {
        if self.evicted {
            return TickOutcome::Stale;
        }
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Stale;
        };
        if session.generation != generation || !session.is_active {
            return TickOutcome::Stale;
        }
        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        if session.remaining_seconds > 0 {
            return TickOutcome::Running(session.remaining_seconds);
        }
        session.is_active = false;
        session.timer = None;
        TickOutcome::Expired
    }

    /// Pre-validation gate for a submission. Returns the generation of the
    /// session the word was checked against.
    pub(crate) fn check_submission(&self, player: &PlayerId, word: &str) -> Result<u64, GameError> {
        if self.evicted {
            return Err(GameError::LobbyNotFound);
        }
        if self.player(player).is_none() {
            return Err(GameError::NotInLobby);
        }
        let session = match &self.session {
            Some(session) if session.is_active => session,
            _ => return Err(GameError::WrongPhase),
        };
        if !letters_available(&session.grid, word) {
            return Err(GameError::LettersUnavailable);
        }
        if session.has_found(player, word) {
            return Err(GameError::DuplicateWord);
        }
        Ok(session.generation)
    }

    pub(crate) fn credit_word(
        &mut self,
        player: &PlayerId,
        word: &str,
        generation: u64,
    ) -> Result<u32, GameError> {
        if self.evicted {
            return Err(GameError::LobbyNotFound);
        }
        let session = match self.session.as_mut() {
            Some(session) if session.is_active && session.generation == generation => session,
            _ => return Err(GameError::WrongPhase),
        };
        let Some(member) = self.players.iter_mut().find(|p| &p.id == player) else {
            return Err(GameError::NotInLobby);
        };
        if !session.found_words.insert((player.clone(), word.to_string())) {
            return Err(GameError::DuplicateWord);
        }
        let points = word.chars().count() as u32 * POINTS_PER_LETTER;
        member.score += points;
        Ok(points)
    }

    pub(crate) fn broadcast(&self, event: ServerEvent) {
        for player in &self.players {
            player.seat.outbox.send(event.clone());
        }
    }

    pub(crate) fn send_to(&self, player: &PlayerId, event: ServerEvent) {
        if let Some(player) = self.player(player) {
            player.seat.outbox.send(event);
        }
    }
}

#[cfg(test)]
#[path = "tests/lobby_tests.rs"]
mod tests;
