use std::time::Duration;

use shared::{
    domain::{ConnectionId, LobbyCode, PlayerId, PlayerSummary},
    protocol::{GameSettings, ServerEvent},
};
use tokio::{
    sync::{mpsc, watch},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    error::GameError,
    grid::{generate_grid, normalize_grid, MAX_GRID_SIZE, MIN_GRID_SIZE},
    lobby::{Lobby, Phase, Player, Seat, TickOutcome, MIN_WORD_LEN},
    registry::{LobbyHandle, LobbyRegistry},
    validator::{normalize, WordValidator},
};

pub const MAX_DURATION_SECONDS: u32 = 3600;
const MAX_NAME_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSession {
    pub lobby: LobbyCode,
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedWord {
    pub word: String,
    pub points: u32,
}

/// Authoritative per-lobby state machine. Every transition runs under the
/// lobby's own lock; dictionary lookups run with no lock held.
#[derive(Clone)]
pub struct SessionCoordinator {
    registry: LobbyRegistry,
    validator: WordValidator,
    tick_interval: Duration,
    finished: Option<mpsc::UnboundedSender<FinishedSession>>,
}

impl SessionCoordinator {
    pub fn new(registry: LobbyRegistry, validator: WordValidator) -> Self {
        Self {
            registry,
            validator,
            tick_interval: Duration::from_secs(1),
            finished: None,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_finished_sessions(mut self, finished: mpsc::UnboundedSender<FinishedSession>) -> Self {
        self.finished = Some(finished);
        self
    }

    pub fn registry(&self) -> &LobbyRegistry {
        &self.registry
    }

    pub async fn create_lobby(
        &self,
        player_id: PlayerId,
        display_name: &str,
        preferred_code: Option<&str>,
        seat: Seat,
    ) -> Result<LobbyCode, GameError> {
        let display_name = clean_name(display_name)?;
        let host = Player {
            id: player_id.clone(),
            display_name,
            score: 0,
            is_host: true,
            join_order: 1,
            seat,
        };
        let code = self.registry.create_lobby(host, preferred_code).await;
        let handle = self.registry.find(&code).await?;
        let lobby = handle.lock().await;
        lobby.send_to(
            &player_id,
            ServerEvent::LobbyJoined {
                lobby_id: code.clone(),
                player_id: player_id.clone(),
                players: lobby.roster(),
            },
        );
        info!(lobby = %code, player = %player_id, "lobby opened by host");
        Ok(code)
    }

    pub async fn join(
        &self,
        code: &LobbyCode,
        player_id: PlayerId,
        display_name: &str,
        seat: Seat,
    ) -> Result<(), GameError> {
        let display_name = clean_name(display_name)?;
        let handle = self.registry.find(code).await?;
        let mut lobby = handle.lock().await;
        // An empty lobby is already on its way out of the registry.
        if lobby.is_evicted() || lobby.is_empty() {
            return Err(GameError::LobbyNotFound);
        }

        if lobby.rebind(&player_id, display_name.clone(), seat.clone()) {
            info!(lobby = %code, player = %player_id, connection = %seat.connection, "player reconnected");
        } else {
            lobby.add_player(player_id.clone(), display_name, seat)?;
            info!(lobby = %code, player = %player_id, members = lobby.players().len(), "player joined");
        }

        let players = lobby.roster();
        lobby.send_to(
            &player_id,
            ServerEvent::LobbyJoined {
                lobby_id: code.clone(),
                player_id: player_id.clone(),
                players: players.clone(),
            },
        );
        lobby.broadcast(ServerEvent::PlayerJoined { players });
        if lobby.phase() == Phase::Active {
            if let Some(snapshot) = lobby.snapshot() {
                lobby.send_to(&player_id, ServerEvent::GameStarted(snapshot));
            }
        }
        Ok(())
    }

    /// Removes a player. With `connection` set the leave is ignored unless the
    /// player is still bound to that connection, so a disconnect that lost a
    /// race with a reconnect has no effect. Leaving twice is a no-op.
    pub async fn leave(&self, code: &LobbyCode, player_id: &PlayerId, connection: Option<ConnectionId>) {
        let Ok(handle) = self.registry.find(code).await else {
            debug!(lobby = %code, player = %player_id, "leave for unknown lobby ignored");
            return;
        };
        let now_empty = {
            let mut lobby = handle.lock().await;
            let previous_host = lobby.host().map(|p| p.id.clone());
            let Some(removed) = lobby.remove_player(player_id, connection) else {
                debug!(lobby = %code, player = %player_id, "stale or repeated leave ignored");
                return;
            };
            info!(lobby = %code, player = %removed.id, remaining = lobby.players().len(), "player left");
            if lobby.is_empty() {
                true
            } else {
                let new_host = lobby.host().map(|p| p.id.clone());
                if new_host != previous_host {
                    if let Some(host) = &new_host {
                        info!(lobby = %code, host = %host, "host reassigned");
                    }
                }
                lobby.broadcast(ServerEvent::PlayerLeft {
                    players: lobby.roster(),
                });
                false
            }
        };
        if now_empty {
            self.registry.remove_if_empty(code).await;
        }
    }

    pub async fn start_game(
        &self,
        code: &LobbyCode,
        player_id: &PlayerId,
        settings: GameSettings,
    ) -> Result<(), GameError> {
        self.begin_round(code, player_id, settings, &[Phase::Forming, Phase::Ended])
            .await
    }

    pub async fn play_again(
        &self,
        code: &LobbyCode,
        player_id: &PlayerId,
        settings: GameSettings,
    ) -> Result<(), GameError> {
        self.begin_round(code, player_id, settings, &[Phase::Ended])
            .await
    }

    pub async fn return_to_lobby(&self, code: &LobbyCode, player_id: &PlayerId) -> Result<(), GameError> {
        let handle = self.registry.find(code).await?;
        let mut lobby = handle.lock().await;
        ensure_host(&lobby, player_id)?;
        if lobby.phase() == Phase::Forming {
            return Err(GameError::WrongPhase);
        }
        lobby.clear_session();
        lobby.broadcast(ServerEvent::ReturnedToLobby {
            players: lobby.roster(),
        });
        info!(lobby = %code, "host returned lobby to forming");
        Ok(())
    }

    pub async fn submit_word(
        &self,
        code: &LobbyCode,
        player_id: &PlayerId,
        raw_word: &str,
    ) -> Result<AcceptedWord, GameError> {
        let word = normalize(raw_word);
        if word.chars().count() < MIN_WORD_LEN {
            return Err(GameError::WordTooShort { min: MIN_WORD_LEN });
        }
        let handle = self.registry.find(code).await?;
        let generation = handle.lock().await.check_submission(player_id, &word)?;

        if !self.validator.is_valid(&word).await {
            debug!(lobby = %code, player = %player_id, %word, "word rejected by dictionary");
            return Err(GameError::InvalidWord);
        }

        let mut lobby = handle.lock().await;
        let points = lobby.credit_word(player_id, &word, generation)?;
        lobby.broadcast(ServerEvent::WordSubmitted {
            player_id: player_id.clone(),
            word: word.clone(),
            score: points,
            players: lobby.roster(),
        });
        info!(lobby = %code, player = %player_id, %word, points, "word accepted");
        Ok(AcceptedWord { word, points })
    }

    async fn begin_round(
        &self,
        code: &LobbyCode,
        player_id: &PlayerId,
        settings: GameSettings,
        allowed: &[Phase],
    ) -> Result<(), GameError> {
        let handle = self.registry.find(code).await?;
        let mut lobby = handle.lock().await;
        ensure_host(&lobby, player_id)?;
        if !allowed.contains(&lobby.phase()) {
            return Err(GameError::WrongPhase);
        }

        let grid = match &settings.grid {
            Some(grid) => normalize_grid(grid, settings.grid_size).map_err(GameError::InvalidSettings)?,
            None => {
                if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&settings.grid_size) {
                    return Err(GameError::InvalidSettings(format!(
                        "grid size must be between {MIN_GRID_SIZE} and {MAX_GRID_SIZE}"
                    )));
                }
                generate_grid(settings.grid_size)
            }
        };
        if settings.game_duration == 0 || settings.game_duration > MAX_DURATION_SECONDS {
            return Err(GameError::InvalidSettings(format!(
                "game duration must be between 1 and {MAX_DURATION_SECONDS} seconds"
            )));
        }

        let (timer, cancelled) = watch::channel(false);
        let generation = lobby.begin_session(grid, settings.difficulty, settings.game_duration, timer);
        if let Some(snapshot) = lobby.snapshot() {
            lobby.broadcast(ServerEvent::GameStarted(snapshot));
        }
        info!(
            lobby = %code,
            generation,
            grid_size = settings.grid_size,
            difficulty = ?settings.difficulty,
            duration = settings.game_duration,
            "round started"
        );
        self.spawn_timer(handle.clone(), code.clone(), generation, cancelled);
        Ok(())
    }

    fn spawn_timer(
        &self,
        handle: LobbyHandle,
        code: LobbyCode,
        generation: u64,
        mut cancelled: watch::Receiver<bool>,
    ) {
        let period = self.tick_interval;
        let finished = self.finished.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = cancelled.changed() => {
                        debug!(lobby = %code, generation, "round timer cancelled");
                        return;
                    }
                }

                // The generation check under the lock is what makes
                // cancellation binding; the watch only ends the task early.
                let mut lobby = handle.lock().await;
                match lobby.tick(generation) {
                    TickOutcome::Stale => return,
                    TickOutcome::Running(remaining_seconds) => {
                        lobby.broadcast(ServerEvent::TimerTick { remaining_seconds });
                    }
                    TickOutcome::Expired => {
                        let players = lobby.roster();
                        lobby.broadcast(ServerEvent::TimeExpired {
                            remaining_seconds: 0,
                            is_active: false,
                            players: players.clone(),
                        });
                        info!(lobby = %code, generation, "round ran out of time");
                        if let Some(finished) = &finished {
                            if finished.send(FinishedSession { lobby: code.clone(), players }).is_err() {
                                warn!(lobby = %code, "finished-session listener is gone");
                            }
                        }
                        return;
                    }
                }
            }
        });
    }
}

fn ensure_host(lobby: &Lobby, player_id: &PlayerId) -> Result<(), GameError> {
    if lobby.is_evicted() {
        return Err(GameError::LobbyNotFound);
    }
    if lobby.is_host(player_id) {
        Ok(())
    } else {
        Err(GameError::NotHost)
    }
}

fn clean_name(raw: &str) -> Result<String, GameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(GameError::InvalidSettings("player name is required".into()));
    }
    Ok(name.chars().take(MAX_NAME_CHARS).collect())
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
