use lobby_core::{ConnectionBridge, FinishedSession};
use service_clients::AuthServiceClient;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Forwards every finished round to the auth service until the coordinator
/// drops its sender.
pub(crate) async fn report_finished_sessions(
    mut finished: mpsc::UnboundedReceiver<FinishedSession>,
    bridge: ConnectionBridge,
    auth: AuthServiceClient,
) {
    while let Some(session) = finished.recv().await {
        report_session(&bridge, &auth, &session).await;
    }
    debug!("finished-session channel closed; stats reporter stopping");
}

/// Posts each player's final score for players whose connection carried a
/// token. Returns how many updates the auth service accepted.
pub(crate) async fn report_session(
    bridge: &ConnectionBridge,
    auth: &AuthServiceClient,
    session: &FinishedSession,
) -> usize {
    let mut reported = 0;
    for player in &session.players {
        let Some(token) = bridge.auth_token(&session.lobby, &player.id).await else {
            continue;
        };
        match auth.update_stats(&token, player.score).await {
            Ok(stats) => {
                reported += 1;
                info!(
                    lobby = %session.lobby,
                    player = %player.id,
                    score = player.score,
                    games = stats.total_games_played,
                    best = stats.best_score,
                    "final score recorded"
                );
            }
            Err(error) => {
                warn!(lobby = %session.lobby, player = %player.id, %error, "failed to record final score");
            }
        }
    }
    reported
}

#[cfg(test)]
#[path = "tests/stats_tests.rs"]
mod tests;
