use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub total_games_played: u32,
    pub total_score: u64,
    pub best_score: u32,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: AuthUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatsRequest {
    game_score: u32,
}

#[derive(Debug, Deserialize)]
struct UpdateStatsResponse {
    stats: PlayerStats,
}

/// Bearer-token client for the auth service's `/auth/*` routes.
#[derive(Debug, Clone)]
pub struct AuthServiceClient {
    http: Client,
    base_url: String,
}

impl AuthServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build auth service http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves the account behind `token`; fails when the service rejects it.
    pub async fn me(&self, token: &str) -> Result<AuthUser> {
        let res = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        let body: MeResponse = res.json().await.context("malformed /auth/me response")?;
        Ok(body.user)
    }

    /// Records one finished game for the account behind `token`.
    pub async fn update_stats(&self, token: &str, game_score: u32) -> Result<PlayerStats> {
        let res = self
            .http
            .post(format!("{}/auth/update-stats", self.base_url))
            .bearer_auth(token)
            .json(&UpdateStatsRequest { game_score })
            .send()
            .await?
            .error_for_status()?;
        let body: UpdateStatsResponse = res
            .json()
            .await
            .context("malformed /auth/update-stats response")?;
        Ok(body.stats)
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
