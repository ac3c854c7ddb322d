use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lobby_core::DictionaryOracle;
use reqwest::Client;
use tracing::debug;
use url::Url;

pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

/// Asks a dictionary REST service whether a word exists by fetching
/// `{base_url}/{word}`. Any success status counts as a hit.
#[derive(Debug, Clone)]
pub struct DictionaryApiClient {
    http: Client,
    base_url: Url,
}

impl DictionaryApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid dictionary url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("dictionary url '{base_url}' cannot take a word path"));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build dictionary http client")?;
        Ok(Self { http, base_url })
    }

    pub fn entry_url(&self, word: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(word);
        }
        url
    }
}

#[async_trait]
impl DictionaryOracle for DictionaryApiClient {
    async fn contains(&self, word: &str) -> Result<bool> {
        let url = self.entry_url(word);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("dictionary request to {url} failed"))?;
        let status = response.status();
        debug!(%word, %status, "dictionary answered");
        Ok(status.is_success())
    }
}

#[cfg(test)]
#[path = "tests/dictionary_tests.rs"]
mod tests;
