use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait DictionaryOracle: Send + Sync {
    async fn contains(&self, word: &str) -> anyhow::Result<bool>;
}

pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Default)]
struct ValidatorState {
    cache: HashMap<String, bool>,
    in_flight: HashMap<String, watch::Receiver<Option<bool>>>,
}

/// Dictionary check with a permanent result cache and at most one outbound
/// lookup per distinct word.
#[derive(Clone)]
pub struct WordValidator {
    oracle: Arc<dyn DictionaryOracle>,
    state: Arc<Mutex<ValidatorState>>,
    timeout: Duration,
}

impl WordValidator {
    pub fn new(oracle: Arc<dyn DictionaryOracle>) -> Self {
        Self {
            oracle,
            state: Arc::new(Mutex::new(ValidatorState::default())),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Never fails: an unreachable or slow oracle yields `false`, and that
    /// answer is cached like any other.
    pub async fn is_valid(&self, word: &str) -> bool {
        let word = normalize(word);
        let mut settled = {
            let mut state = self.state.lock().await;
            if let Some(valid) = state.cache.get(&word) {
                return *valid;
            }
            match state.in_flight.get(&word) {
                Some(pending) => {
                    debug!(%word, "joining in-flight dictionary lookup");
                    pending.clone()
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    state.in_flight.insert(word.clone(), rx.clone());
                    self.spawn_lookup(word.clone(), tx);
                    rx
                }
            }
        };

        let valid = match settled.wait_for(Option::is_some).await {
            Ok(result) => (*result).unwrap_or(false),
            Err(_) => {
                warn!(%word, "dictionary lookup task ended without a result");
                false
            }
        };
        valid
    }

    pub async fn cached(&self, word: &str) -> Option<bool> {
        self.state.lock().await.cache.get(&normalize(word)).copied()
    }

    pub async fn cache_len(&self) -> usize {
        self.state.lock().await.cache.len()
    }

    // The lookup runs detached so a caller that goes away cannot strand the
    // other waiters on this word.
    fn spawn_lookup(&self, word: String, settled: watch::Sender<Option<bool>>) {
        let oracle = Arc::clone(&self.oracle);
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;
        tokio::spawn(async move {
            let valid = match tokio::time::timeout(timeout, oracle.contains(&word)).await {
                Ok(Ok(valid)) => valid,
                Ok(Err(error)) => {
                    warn!(%word, %error, "dictionary lookup failed; rejecting word");
                    false
                }
                Err(_) => {
                    warn!(%word, ?timeout, "dictionary lookup timed out; rejecting word");
                    false
                }
            };
            debug!(%word, valid, "dictionary lookup settled");

            {
                let mut state = state.lock().await;
                state.cache.entry(word.clone()).or_insert(valid);
                state.in_flight.remove(&word);
            }
            let _ = settled.send(Some(valid));
        });
    }
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
