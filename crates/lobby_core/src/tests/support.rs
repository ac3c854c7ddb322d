use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{domain::ConnectionId, protocol::ServerEvent};
use tokio::sync::mpsc;

use crate::{
    lobby::{Outbox, Seat},
    validator::DictionaryOracle,
};

/// Oracle backed by a fixed word list that records every outbound call.
pub(crate) struct WordListOracle {
    words: HashSet<String>,
    delay: Duration,
    failing: bool,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl WordListOracle {
    pub(crate) fn new(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|w| w.to_string()).collect(),
            delay: Duration::ZERO,
            failing: false,
            calls: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn failing() -> Self {
        let mut oracle = Self::new(&[]);
        oracle.failing = true;
        oracle
    }

    pub(crate) fn calls_for(&self, word: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(word)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DictionaryOracle for WordListOracle {
    async fn contains(&self, word: &str) -> anyhow::Result<bool> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(word.to_string())
            .or_default() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing {
            return Err(anyhow!("dictionary unreachable"));
        }
        Ok(self.words.contains(word))
    }
}

/// A fake client connection: the seat handed to the coordinator plus the
/// receiving end of its outbox.
pub(crate) struct TestClient {
    pub(crate) seat: Seat,
    pub(crate) rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    pub(crate) fn new(connection: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            seat: Seat::new(ConnectionId(connection), Outbox::new(tx)),
            rx,
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

pub(crate) fn shared_oracle(words: &[&str]) -> Arc<WordListOracle> {
    Arc::new(WordListOracle::new(words))
}
