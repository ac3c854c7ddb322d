//! Authoritative lobby and round state for the word hunt server.
//!
//! [`ConnectionBridge`] is the entry point for transports: it turns client
//! requests into [`SessionCoordinator`] intents, which mutate lobbies owned by
//! the [`LobbyRegistry`] and fan events out to every member. Word submissions
//! are gated by the [`WordValidator`].

pub mod bridge;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod lobby;
pub mod registry;
pub mod validator;

pub use bridge::{Binding, ConnectionBridge};
pub use coordinator::{AcceptedWord, FinishedSession, SessionCoordinator};
pub use error::GameError;
pub use lobby::{Outbox, Phase, Seat};
pub use registry::LobbyRegistry;
pub use validator::{DictionaryOracle, WordValidator};

#[cfg(test)]
#[path = "tests/support.rs"]
mod tests_support;
