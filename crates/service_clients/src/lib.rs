//! HTTP clients for the services the lobby server talks to but does not own:
//! the dictionary used to validate words and the auth service that keeps
//! per-user statistics.

pub mod auth;
pub mod dictionary;

pub use auth::{AuthServiceClient, AuthUser, PlayerStats};
pub use dictionary::{DictionaryApiClient, DEFAULT_DICTIONARY_URL};
