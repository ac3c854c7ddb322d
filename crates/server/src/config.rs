use std::{collections::HashMap, fs, time::Duration};

use serde::Deserialize;
use service_clients::DEFAULT_DICTIONARY_URL;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub dictionary_url: String,
    pub dictionary_timeout_ms: u64,
    pub auth_service_url: Option<String>,
    pub auth_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:9090".into(),
            dictionary_url: DEFAULT_DICTIONARY_URL.into(),
            dictionary_timeout_ms: 5000,
            auth_service_url: None,
            auth_timeout_ms: 5000,
        }
    }
}

impl Settings {
    pub fn dictionary_timeout(&self) -> Duration {
        Duration::from_millis(self.dictionary_timeout_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml` keys, then environment variables.
pub(crate) fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("dictionary_url") {
                    settings.dictionary_url = v.clone();
                }
                if let Some(v) = file_cfg.get("dictionary_timeout_ms") {
                    set_millis(&mut settings.dictionary_timeout_ms, "dictionary_timeout_ms", v);
                }
                if let Some(v) = file_cfg.get("auth_service_url") {
                    settings.auth_service_url = Some(v.clone());
                }
                if let Some(v) = file_cfg.get("auth_timeout_ms") {
                    set_millis(&mut settings.auth_timeout_ms, "auth_timeout_ms", v);
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DICTIONARY_URL") {
        settings.dictionary_url = v;
    }
    if let Some(v) = env("APP__DICTIONARY_URL") {
        settings.dictionary_url = v;
    }
    if let Some(v) = env("APP__DICTIONARY_TIMEOUT_MS") {
        set_millis(&mut settings.dictionary_timeout_ms, "APP__DICTIONARY_TIMEOUT_MS", &v);
    }

    if let Some(v) = env("AUTH_SERVICE_URL") {
        settings.auth_service_url = Some(v);
    }
    if let Some(v) = env("APP__AUTH_SERVICE_URL") {
        settings.auth_service_url = Some(v);
    }
    if let Some(v) = env("APP__AUTH_TIMEOUT_MS") {
        set_millis(&mut settings.auth_timeout_ms, "APP__AUTH_TIMEOUT_MS", &v);
    }

    settings.auth_service_url = settings
        .auth_service_url
        .filter(|url| !url.trim().is_empty());
    settings
}

fn set_millis(target: &mut u64, key: &str, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => *target = parsed,
        _ => warn!(key, value = raw, "ignoring invalid timeout"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
