use std::collections::HashMap;

use super::{load_settings_from, Settings};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, env_of(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.server_bind, "127.0.0.1:9090");
    assert_eq!(settings.dictionary_timeout().as_millis(), 5000);
    assert!(settings.auth_service_url.is_none());
}

#[test]
fn file_values_override_defaults() {
    let file = r#"
bind_addr = "0.0.0.0:7000"
dictionary_url = "http://dict.local/en"
dictionary_timeout_ms = "750"
auth_service_url = "http://localhost:9091"
"#;
    let settings = load_settings_from(Some(file), env_of(&[]));
    assert_eq!(settings.server_bind, "0.0.0.0:7000");
    assert_eq!(settings.dictionary_url, "http://dict.local/en");
    assert_eq!(settings.dictionary_timeout_ms, 750);
    assert_eq!(
        settings.auth_service_url.as_deref(),
        Some("http://localhost:9091")
    );
}

#[test]
fn prefixed_env_wins_over_plain_env_and_file() {
    let file = r#"bind_addr = "0.0.0.0:7000""#;
    let settings = load_settings_from(
        Some(file),
        env_of(&[
            ("SERVER_BIND", "0.0.0.0:7001"),
            ("APP__BIND_ADDR", "0.0.0.0:7002"),
            ("DICTIONARY_URL", "http://plain"),
            ("APP__AUTH_TIMEOUT_MS", "1200"),
        ]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:7002");
    assert_eq!(settings.dictionary_url, "http://plain");
    assert_eq!(settings.auth_timeout_ms, 1200);
}

#[test]
fn bad_values_keep_previous_settings() {
    let settings = load_settings_from(
        Some("this is = = not toml"),
        env_of(&[
            ("APP__DICTIONARY_TIMEOUT_MS", "soon"),
            ("APP__AUTH_TIMEOUT_MS", "0"),
        ]),
    );
    assert_eq!(settings.dictionary_timeout_ms, 5000);
    assert_eq!(settings.auth_timeout_ms, 5000);
}

#[test]
fn blank_auth_url_disables_stats_reporting() {
    let settings = load_settings_from(None, env_of(&[("AUTH_SERVICE_URL", "  ")]));
    assert!(settings.auth_service_url.is_none());
}
