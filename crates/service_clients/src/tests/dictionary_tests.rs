use std::time::Duration;

use axum::{extract::Path, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use super::*;

async fn lookup(Path(word): Path<String>) -> StatusCode {
    match word.as_str() {
        "cat" | "tea" => StatusCode::OK,
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK
        }
        _ => StatusCode::NOT_FOUND,
    }
}

async fn spawn_dictionary() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route("/api/v2/entries/en/:word", get(lookup));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api/v2/entries/en"))
}

#[test]
fn entry_url_appends_the_word_as_one_segment() {
    let client = DictionaryApiClient::new(DEFAULT_DICTIONARY_URL, Duration::from_secs(1))
        .expect("client");
    assert_eq!(
        client.entry_url("cat").as_str(),
        "https://api.dictionaryapi.dev/api/v2/entries/en/cat"
    );
    assert_eq!(
        client.entry_url("a/b").as_str(),
        "https://api.dictionaryapi.dev/api/v2/entries/en/a%2Fb"
    );
}

#[test]
fn trailing_slash_on_base_url_is_ignored() {
    let client = DictionaryApiClient::new("http://dict.local/words/", Duration::from_secs(1))
        .expect("client");
    assert_eq!(client.entry_url("dog").as_str(), "http://dict.local/words/dog");
}

#[test]
fn rejects_unusable_base_urls() {
    assert!(DictionaryApiClient::new("not a url", Duration::from_secs(1)).is_err());
    assert!(DictionaryApiClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
}

#[tokio::test]
async fn success_status_means_the_word_exists() {
    let base = spawn_dictionary().await.expect("spawn dictionary");
    let client = DictionaryApiClient::new(&base, Duration::from_secs(1)).expect("client");

    assert!(client.contains("cat").await.expect("lookup"));
    assert!(!client.contains("xqz").await.expect("lookup"));
}

#[tokio::test]
async fn slow_dictionary_is_an_error() {
    let base = spawn_dictionary().await.expect("spawn dictionary");
    let client = DictionaryApiClient::new(&base, Duration::from_millis(100)).expect("client");

    assert!(client.contains("slow").await.is_err());
}

#[tokio::test]
async fn plugs_into_the_word_validator() {
    let base = spawn_dictionary().await.expect("spawn dictionary");
    let client = DictionaryApiClient::new(&base, Duration::from_secs(1)).expect("client");
    let validator = lobby_core::WordValidator::new(std::sync::Arc::new(client));

    assert!(validator.is_valid(" TEA ").await);
    assert!(!validator.is_valid("zzz").await);
    assert_eq!(validator.cached("tea").await, Some(true));
}
