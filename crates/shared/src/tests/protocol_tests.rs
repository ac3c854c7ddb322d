use super::*;
use crate::error::ErrorCode;

#[test]
fn join_lobby_uses_camel_case_wire_names() {
    let raw = r#"{"type":"joinLobby","data":{"lobbyId":"ab12cd","playerName":"Bea","playerId":"p-2"}}"#;
    let request: ClientRequest = serde_json::from_str(raw).expect("decode");
    let ClientRequest::JoinLobby {
        lobby_id,
        player_name,
        player_id,
    } = request
    else {
        panic!("expected joinLobby");
    };
    assert_eq!(lobby_id, "ab12cd");
    assert_eq!(player_name, "Bea");
    assert_eq!(player_id, PlayerId::from("p-2"));
}

#[test]
fn start_game_accepts_missing_grid_and_difficulty() {
    let raw = r#"{"type":"startGame","data":{"gridSize":5,"gameDuration":120}}"#;
    let request: ClientRequest = serde_json::from_str(raw).expect("decode");
    let ClientRequest::StartGame(settings) = request else {
        panic!("expected startGame");
    };
    assert!(settings.grid.is_none());
    assert_eq!(settings.difficulty, Difficulty::Easy);
    assert_eq!(settings.game_duration, 120);
}

#[test]
fn submit_word_tolerates_client_score() {
    let raw = r#"{"type":"submitWord","data":{"word":"CAT","score":30}}"#;
    let request: ClientRequest = serde_json::from_str(raw).expect("decode");
    assert!(matches!(
        request,
        ClientRequest::SubmitWord { ref word, score: Some(30) } if word == "CAT"
    ));
}

#[test]
fn leave_lobby_decodes_empty_payload() {
    let raw = r#"{"type":"leaveLobby","data":{}}"#;
    let request: ClientRequest = serde_json::from_str(raw).expect("decode");
    assert!(matches!(request, ClientRequest::LeaveLobby {}));
}

#[test]
fn error_event_carries_message() {
    let event = ServerEvent::Error(ApiError::new(ErrorCode::NotFound, "Lobby not found"));
    let value = serde_json::to_value(&event).expect("encode");
    assert_eq!(value["type"], "error");
    assert_eq!(value["data"]["message"], "Lobby not found");
    assert_eq!(value["data"]["code"], "not_found");
}

#[test]
fn word_submitted_lists_players_with_host_flag() {
    let event = ServerEvent::WordSubmitted {
        player_id: PlayerId::from("p-2"),
        word: "cat".into(),
        score: 30,
        players: vec![PlayerSummary {
            id: PlayerId::from("p-2"),
            display_name: "Bea".into(),
            score: 30,
            is_host: false,
            join_order: 2,
        }],
    };
    let value = serde_json::to_value(&event).expect("encode");
    assert_eq!(value["type"], "wordSubmitted");
    assert_eq!(value["data"]["playerId"], "p-2");
    assert_eq!(value["data"]["players"][0]["isHost"], false);
    assert_eq!(value["data"]["players"][0]["joinOrder"], 2);
}

#[test]
fn time_expired_reports_a_stopped_clock() {
    let event = ServerEvent::TimeExpired {
        remaining_seconds: 0,
        is_active: false,
        players: Vec::new(),
    };
    let value = serde_json::to_value(&event).expect("encode");
    assert_eq!(value["type"], "timeExpired");
    assert_eq!(value["data"]["remainingSeconds"], 0);
    assert_eq!(value["data"]["isActive"], false);
    assert!(value["data"]["players"].as_array().is_some_and(Vec::is_empty));
}
