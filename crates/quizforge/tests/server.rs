//! Integration tests for the Quizforge server, handler, and full connection flow.
//!
//! These run against a real listener on `127.0.0.1:0` with a fast tick
//! (50ms per countdown step), so a whole one-question game takes well
//! under a second.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quizforge::prelude::*;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const TICK: Duration = Duration::from_millis(50);

fn bank() -> QuestionBank {
    QuestionBank::from_json_str(
        r#"[
            {"id":"g1","category":"general","question":"Sky colour?",
             "options":["green","blue","red","pink"],"correctAnswer":1,
             "explanation":"Rayleigh scattering"}
        ]"#,
    )
    .expect("test bank should parse")
}

fn room_config() -> RoomConfig {
    RoomConfig {
        tick_period: TICK,
        session: SessionConfig {
            shuffle_options: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Starts a server on a random port and returns the address.
async fn start_server_with(builder: QuizServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .questions(bank())
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn start_server() -> String {
    start_server_with(QuizServerBuilder::new().room_config(room_config())).await
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: serde_json::Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send should succeed");
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server event should decode");
        }
    }
}

/// Skips events until one named `name` arrives.
async fn wait_for(ws: &mut ClientWs, name: &str) -> ServerEvent {
    loop {
        let ev = recv_event(ws).await;
        if ev.name() == name {
            return ev;
        }
    }
}

async fn error_message(ws: &mut ClientWs) -> String {
    match wait_for(ws, "error").await {
        ServerEvent::Error { message } => message,
        other => panic!("expected error, got {other:?}"),
    }
}

/// Creates a room and returns `(room code, host id)`.
async fn create_room(ws: &mut ClientWs, name: &str) -> (RoomCode, ParticipantId) {
    send(ws, json!({"event": "create_room", "data": {"playerName": name}})).await;
    match wait_for(ws, "room_created").await {
        ServerEvent::RoomCreated {
            room_id, player_id, ..
        } => (room_id, player_id),
        other => panic!("expected room_created, got {other:?}"),
    }
}

async fn join_room(ws: &mut ClientWs, code: &RoomCode, name: &str) -> ParticipantId {
    send(
        ws,
        json!({"event": "join_room", "data": {"roomId": code.as_str(), "playerName": name}}),
    )
    .await;
    match wait_for(ws, "room_joined").await {
        ServerEvent::RoomJoined { player_id, .. } => player_id,
        other => panic!("expected room_joined, got {other:?}"),
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_code_and_host_list() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let (code, host) = create_room(&mut ws, "Ann").await;
    assert_eq!(code.as_str().len(), 6);

    match wait_for(&mut ws, "player_joined").await {
        ServerEvent::PlayerJoined { players } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].id, host);
            assert_eq!(players[0].name, "Ann");
            assert!(players[0].is_host);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_join_lowercase_code_reaches_room() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;

    let (code, _) = create_room(&mut host, "Ann").await;
    let lower = RoomCode::new(code.as_str().to_ascii_lowercase());
    join_room(&mut guest, &lower, "Bo").await;

    match wait_for(&mut host, "player_joined").await {
        ServerEvent::PlayerJoined { players } if players.len() == 2 => {}
        // The first player_joined is the host's own, from creation.
        ServerEvent::PlayerJoined { .. } => match wait_for(&mut host, "player_joined").await {
            ServerEvent::PlayerJoined { players } => assert_eq!(players.len(), 2),
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room_sends_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(
        &mut ws,
        json!({"event": "join_room", "data": {"roomId": "ZZZZZZ", "playerName": "Bo"}}),
    )
    .await;
    assert_eq!(error_message(&mut ws).await, "room ZZZZZZ not found");
}

#[tokio::test]
async fn test_malformed_frame_sends_error_and_keeps_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    assert!(error_message(&mut ws).await.starts_with("invalid event"));

    // Still usable afterwards.
    create_room(&mut ws, "Ann").await;
}

#[tokio::test]
async fn test_start_game_by_guest_is_rejected() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    let (code, _) = create_room(&mut host, "Ann").await;
    join_room(&mut guest, &code, "Bo").await;

    send(
        &mut guest,
        json!({"event": "start_game", "data": {
            "roomId": code.as_str(),
            "settings": {"category": "mixed", "questionCount": 1}
        }}),
    )
    .await;
    assert_eq!(error_message(&mut guest).await, "only the host can start the game");
}

#[tokio::test]
async fn test_disconnect_leaves_room_and_reassigns_host() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    let (code, _) = create_room(&mut host, "Ann").await;
    let guest_id = join_room(&mut guest, &code, "Bo").await;

    host.close(None).await.unwrap();
    drop(host);

    match wait_for(&mut guest, "player_left").await {
        ServerEvent::PlayerLeft { players } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].id, guest_id);
            assert!(players[0].is_host);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_server_with(
        QuizServerBuilder::new()
            .room_config(room_config())
            .idle_timeout(Duration::from_millis(100)),
    )
    .await;
    let mut ws = connect(&addr).await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server should drop an idle connection");
}

async fn idle_server() -> String {
    start_server_with(
        QuizServerBuilder::new()
            .room_config(room_config())
            .idle_timeout(Duration::from_millis(300)),
    )
    .await
}

#[tokio::test]
async fn test_pinging_client_outlives_idle_timeout() {
    let addr = idle_server().await;
    let mut host = connect(&addr).await;
    let (code, _) = create_room(&mut host, "Ann").await;

    // Pings only, no text, for well over the idle timeout.
    for _ in 0..20 {
        host.send(Message::Ping(Vec::new().into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // The room still exists, so the host was never dropped.
    let mut guest = connect(&addr).await;
    join_room(&mut guest, &code, "Bo").await;
    send(&mut host, json!({"event": "heartbeat", "data": {"clientTime": 7}})).await;
    match wait_for(&mut host, "heartbeat_ack").await {
        ServerEvent::HeartbeatAck { client_time, .. } => assert_eq!(client_time, 7),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_heartbeat_events_keep_browser_client_connected() {
    let addr = idle_server().await;
    let mut ws = connect(&addr).await;
    let (code, _) = create_room(&mut ws, "Ann").await;

    for client_time in 0..10u64 {
        send(
            &mut ws,
            json!({"event": "heartbeat", "data": {"clientTime": client_time}}),
        )
        .await;
        match wait_for(&mut ws, "heartbeat_ack").await {
            ServerEvent::HeartbeatAck {
                client_time: echoed,
                server_time,
            } => {
                assert_eq!(echoed, client_time);
                assert!(server_time > 0);
            }
            other => panic!("unexpected {other:?}"),
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let mut guest = connect(&addr).await;
    join_room(&mut guest, &code, "Bo").await;
}

// =========================================================================
// Status endpoint
// =========================================================================

/// Sends a bare HTTP/1.1 GET and returns `(status line, JSON body)`.
async fn http_get(addr: std::net::SocketAddr, path: &str) -> (String, serde_json::Value) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").expect("response has a body");
    let status_line = head.lines().next().unwrap_or_default().to_string();
    (status_line, serde_json::from_str(body).expect("body should be JSON"))
}

#[tokio::test]
async fn test_health_reports_live_rooms() {
    let server = QuizServer::builder()
        .bind("127.0.0.1:0")
        .status_bind("127.0.0.1:0")
        .room_config(room_config())
        .questions(bank())
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let status = server.status_addr().expect("status listener bound");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (line, body) = http_get(status, "/health").await;
    assert!(line.contains("200"), "{line}");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rooms"], 0);
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);

    let mut ws = connect(&addr).await;
    create_room(&mut ws, "Ann").await;
    let (_, body) = http_get(status, "/health").await;
    assert_eq!(body["rooms"], 1);

    let (_, body) = http_get(status, "/").await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_listener_is_off_by_default() {
    let server = QuizServer::builder()
        .bind("127.0.0.1:0")
        .questions(bank())
        .build()
        .await
        .unwrap();
    assert!(server.status_addr().is_none());
}

// =========================================================================
// Full game
// =========================================================================

#[tokio::test]
async fn test_two_players_full_game_over_websocket() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    let (code, host_id) = create_room(&mut host, "Ann").await;
    let guest_id = join_room(&mut guest, &code, "Bo").await;

    send(
        &mut host,
        json!({"event": "start_game", "data": {
            "roomId": code.as_str(),
            "settings": {"category": "mixed", "questionCount": 1}
        }}),
    )
    .await;

    match wait_for(&mut guest, "game_started").await {
        ServerEvent::GameStarted { settings } => assert_eq!(settings.question_count, 1),
        other => panic!("unexpected {other:?}"),
    }

    let (qid, deadline) = match wait_for(&mut host, "question").await {
        ServerEvent::Question {
            question,
            question_index,
            total_questions,
            answer_deadline,
        } => {
            assert_eq!(question_index, 0);
            assert_eq!(total_questions, 1);
            assert_eq!(question.options[1], "blue");
            (question.id, answer_deadline)
        }
        other => panic!("unexpected {other:?}"),
    };

    for (ws, id, offset) in [(&mut host, host_id, 8_000), (&mut guest, guest_id, 7_999)] {
        send(
            ws,
            json!({"event": "submit_answer", "data": {
                "roomId": code.as_str(),
                "playerId": id,
                "questionId": qid,
                "answerIndex": 1,
                "timestamp": deadline - offset
            }}),
        )
        .await;
    }

    match wait_for(&mut guest, "question_result").await {
        ServerEvent::QuestionResult { result } => {
            assert_eq!(result.correct_answer, 1);
            assert_eq!(result.explanation.as_deref(), Some("Rayleigh scattering"));
            let earned: Vec<_> = result
                .scoreboard
                .iter()
                .map(|e| (e.player_id, e.points_earned))
                .collect();
            assert_eq!(earned, vec![(host_id, 140), (guest_id, 139)]);
        }
        other => panic!("unexpected {other:?}"),
    }

    match wait_for(&mut host, "game_ended").await {
        ServerEvent::GameEnded { final_scoreboard } => {
            assert_eq!(final_scoreboard.len(), 2);
            assert_eq!(final_scoreboard[0].player_id, host_id);
            assert_eq!(final_scoreboard[0].score, 140);
            assert_eq!(final_scoreboard[1].score, 139);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_answer_gets_error() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    let (code, _) = create_room(&mut host, "Ann").await;
    join_room(&mut guest, &code, "Bo").await;

    send(
        &mut host,
        json!({"event": "start_game", "data": {
            "roomId": code.as_str(),
            "settings": {"category": "general", "questionCount": 1}
        }}),
    )
    .await;
    let (qid, deadline) = match wait_for(&mut host, "question").await {
        ServerEvent::Question {
            question,
            answer_deadline,
            ..
        } => (question.id, answer_deadline),
        other => panic!("unexpected {other:?}"),
    };

    let answer = json!({"event": "submit_answer", "data": {
        "roomId": code.as_str(),
        "questionId": qid,
        "answerIndex": 0,
        "timestamp": deadline
    }});
    send(&mut host, answer.clone()).await;
    send(&mut host, answer).await;
    assert_eq!(
        error_message(&mut host).await,
        "answer already submitted for this question"
    );
}
