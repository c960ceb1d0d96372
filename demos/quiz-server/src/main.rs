//! Quizforge trivia server.
//!
//! Configured from the environment (see [`ServerConfig::from_env`]):
//!
//! ```text
//! PORT=3000 QUIZFORGE_QUESTIONS=./questions.json RUST_LOG=debug cargo run -p quiz-server
//! ```
//!
//! Without `QUIZFORGE_QUESTIONS` the built-in question set is used. Set
//! `QUIZFORGE_STATUS_BIND=0.0.0.0:3001` to also serve `GET /health`.

use quizforge::prelude::*;

#[tokio::main]
async fn main() -> Result<(), QuizforgeError> {
    init_tracing("info");

    let config = ServerConfig::from_env();
    tracing::info!(
        bind = %config.bind_addr,
        questions = ?config.question_bank,
        status = ?config.status_bind,
        min_players = config.room.min_players,
        max_players = config.room.max_players,
        "starting quiz server"
    );

    let server = QuizServer::builder().config(config).build().await?;
    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let server = QuizServer::builder()
            .bind("127.0.0.1:0")
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn connect(addr: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws
    }

    async fn next_named(ws: &mut Ws, name: &str) -> ServerEvent {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(10), ws.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Text(text) = msg {
                let ev: ServerEvent = serde_json::from_str(text.as_str()).unwrap();
                if ev.name() == name {
                    return ev;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_builtin_bank_serves_a_math_game() {
        let addr = start().await;
        let mut ws = connect(&addr).await;

        let create = serde_json::json!({"event": "create_room", "data": {"playerName": "Mei"}});
        ws.send(Message::Text(create.to_string().into())).await.unwrap();
        let code = match next_named(&mut ws, "room_created").await {
            ServerEvent::RoomCreated { room_id, .. } => room_id,
            other => panic!("unexpected {other:?}"),
        };

        let start = serde_json::json!({"event": "start_game", "data": {
            "roomId": code.as_str(),
            "settings": {"category": "math", "questionCount": 3}
        }});
        ws.send(Message::Text(start.to_string().into())).await.unwrap();

        match next_named(&mut ws, "game_started").await {
            ServerEvent::GameStarted { settings } => {
                assert_eq!(settings.category, Category::Math);
                assert_eq!(settings.question_count, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
