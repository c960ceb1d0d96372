//! Per-connection handler: decode client events and route them to rooms.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task:
//!
//! ```text
//!  socket ──recv──→ handler ──RoomRegistry──→ room actors
//!                                                 │ ServerEvent
//!  socket ←─send─── writer  ←──── mpsc ←──────────┘
//! ```
//!
//! Every outbound frame, replies and errors included, goes through the
//! same channel, so a participant sees events in the order they were
//! produced.

use std::collections::HashSet;
use std::sync::Arc;

use quizforge_protocol::{ClientEvent, Codec, ParticipantId, RoomCode, ServerEvent};
use quizforge_room::{EventSender, RoomError};
use quizforge_session::unix_millis;
use quizforge_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::QuizforgeError;
use crate::server::ServerState;

/// Drop guard that leaves every room a participant is still in when the
/// handler exits, whether the socket closed, timed out, or the task
/// panicked. `Drop` is synchronous, so the leaves run on a spawned task.
struct MembershipGuard<C: Codec> {
    participant: ParticipantId,
    rooms: HashSet<RoomCode>,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        if self.rooms.is_empty() {
            return;
        }
        let participant = self.participant;
        let rooms = std::mem::take(&mut self.rooms);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            for code in rooms {
                match state.registry.leave(&code, participant).await {
                    Ok(remaining) => {
                        tracing::debug!(room = %code, %participant, remaining, "left on disconnect");
                    }
                    Err(e) => {
                        tracing::debug!(room = %code, %participant, error = %e, "leave on disconnect failed");
                    }
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), QuizforgeError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let participant = ParticipantId(conn_id.into_inner());
    tracing::info!(%conn_id, %participant, peer = %conn.peer_addr(), "participant connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    let mut guard = MembershipGuard {
        participant,
        rooms: HashSet::new(),
        state: Arc::clone(&state),
    };

    loop {
        // Control frames refresh `idle_for` without surfacing from `recv`,
        // so the deadline is measured from the last frame of any kind.
        let wait = state.idle_timeout.saturating_sub(conn.idle_for());
        let frame = match tokio::time::timeout(wait, conn.recv()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::info!(%participant, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%participant, error = %e, "recv error");
                break;
            }
            Err(_) if conn.idle_for() < state.idle_timeout => continue,
            Err(_) => {
                tracing::info!(%participant, "connection idle, dropping");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%participant, error = %e, "failed to decode event");
                send_error(&tx, format!("invalid event: {e}"));
                continue;
            }
        };

        if let Err(e) = dispatch(&state, participant, event, &tx, &mut guard.rooms).await {
            tracing::debug!(%participant, error = %e, "request rejected");
            send_error(&tx, e.to_string());
        }
    }

    // Leave rooms first: the rooms hold clones of `tx`, and the writer
    // only finishes once every sender is gone.
    drop(guard);
    drop(tx);
    let _ = conn.close().await;
    writer.abort();
    Ok(())
}

/// Routes one client event. `rooms` tracks which rooms this connection
/// is in, for cleanup on disconnect.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    participant: ParticipantId,
    event: ClientEvent,
    tx: &EventSender,
    rooms: &mut HashSet<RoomCode>,
) -> Result<(), RoomError> {
    let registry = &state.registry;
    match event {
        ClientEvent::CreateRoom(req) => {
            let handle = registry.create(participant, req.player_name, tx.clone());
            rooms.insert(handle.code().clone());
        }
        ClientEvent::JoinRoom(req) => {
            registry
                .join(&req.room_id, participant, req.player_name, tx.clone())
                .await?;
            rooms.insert(req.room_id);
        }
        ClientEvent::LeaveRoom(req) => {
            registry.leave(&req.room_id, participant).await?;
            rooms.remove(&req.room_id);
        }
        ClientEvent::StartGame(req) => {
            registry
                .start_game(&req.room_id, participant, req.settings)
                .await?;
        }
        ClientEvent::SubmitAnswer(req) => {
            registry
                .submit_answer(
                    &req.room_id,
                    participant,
                    req.question_id,
                    req.answer_index,
                    req.timestamp,
                )
                .await?;
        }
        ClientEvent::Heartbeat(req) => {
            let _ = tx.send(ServerEvent::HeartbeatAck {
                client_time: req.client_time,
                server_time: unix_millis(),
            });
        }
    }
    Ok(())
}

/// Drains the participant's event channel into the socket.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let frame = match state.codec.encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

fn send_error(tx: &EventSender, message: String) {
    let _ = tx.send(ServerEvent::Error { message });
}
