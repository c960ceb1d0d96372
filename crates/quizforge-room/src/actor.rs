//! Room actor: an isolated Tokio task that owns one room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The task is the room's only execution context:
//! requests from participants and ticks of the round timer are taken one
//! at a time from a single `select!`, so nothing else ever touches the
//! room's membership or its session.
//!
//! ```text
//!  RoomHandle ──RoomCommand──→ ┌──────────────┐ ──ServerEvent──→ Outbox
//!                               │  RoomActor   │
//!  RoundScheduler::next_tick ─→ └──────────────┘
//! ```

use std::sync::Arc;

use quizforge_protocol::{GameSettings, ParticipantId, RoomCode, ServerEvent};
use quizforge_session::{QuestionBank, SessionStatus};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::{
    EventSender, Outbox, Room, RoomConfig, RoomError, RoomState, RoundProgress, RoundScheduler,
};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in each request is the reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    Join {
        participant: ParticipantId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Replies with the number of members left.
    Leave {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    StartGame {
        participant: ParticipantId,
        settings: GameSettings,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    SubmitAnswer {
        participant: ParticipantId,
        question_id: String,
        choice: u8,
        timestamp: u64,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Stop the room, canceling any round in progress.
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub state: RoomState,
    pub player_count: usize,
    pub max_players: usize,
    pub host: ParticipantId,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` wrapper. The registry holds one
/// per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Adds a participant; they receive `room_joined`, everyone else
    /// `player_joined`.
    pub async fn join(
        &self,
        participant: ParticipantId,
        name: impl Into<String>,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join {
            participant,
            name,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a participant and returns how many members remain. At zero
    /// the actor stops on its own.
    pub async fn leave(&self, participant: ParticipantId) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::Leave { participant, reply })
            .await?
    }

    pub async fn start_game(
        &self,
        participant: ParticipantId,
        settings: GameSettings,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StartGame {
            participant,
            settings,
            reply,
        })
        .await?
    }

    pub async fn submit_answer(
        &self,
        participant: ParticipantId,
        question_id: impl Into<String>,
        choice: u8,
        timestamp: u64,
    ) -> Result<(), RoomError> {
        let question_id = question_id.into();
        self.request(|reply| RoomCommand::SubmitAnswer {
            participant,
            question_id,
            choice,
            timestamp,
            reply,
        })
        .await?
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down (fire-and-forget).
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// `true` if both handles point at the same actor. Codes can be reused
    /// after a room is gone, so comparing codes alone is not enough.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// Whether the actor loop keeps going after a command.
enum Flow {
    Continue,
    Stop,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    outbox: Outbox,
    scheduler: RoundScheduler,
    config: RoomConfig,
    bank: Arc<QuestionBank>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.room.code(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if let Flow::Stop = self.handle(cmd) {
                        break;
                    }
                }
                tick = self.scheduler.next_tick() => {
                    let progress = match self.room.session_mut() {
                        Some(session) => self.scheduler.on_tick(tick, session, &self.outbox),
                        // Session already gone: the tick belongs to nothing.
                        None => continue,
                    };
                    self.settle(progress);
                }
            }
        }

        self.scheduler.cancel();
        info!(room = %self.room.code(), "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                participant,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(participant, name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { participant, reply } => {
                let result = self.handle_leave(participant);
                let emptied = matches!(result, Ok(0));
                let _ = reply.send(result);
                if emptied {
                    return Flow::Stop;
                }
            }
            RoomCommand::StartGame {
                participant,
                settings,
                reply,
            } => {
                let result = self.handle_start(participant, settings);
                let _ = reply.send(result);
            }
            RoomCommand::SubmitAnswer {
                participant,
                question_id,
                choice,
                timestamp,
                reply,
            } => {
                let result = self.handle_answer(participant, &question_id, choice, timestamp);
                let _ = reply.send(result);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room = %self.room.code(), "room shutting down");
                self.scheduler.cancel();
                self.room.end_session();
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn handle_join(
        &mut self,
        participant: ParticipantId,
        name: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        self.room.join(participant, name)?;
        self.outbox.add(participant, sender);
        info!(
            room = %self.room.code(),
            %participant,
            players = self.room.len(),
            "participant joined"
        );

        let players = self.room.player_views();
        self.outbox.send_to(
            participant,
            ServerEvent::RoomJoined {
                room_id: self.room.code().clone(),
                player_id: participant,
                players: players.clone(),
            },
        );
        self.outbox
            .broadcast_except(participant, ServerEvent::PlayerJoined { players });
        Ok(())
    }

    fn handle_leave(&mut self, participant: ParticipantId) -> Result<usize, RoomError> {
        if !self.room.leave(participant) {
            return Err(RoomError::NotMember(participant, self.room.code().clone()));
        }
        self.outbox.remove(participant);
        info!(
            room = %self.room.code(),
            %participant,
            players = self.room.len(),
            "participant left"
        );

        if self.room.is_empty() {
            self.scheduler.cancel();
            self.room.end_session();
            return Ok(0);
        }

        self.outbox.broadcast(ServerEvent::PlayerLeft {
            players: self.room.player_views(),
        });

        if let Some(session) = self.room.session_mut() {
            let roster_empty = session.participants().is_empty();
            let progress =
                self.scheduler
                    .on_participant_left(session, &self.outbox, roster_empty);
            self.settle(progress);
        }
        Ok(self.room.len())
    }

    fn handle_start(
        &mut self,
        participant: ParticipantId,
        mut settings: GameSettings,
    ) -> Result<(), RoomError> {
        if participant != self.room.host() {
            return Err(RoomError::NotHost);
        }
        if self.room.len() < self.config.min_players {
            return Err(RoomError::InsufficientPlayers {
                required: self.config.min_players,
                present: self.room.len(),
            });
        }
        if settings.question_count == 0 {
            return Err(RoomError::InvalidSettings(
                "questionCount must be at least 1".into(),
            ));
        }
        settings.question_count = settings.question_count.min(self.config.max_question_count);

        let questions =
            self.bank
                .sample(settings.category, settings.question_count, settings.age_group);
        if questions.is_empty() {
            return Err(RoomError::NoQuestions);
        }
        settings.question_count = questions.len();

        if self.room.session().is_some() {
            debug!(room = %self.room.code(), "replacing running game");
        }
        self.scheduler.cancel();
        info!(
            room = %self.room.code(),
            category = ?settings.category,
            questions = settings.question_count,
            players = self.room.len(),
            "game started"
        );

        let session = self
            .room
            .start_session(questions, self.config.session.clone());
        let progress = self.scheduler.begin(&settings, session, &self.outbox);
        self.settle(progress);
        Ok(())
    }

    fn handle_answer(
        &mut self,
        participant: ParticipantId,
        question_id: &str,
        choice: u8,
        timestamp: u64,
    ) -> Result<(), RoomError> {
        if !self.room.contains(participant) {
            return Err(RoomError::NotMember(participant, self.room.code().clone()));
        }
        let code = self.room.code().clone();
        let session = self
            .room
            .session_mut()
            .ok_or(RoomError::NoActiveSession(code))?;

        session.submit_answer(participant, question_id, choice, timestamp)?;
        debug!(room = %session.room(), %participant, choice, "answer accepted");

        let progress = self.scheduler.on_answer_accepted(session, &self.outbox);
        self.settle(progress);
        Ok(())
    }

    /// Drops the session once the scheduler reports the game over.
    fn settle(&mut self, progress: RoundProgress) {
        if progress == RoundProgress::Ended {
            self.room.end_session();
        }
    }

    fn state(&self) -> RoomState {
        let running = self
            .room
            .session()
            .is_some_and(|s| s.status() != SessionStatus::Ended);
        if running {
            RoomState::InGame
        } else {
            RoomState::Lobby
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code().clone(),
            state: self.state(),
            player_count: self.room.len(),
            max_players: self.room.capacity(),
            host: self.room.host(),
        }
    }
}

/// Spawns a room actor with `host` already joined, and returns a handle.
///
/// The host receives `room_created` followed by `player_joined` with the
/// one-entry player list.
pub(crate) fn spawn_room(
    code: RoomCode,
    host: ParticipantId,
    host_name: String,
    sender: EventSender,
    config: RoomConfig,
    bank: Arc<QuestionBank>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let mut room = Room::new(code.clone(), host, config.max_players.max(1));
    let mut outbox = Outbox::new();
    if room.join(host, host_name.clone()).is_ok() {
        outbox.add(host, sender);
        outbox.send_to(
            host,
            ServerEvent::RoomCreated {
                room_id: code.clone(),
                player_id: host,
                player_name: host_name,
            },
        );
        outbox.send_to(
            host,
            ServerEvent::PlayerJoined {
                players: room.player_views(),
            },
        );
    }

    let actor = RoomActor {
        scheduler: RoundScheduler::new(code.clone(), &config),
        room,
        outbox,
        config,
        bank,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
