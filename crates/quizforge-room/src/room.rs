//! Room membership, host reassignment and the active session slot.

use quizforge_protocol::{ParticipantId, PlayerView, RoomCode};
use quizforge_session::{Participant, Question, Session, SessionConfig};

use crate::RoomError;

/// The state of one room, without any I/O.
///
/// Owned by the room actor; all mutation goes through it.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: ParticipantId,
    /// Join order. Host reassignment picks the front.
    members: Vec<Participant>,
    capacity: usize,
    session: Option<Session>,
}

impl Room {
    /// Creates an empty room whose host will be `host` once they join.
    pub fn new(code: RoomCode, host: ParticipantId, capacity: usize) -> Self {
        Self {
            code,
            host,
            members: Vec::new(),
            capacity,
            session: None,
        }
    }

    /// Adds a member. The creator gets `is_host`; everyone else doesn't.
    pub fn join(
        &mut self,
        id: ParticipantId,
        name: impl Into<String>,
    ) -> Result<&Participant, RoomError> {
        if self.contains(id) {
            return Err(RoomError::AlreadyMember(id, self.code.clone()));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        self.members
            .push(Participant::new(id, name, id == self.host));
        Ok(&self.members[self.members.len() - 1])
    }

    /// Removes a member, returning `false` if they weren't one.
    ///
    /// A departing host hands the role to the earliest-joined member still
    /// present. The member is also dropped from a running session.
    pub fn leave(&mut self, id: ParticipantId) -> bool {
        let Some(pos) = self.members.iter().position(|m| m.id == id) else {
            return false;
        };
        let removed = self.members.remove(pos);

        if let Some(session) = &mut self.session {
            session.remove_participant(id);
        }

        if removed.is_host {
            if let Some(next) = self.members.first_mut() {
                next.is_host = true;
                self.host = next.id;
                tracing::info!(room = %self.code, host = %next.id, "host reassigned");
            }
        }
        true
    }

    /// Builds a session over the current members and starts it, replacing
    /// any session already running.
    pub fn start_session(
        &mut self,
        questions: Vec<Question>,
        config: SessionConfig,
    ) -> &mut Session {
        let mut session =
            Session::new(self.code.clone(), questions, self.members.clone(), config);
        session.start();
        self.session.insert(session)
    }

    /// Discards the session, if any.
    pub fn end_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// The `players[]` list for lobby events. While a game runs, score and
    /// streak come from the session.
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.members
            .iter()
            .map(|m| {
                let mut view = m.view();
                if let Some(p) = self.session.as_ref().and_then(|s| s.participant(m.id)) {
                    view.score = p.score();
                    view.current_streak = p.current_streak();
                }
                view
            })
            .collect()
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> ParticipantId {
        self.host
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }
}
