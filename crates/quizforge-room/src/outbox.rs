//! Per-room fan-out to participants' connections.

use std::collections::HashMap;

use quizforge_protocol::{ParticipantId, ServerEvent};
use tokio::sync::mpsc;

/// Channel a connection handler drains to write events to its socket.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// The room's group of connections.
///
/// Sends never block the room actor: channels are unbounded, and a send to
/// a connection that has already gone away is silently dropped (its
/// handler's drop guard will remove it from the room shortly).
#[derive(Debug, Default)]
pub struct Outbox {
    senders: HashMap<ParticipantId, EventSender>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the group, replacing any previous sender for
    /// the same participant.
    pub fn add(&mut self, id: ParticipantId, sender: EventSender) {
        self.senders.insert(id, sender);
    }

    pub fn remove(&mut self, id: ParticipantId) -> Option<EventSender> {
        self.senders.remove(&id)
    }

    pub fn send_to(&self, id: ParticipantId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&id) {
            let _ = sender.send(event);
        }
    }

    pub fn broadcast(&self, event: ServerEvent) {
        tracing::trace!(event = event.name(), recipients = self.senders.len(), "broadcast");
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    pub fn broadcast_except(&self, excluded: ParticipantId, event: ServerEvent) {
        for (id, sender) in &self.senders {
            if *id != excluded {
                let _ = sender.send(event.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
