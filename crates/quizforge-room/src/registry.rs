//! Room registry: creates rooms under unique codes and routes requests.
//!
//! The registry's map is the only structure shared across rooms. It holds
//! nothing but [`RoomHandle`]s, and handles are cloned out before any
//! `.await`, so no map shard is ever locked while a room actor is being
//! waited on.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use quizforge_protocol::{GameSettings, ParticipantId, RoomCode};
use quizforge_session::QuestionBank;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::actor::spawn_room;
use crate::{EventSender, RoomConfig, RoomError, RoomHandle};

/// Characters room codes are drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a room code.
pub const CODE_LEN: usize = 6;

/// All live rooms, keyed by code.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, RoomHandle>,
    bank: Arc<QuestionBank>,
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig, bank: Arc<QuestionBank>) -> Self {
        Self {
            rooms: DashMap::new(),
            bank,
            config,
        }
    }

    /// Opens a new room with `host` as its first member and host.
    ///
    /// Must be called from inside a Tokio runtime (the room actor is
    /// spawned here).
    pub fn create(
        &self,
        host: ParticipantId,
        host_name: impl Into<String>,
        sender: EventSender,
    ) -> RoomHandle {
        self.create_with(&mut rand::rng(), host, host_name, sender)
    }

    /// [`create`](Self::create) with a caller-supplied RNG. A code that is
    /// already live is discarded and a new one drawn.
    pub fn create_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        host: ParticipantId,
        host_name: impl Into<String>,
        sender: EventSender,
    ) -> RoomHandle {
        let host_name = host_name.into();
        loop {
            let code = generate_code(rng);
            match self.rooms.entry(code) {
                Entry::Occupied(occupied) => {
                    debug!(room = %occupied.key(), "room code collision, regenerating");
                }
                Entry::Vacant(vacant) => {
                    let code = vacant.key().clone();
                    let handle = spawn_room(
                        code.clone(),
                        host,
                        host_name,
                        sender,
                        self.config.clone(),
                        Arc::clone(&self.bank),
                    );
                    vacant.insert(handle.clone());
                    info!(room = %code, %host, "room created");
                    return handle;
                }
            }
        }
    }

    /// Looks up a live room.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    pub async fn join(
        &self,
        code: &RoomCode,
        participant: ParticipantId,
        name: impl Into<String>,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let handle = self.get(code)?;
        let result = handle.join(participant, name, sender).await;
        self.check_alive(&handle, result)
    }

    /// Removes a participant from a room, deleting the room when it
    /// becomes empty. Returns the number of members left.
    pub async fn leave(
        &self,
        code: &RoomCode,
        participant: ParticipantId,
    ) -> Result<usize, RoomError> {
        let handle = self.get(code)?;
        let result = handle.leave(participant).await;
        let remaining = self.check_alive(&handle, result)?;
        if remaining == 0 {
            self.remove_handle(&handle);
            info!(room = %code, "room destroyed (empty)");
        }
        Ok(remaining)
    }

    pub async fn start_game(
        &self,
        code: &RoomCode,
        participant: ParticipantId,
        settings: GameSettings,
    ) -> Result<(), RoomError> {
        let handle = self.get(code)?;
        let result = handle.start_game(participant, settings).await;
        self.check_alive(&handle, result)
    }

    pub async fn submit_answer(
        &self,
        code: &RoomCode,
        participant: ParticipantId,
        question_id: impl Into<String>,
        choice: u8,
        timestamp: u64,
    ) -> Result<(), RoomError> {
        let handle = self.get(code)?;
        let result = handle
            .submit_answer(participant, question_id, choice, timestamp)
            .await;
        self.check_alive(&handle, result)
    }

    /// Shuts a room down and forgets it. Any round in progress is
    /// canceled; members receive nothing further.
    pub async fn delete(&self, code: &RoomCode) -> Result<(), RoomError> {
        let (_, handle) = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        // An actor that already stopped has nothing left to cancel.
        let _ = handle.shutdown().await;
        info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Removes every room with no members, and every room whose actor has
    /// stopped. Returns how many were removed.
    ///
    /// Meant to run on an interval as a safety net for rooms orphaned by
    /// connections that vanished without leaving.
    pub async fn sweep_empty(&self) -> usize {
        let handles: Vec<RoomHandle> = self.rooms.iter().map(|e| e.value().clone()).collect();

        let mut removed = 0;
        for handle in handles {
            let empty = match handle.get_info().await {
                Ok(info) => info.player_count == 0,
                Err(_) => true,
            };
            if empty && self.remove_handle(&handle) {
                let _ = handle.shutdown().await;
                removed += 1;
                info!(room = %handle.code(), "room swept");
            }
        }
        removed
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Removes `handle`'s entry, but only if the code still maps to that
    /// same actor.
    fn remove_handle(&self, handle: &RoomHandle) -> bool {
        self.rooms
            .remove_if(handle.code(), |_, current| current.same_room(handle))
            .is_some()
    }

    /// Drops a room whose actor is gone, so later requests get `NotFound`.
    fn check_alive<T>(
        &self,
        handle: &RoomHandle,
        result: Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        if let Err(RoomError::Unavailable(code)) = &result {
            if self.remove_handle(handle) {
                warn!(room = %code, "room actor unavailable, removed");
            }
        }
        result
    }
}

fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    RoomCode::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_code_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let code = generate_code(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generated_code_is_seed_deterministic() {
        let a = generate_code(&mut StdRng::seed_from_u64(9));
        let b = generate_code(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
