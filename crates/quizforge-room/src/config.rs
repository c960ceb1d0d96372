//! Room configuration and lobby state.

use std::time::Duration;

use quizforge_session::SessionConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Minimum members required before the host may start. Default: 1
    /// (solo play allowed).
    pub min_players: usize,

    /// Maximum members per room. Default: 8.
    pub max_players: usize,

    /// Upper bound on `questionCount`; larger requests are clamped.
    pub max_question_count: usize,

    /// Pre-game countdown length, in ticks. Default: 3.
    pub countdown_secs: u32,

    /// Pause between a result and the next question, in ticks. Default: 5.
    pub result_pause_secs: u32,

    /// Length of one countdown tick. One second in production; tests
    /// shrink it.
    pub tick_period: Duration,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,

    /// Answer window and scoring.
    pub session: SessionConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 1,
            max_players: 8,
            max_question_count: 50,
            countdown_secs: 3,
            result_pause_secs: 5,
            tick_period: Duration::from_secs(1),
            channel_size: 64,
            session: SessionConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Whether a room is idle or running a game.
///
/// ```text
/// Lobby ──start_game──→ InGame ──game_ended──→ Lobby
/// ```
///
/// A room stays joinable in both states; late joiners watch the running
/// game but cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Lobby,
    InGame,
}

impl RoomState {
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::InGame)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InGame => write!(f, "InGame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 1);
        assert_eq!(config.max_players, 8);
        assert_eq!(config.countdown_secs, 3);
        assert_eq!(config.result_pause_secs, 5);
        assert_eq!(config.tick_period, Duration::from_secs(1));
        assert_eq!(config.session.answer_window_secs, 10);
    }

    #[test]
    fn test_room_state_display() {
        assert_eq!(RoomState::Lobby.to_string(), "Lobby");
        assert_eq!(RoomState::InGame.to_string(), "InGame");
        assert!(RoomState::InGame.is_in_game());
        assert!(!RoomState::Lobby.is_in_game());
    }
}
