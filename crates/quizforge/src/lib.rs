//! # Quizforge
//!
//! Real-time multiplayer trivia server.
//!
//! Players connect over WebSocket, one opens a room and shares its
//! six-character code, the others join, and the host starts a game. The
//! server streams one question at a time with a countdown, collects
//! answers under a deadline, scores them with time and streak bonuses,
//! and pushes a scoreboard after every question and at the end.
//!
//! An optional plain-HTTP listener serves `GET /` and `GET /health` for
//! load balancers and uptime checks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn run() -> Result<(), QuizforgeError> {
//! let server = QuizServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Crates
//!
//! ```text
//! quizforge            ← server loop, connection handler, config (this crate)
//!   quizforge-room     ← room actors, round scheduler, registry
//!   quizforge-session  ← questions, scoring, the round state machine
//!   quizforge-tick     ← phase-tagged countdown timer
//!   quizforge-protocol ← wire events and codec
//!   quizforge-transport← WebSocket connections
//! ```

mod config;
mod error;
mod handler;
mod logging;
mod server;
mod status;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::QuizforgeError;
pub use logging::init_tracing;
pub use server::{QuizServer, QuizServerBuilder};

pub mod prelude {
    //! Everything needed to configure and run a server.

    pub use crate::{
        QuizServer, QuizServerBuilder, QuizforgeError, ServerConfig, init_tracing,
    };
    pub use quizforge_protocol::{
        Category, ClientEvent, GameSettings, ParticipantId, RoomCode, ServerEvent,
    };
    pub use quizforge_room::{RoomConfig, RoomError};
    pub use quizforge_session::{Question, QuestionBank, ScoringRules, SessionConfig};
}
