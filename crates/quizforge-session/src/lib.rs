//! The trivia core for Quizforge.
//!
//! Everything in this crate is synchronous and free of I/O (apart from
//! loading a question file). Time enters only as unix-millisecond
//! arguments, so every rule here can be tested without a runtime.
//!
//! 1. **Questions**: [`Question`] records and the [`QuestionBank`] they are
//!    sampled from.
//! 2. **Participants**: score, streak and answer history
//!    ([`Participant`]).
//! 3. **Scoring**: [`ScoringRules`], integer points from time left and
//!    streak.
//! 4. **The round state machine**: [`Session`], driven from outside
//!    through the [`RoundControl`] capability trait.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← owns one Session per room, schedules its timers
//!     ↕
//! Session Layer (this crate)  ← admission, scoring, finalize-once
//!     ↕
//! Protocol Layer (below)  ← ParticipantId, views, ScoreEntry
//! ```

mod bank;
mod clock;
mod error;
mod participant;
mod question;
mod scoring;
mod session;

pub use bank::QuestionBank;
pub use clock::unix_millis;
pub use error::{BankError, SessionError};
pub use participant::{AnswerRecord, Participant};
pub use question::Question;
pub use scoring::ScoringRules;
pub use session::{RoundControl, Session, SessionConfig, SessionStatus};
