//! Room lifecycle and round orchestration for Quizforge.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! membership, its running [`Session`](quizforge_session::Session) and the
//! countdown timer driving it. Commands and timer ticks for one room are
//! handled strictly one at a time; different rooms run in parallel and
//! share nothing mutable.
//!
//! # Key types
//!
//! - [`Room`]: membership, capacity and host reassignment (pure state)
//! - [`RoundScheduler`]: countdown → question → result → pause, and the
//!   answer/deadline race
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRegistry`]: creates rooms under unique codes, routes requests,
//!   sweeps dead rooms
//! - [`Outbox`]: per-room fan-out to participants' connections

mod actor;
mod config;
mod error;
mod outbox;
mod registry;
mod room;
mod scheduler;

pub use actor::{RoomHandle, RoomInfo};
pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use outbox::{EventSender, Outbox};
pub use registry::{CODE_ALPHABET, CODE_LEN, RoomRegistry};
pub use room::Room;
pub use scheduler::{RoundPhase, RoundProgress, RoundScheduler};
