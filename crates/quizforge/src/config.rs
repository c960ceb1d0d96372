//! Server configuration.
//!
//! Everything has a working default; [`ServerConfig::from_env`] overrides
//! a handful of fields from the process environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `QUIZFORGE_BIND` | `bind_addr` (full `host:port`) |
//! | `PORT` | `bind_addr` as `0.0.0.0:<PORT>`, if `QUIZFORGE_BIND` is unset |
//! | `QUIZFORGE_QUESTIONS` | `question_bank` (path to a JSON file) |
//! | `QUIZFORGE_MIN_PLAYERS` | `room.min_players` |
//! | `QUIZFORGE_MAX_PLAYERS` | `room.max_players` |
//! | `QUIZFORGE_STATUS_BIND` | `status_bind` (HTTP `/` and `/health`) |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use quizforge_room::RoomConfig;

/// Port used when neither `QUIZFORGE_BIND` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Configuration shared by every room.
    pub room: RoomConfig,

    /// How often empty or dead rooms are swept. Default: 60s.
    pub sweep_interval: Duration,

    /// A connection that sends nothing for this long is dropped (and leaves
    /// its rooms). WebSocket pings and `heartbeat` events count. Default: 300s.
    pub idle_timeout: Duration,

    /// JSON question file. `None` uses the built-in set.
    pub question_bank: Option<PathBuf>,

    /// Address for the HTTP status endpoints. `None` serves none.
    pub status_bind: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            room: RoomConfig::default(),
            sweep_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
            question_bank: None,
            status_bind: None,
        }
    }
}

impl ServerConfig {
    /// Defaults, overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults, overridden by whatever `lookup` returns for each variable.
    ///
    /// Values that don't parse are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = lookup("QUIZFORGE_BIND") {
            config.bind_addr = bind;
        } else if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(path) = lookup("QUIZFORGE_QUESTIONS") {
            config.question_bank = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup("QUIZFORGE_STATUS_BIND") {
            config.status_bind = Some(addr);
        }
        if let Some(min) = parse_var(&lookup, "QUIZFORGE_MIN_PLAYERS") {
            config.room.min_players = min;
        }
        if let Some(max) = parse_var::<usize>(&lookup, "QUIZFORGE_MAX_PLAYERS") {
            if max == 0 {
                tracing::warn!("QUIZFORGE_MAX_PLAYERS must be at least 1, keeping default");
            } else {
                config.room.max_players = max;
            }
        }
        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "unparseable environment value, using default");
            None
        }
    }
}
