//! Shared protocol types: identities, game vocabulary, and view snapshots.
//!
//! Everything in this module travels on the wire, so the serde attributes
//! are part of the contract with the browser client. Field names follow the
//! client's camelCase convention.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for one connected participant.
///
/// The transport layer derives it from the connection, so it lives exactly
/// as long as the socket does. Newtype over `u64` so a participant can't be
/// confused with any other number in a signature.
///
/// `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short, human-typeable room code such as `"K7Q2ZD"`.
///
/// Codes are normalized on the way in (whitespace trimmed, ASCII
/// upper-cased) so a player typing `k7q2zd ` still lands in the right room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a room code, normalizing case and surrounding whitespace.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// A question topic.
///
/// `Mixed` is only meaningful in [`GameSettings`]: it means "draw from every
/// topic". Stored questions always carry one of the concrete topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chinese,
    English,
    Math,
    General,
    Mixed,
}

impl Category {
    /// Returns `true` if a question tagged `topic` belongs to this selection.
    pub fn includes(self, topic: Category) -> bool {
        self == Category::Mixed || self == topic
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chinese => "chinese",
            Self::English => "english",
            Self::Math => "math",
            Self::General => "general",
            Self::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

/// The age bracket a question is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Preschool,
    Grade1,
    Grade2,
    Grade4,
}

/// What the host asks for when starting a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Topic to draw questions from (`mixed` for all).
    pub category: Category,

    /// How many questions the game should run. Defaults to 5.
    #[serde(default = "GameSettings::default_question_count")]
    pub question_count: usize,

    /// Restrict questions to one age bracket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
}

impl GameSettings {
    /// Question count used when the client omits one.
    pub const DEFAULT_QUESTION_COUNT: usize = 5;

    fn default_question_count() -> usize {
        Self::DEFAULT_QUESTION_COUNT
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            category: Category::Mixed,
            question_count: Self::DEFAULT_QUESTION_COUNT,
            age_group: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Views: snapshots pushed to clients
// ---------------------------------------------------------------------------

/// One entry of the `players[]` list in lobby events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: ParticipantId,
    pub name: String,
    pub score: u32,
    pub current_streak: u32,
    pub is_host: bool,
}

/// A question as players see it: the correct option is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub category: Category,
    pub question: String,
    pub options: [String; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
}

/// One participant's line in a per-question result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_id: ParticipantId,
    pub player_name: String,
    /// Running total after this question.
    pub score: u32,
    pub is_correct: bool,
    /// Points this question contributed (0 when wrong or unanswered).
    #[serde(rename = "earnedPoints")]
    pub points_earned: u32,
    pub current_streak: u32,
}

/// One participant's line in the end-of-game scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScoreEntry {
    pub player_id: ParticipantId,
    pub player_name: String,
    pub score: u32,
    pub correct_count: usize,
    pub total_questions: usize,
}

/// The reveal that follows each question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    /// Index of the correct option, in the order the options were shown.
    pub correct_answer: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Sorted by score, highest first.
    pub scoreboard: Vec<ScoreEntry>,
}
