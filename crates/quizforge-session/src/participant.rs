//! One player's identity and running game record.

use quizforge_protocol::{ParticipantId, PlayerView};

/// One line of a participant's answer history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: String,
    /// The option picked, or `None` when no answer arrived in time.
    pub chosen: Option<u8>,
    pub is_correct: bool,
    pub points_earned: u32,
    /// Client timestamp of the answer; the deadline for a non-answer.
    pub timestamp: u64,
}

impl AnswerRecord {
    /// The record written for a participant who never answered.
    pub fn no_answer(question_id: impl Into<String>, deadline: u64) -> Self {
        Self {
            question_id: question_id.into(),
            chosen: None,
            is_correct: false,
            points_earned: 0,
            timestamp: deadline,
        }
    }
}

/// A player in a room or session.
///
/// `score`, `current_streak` and `history` change only through
/// [`record_answer`](Self::record_answer) and
/// [`reset_for_new_session`](Self::reset_for_new_session).
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub is_host: bool,
    score: u32,
    current_streak: u32,
    history: Vec<AnswerRecord>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_host,
            score: 0,
            current_streak: 0,
            history: Vec::new(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    pub fn last_answer(&self) -> Option<&AnswerRecord> {
        self.history.last()
    }

    /// Questions answered correctly this session.
    pub fn correct_count(&self) -> usize {
        self.history.iter().filter(|r| r.is_correct).count()
    }

    /// Appends to the history. A correct answer extends the streak and adds
    /// its points; anything else resets the streak and leaves the score.
    pub fn record_answer(&mut self, record: AnswerRecord) {
        if record.is_correct {
            self.current_streak += 1;
            self.score = self.score.saturating_add(record.points_earned);
        } else {
            self.current_streak = 0;
        }
        self.history.push(record);
    }

    /// Clears score, streak and history. Identity, name and host flag stay.
    pub fn reset_for_new_session(&mut self) {
        self.score = 0;
        self.current_streak = 0;
        self.history.clear();
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            current_streak: self.current_streak,
            is_host: self.is_host,
        }
    }
}
