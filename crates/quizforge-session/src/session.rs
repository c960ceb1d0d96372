//! The round state machine.
//!
//! A [`Session`] is one run of a fixed question list for one room:
//!
//! ```text
//!   Waiting ──start──→ Countdown ──advance──→ Question ──finalize──→ Result
//!                                                ↑                     │
//!                                                └──────advance────────┤
//!                                                                      ↓
//!                                                                    Ended
//! ```
//!
//! The session never looks at a clock. Whoever drives it passes "now" into
//! [`advance_question`](Session::advance_question), and answers carry their
//! own timestamps. Two rules make the round safe against the race between
//! the last answer and the deadline timer:
//!
//! - [`submit_answer`](Session::submit_answer) is the only way in, and it
//!   refuses everything once the result is finalized.
//! - [`finalize_results`](Session::finalize_results) scores a question at
//!   most once; later calls return the same scoreboard.

use std::collections::HashMap;

use quizforge_protocol::{FinalScoreEntry, ParticipantId, RoomCode, ScoreEntry};
use rand::Rng;
use tracing::{debug, trace};

use crate::error::SessionError;
use crate::participant::{AnswerRecord, Participant};
use crate::question::Question;
use crate::scoring::ScoringRules;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Per-game rules.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long each question accepts answers. Default: 10 seconds.
    pub answer_window_secs: u64,

    pub scoring: ScoringRules,

    /// Permute the four options of each question as it is shown.
    /// Default: `true`. Tests turn it off to make `correct_answer`
    /// predictable.
    pub shuffle_options: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            answer_window_secs: 10,
            scoring: ScoringRules::default(),
            shuffle_options: true,
        }
    }
}

impl SessionConfig {
    pub fn answer_window_ms(&self) -> u64 {
        self.answer_window_secs.saturating_mul(1_000)
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, not yet started.
    Waiting,
    /// Pre-game countdown running.
    Countdown,
    /// A question is open for answers.
    Question,
    /// The current question has been scored.
    Result,
    /// Terminal.
    Ended,
}

// ---------------------------------------------------------------------------
// RoundControl
// ---------------------------------------------------------------------------

/// What a scheduler may do to a running round.
///
/// The room's scheduler is written against this trait rather than
/// [`Session`] directly, so the timing code cannot reach into membership or
/// question storage.
pub trait RoundControl {
    /// Opens the next question, or ends the session when none is left.
    fn advance_question(&mut self, now_ms: u64) -> Option<&Question>;

    /// The admission gate for answers.
    fn submit_answer(
        &mut self,
        participant: ParticipantId,
        question_id: &str,
        choice: u8,
        timestamp: u64,
    ) -> Result<(), SessionError>;

    /// Scores the current question once and returns the sorted scoreboard.
    fn finalize_results(&mut self) -> Vec<ScoreEntry>;

    /// `true` once the last question has been shown (or the game ended).
    fn is_ended(&self) -> bool;

    fn final_scoreboard(&self) -> Vec<FinalScoreEntry>;

    /// The question currently shown, options in display order.
    fn current_question(&self) -> Option<&Question>;

    /// Zero-based index of the current question.
    fn current_index(&self) -> Option<usize>;

    fn total_questions(&self) -> usize;

    /// Unix-ms deadline of the open question.
    fn answer_deadline(&self) -> Option<u64>;

    /// `true` when every participant has an answer in for this question.
    fn all_answered(&self) -> bool;

    fn is_result_finalized(&self) -> bool;

    /// Forces the session into `Ended`.
    fn end(&mut self);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Submission {
    choice: u8,
    timestamp: u64,
}

/// One game in one room.
#[derive(Debug)]
pub struct Session {
    room: RoomCode,
    config: SessionConfig,
    /// Canonical records, never shuffled in place.
    questions: Vec<Question>,
    participants: Vec<Participant>,
    status: SessionStatus,
    current_index: Option<usize>,
    /// This question's shuffled copy, fixed until the next advance.
    current: Option<Question>,
    question_start: Option<u64>,
    answer_deadline: Option<u64>,
    submitted: HashMap<ParticipantId, Submission>,
    result_finalized: bool,
}

impl Session {
    /// Creates a session over a membership snapshot. Call
    /// [`start`](Self::start) before advancing.
    pub fn new(
        room: RoomCode,
        questions: Vec<Question>,
        participants: Vec<Participant>,
        config: SessionConfig,
    ) -> Self {
        Self {
            room,
            config,
            questions,
            participants,
            status: SessionStatus::Waiting,
            current_index: None,
            current: None,
            question_start: None,
            answer_deadline: None,
            submitted: HashMap::new(),
            result_finalized: false,
        }
    }

    /// Enters the pre-game countdown and zeroes every participant.
    pub fn start(&mut self) {
        self.status = SessionStatus::Countdown;
        self.current_index = None;
        self.current = None;
        self.question_start = None;
        self.answer_deadline = None;
        self.submitted.clear();
        self.result_finalized = false;
        for p in &mut self.participants {
            p.reset_for_new_session();
        }
        debug!(room = %self.room, questions = self.questions.len(), "session started");
    }

    /// [`advance_question_with`](Self::advance_question_with) using the
    /// thread-local RNG for the option shuffle.
    pub fn advance_question(&mut self, now_ms: u64) -> Option<&Question> {
        self.advance_question_with(now_ms, &mut rand::rng())
    }

    /// Moves to the next question and opens its answer window at `now_ms`.
    ///
    /// Returns `None` and ends the session when the list is exhausted. The
    /// shuffle is drawn from the canonical record each time, so the same
    /// question in a later game starts from its original order.
    pub fn advance_question_with<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        rng: &mut R,
    ) -> Option<&Question> {
        let next = self.current_index.map_or(0, |i| i + 1);
        let Some(source) = self.questions.get(next) else {
            self.status = SessionStatus::Ended;
            self.current = None;
            self.answer_deadline = None;
            debug!(room = %self.room, "no questions left");
            return None;
        };

        let shown = if self.config.shuffle_options {
            source.shuffled(rng)
        } else {
            source.clone()
        };

        self.current_index = Some(next);
        self.question_start = Some(now_ms);
        self.answer_deadline = Some(now_ms + self.config.answer_window_ms());
        self.submitted.clear();
        self.result_finalized = false;
        self.status = SessionStatus::Question;
        trace!(room = %self.room, question = next, id = %shown.id, "question opened");
        self.current = Some(shown);
        self.current.as_ref()
    }

    /// Admits one answer for the open question.
    ///
    /// Rejections leave the session unchanged:
    /// - [`NotInSession`](SessionError::NotInSession): not in this game's roster
    /// - [`AnswerAfterDeadline`](SessionError::AnswerAfterDeadline): no open
    ///   question, result already finalized, or `timestamp` past the deadline
    /// - [`QuestionMismatch`](SessionError::QuestionMismatch): `question_id` is stale
    /// - [`DuplicateAnswer`](SessionError::DuplicateAnswer): already answered
    pub fn submit_answer(
        &mut self,
        participant: ParticipantId,
        question_id: &str,
        choice: u8,
        timestamp: u64,
    ) -> Result<(), SessionError> {
        if !self.participants.iter().any(|p| p.id == participant) {
            return Err(SessionError::NotInSession);
        }
        let (Some(current), Some(deadline)) = (&self.current, self.answer_deadline) else {
            return Err(SessionError::AnswerAfterDeadline);
        };
        if self.status != SessionStatus::Question || self.result_finalized {
            return Err(SessionError::AnswerAfterDeadline);
        }
        if current.id != question_id {
            return Err(SessionError::QuestionMismatch);
        }
        if timestamp > deadline {
            return Err(SessionError::AnswerAfterDeadline);
        }
        if self.submitted.contains_key(&participant) {
            return Err(SessionError::DuplicateAnswer);
        }

        self.submitted
            .insert(participant, Submission { choice, timestamp });
        trace!(room = %self.room, %participant, choice, "answer admitted");
        Ok(())
    }

    /// Scores the open question and returns the scoreboard, highest score
    /// first (ties keep roster order).
    ///
    /// Runs the scoring at most once per question. A repeated call, or a
    /// call with no question open, returns the scoreboard built from each
    /// participant's last recorded answer.
    pub fn finalize_results(&mut self) -> Vec<ScoreEntry> {
        if self.result_finalized {
            return self.result_snapshot();
        }
        let (Some(question), Some(deadline)) = (self.current.as_ref(), self.answer_deadline)
        else {
            return self.result_snapshot();
        };

        self.result_finalized = true;
        self.status = SessionStatus::Result;
        let window_ms = self.config.answer_window_ms();

        for p in &mut self.participants {
            let record = match self.submitted.get(&p.id) {
                None => AnswerRecord::no_answer(&question.id, deadline),
                Some(sub) => {
                    let is_correct = sub.choice == question.correct_answer;
                    let points_earned = if is_correct {
                        let ms_left = deadline.saturating_sub(sub.timestamp);
                        self.config
                            .scoring
                            .points(ms_left, window_ms, p.current_streak())
                    } else {
                        0
                    };
                    AnswerRecord {
                        question_id: question.id.clone(),
                        chosen: Some(sub.choice),
                        is_correct,
                        points_earned,
                        timestamp: sub.timestamp,
                    }
                }
            };
            p.record_answer(record);
        }

        debug!(
            room = %self.room,
            question = ?self.current_index,
            answered = self.submitted.len(),
            roster = self.participants.len(),
            "question finalized"
        );
        self.result_snapshot()
    }

    /// `true` once the last question is showing or the session ended.
    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
            || self
                .current_index
                .is_some_and(|i| i + 1 >= self.questions.len())
    }

    /// Totals for the whole game, highest score first.
    pub fn final_scoreboard(&self) -> Vec<FinalScoreEntry> {
        let total_questions = self.questions.len();
        let mut board: Vec<FinalScoreEntry> = self
            .participants
            .iter()
            .map(|p| FinalScoreEntry {
                player_id: p.id,
                player_name: p.name.clone(),
                score: p.score(),
                correct_count: p.correct_count(),
                total_questions,
            })
            .collect();
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board
    }

    /// `true` when every participant still in the game has answered.
    pub fn all_answered(&self) -> bool {
        !self.participants.is_empty()
            && self
                .participants
                .iter()
                .all(|p| self.submitted.contains_key(&p.id))
    }

    /// Drops a participant from the game roster (they left the room).
    /// Returns `false` if they were not in it.
    pub fn remove_participant(&mut self, id: ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        self.submitted.remove(&id);
        self.participants.len() != before
    }

    pub fn end(&mut self) {
        self.status = SessionStatus::Ended;
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn question_start(&self) -> Option<u64> {
        self.question_start
    }

    pub fn answer_deadline(&self) -> Option<u64> {
        self.answer_deadline
    }

    pub fn is_result_finalized(&self) -> bool {
        self.result_finalized
    }

    /// Number of answers admitted for the open question.
    pub fn submitted_count(&self) -> usize {
        self.submitted.len()
    }

    pub fn has_answered(&self, id: ParticipantId) -> bool {
        self.submitted.contains_key(&id)
    }

    fn result_snapshot(&self) -> Vec<ScoreEntry> {
        let mut board: Vec<ScoreEntry> = self
            .participants
            .iter()
            .map(|p| {
                let last = p.last_answer();
                ScoreEntry {
                    player_id: p.id,
                    player_name: p.name.clone(),
                    score: p.score(),
                    is_correct: last.is_some_and(|r| r.is_correct),
                    points_earned: last.map_or(0, |r| r.points_earned),
                    current_streak: p.current_streak(),
                }
            })
            .collect();
        // `sort_by` is stable: equal scores keep roster order.
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board
    }
}

impl RoundControl for Session {
    fn advance_question(&mut self, now_ms: u64) -> Option<&Question> {
        Session::advance_question(self, now_ms)
    }

    fn submit_answer(
        &mut self,
        participant: ParticipantId,
        question_id: &str,
        choice: u8,
        timestamp: u64,
    ) -> Result<(), SessionError> {
        Session::submit_answer(self, participant, question_id, choice, timestamp)
    }

    fn finalize_results(&mut self) -> Vec<ScoreEntry> {
        Session::finalize_results(self)
    }

    fn is_ended(&self) -> bool {
        Session::is_ended(self)
    }

    fn final_scoreboard(&self) -> Vec<FinalScoreEntry> {
        Session::final_scoreboard(self)
    }

    fn current_question(&self) -> Option<&Question> {
        Session::current_question(self)
    }

    fn current_index(&self) -> Option<usize> {
        Session::current_index(self)
    }

    fn total_questions(&self) -> usize {
        Session::total_questions(self)
    }

    fn answer_deadline(&self) -> Option<u64> {
        Session::answer_deadline(self)
    }

    fn all_answered(&self) -> bool {
        Session::all_answered(self)
    }

    fn is_result_finalized(&self) -> bool {
        Session::is_result_finalized(self)
    }

    fn end(&mut self) {
        Session::end(self)
    }
}
