//! Round orchestration: the timed part of a game.
//!
//! The [`Session`](quizforge_session::Session) decides *what* happens; the
//! scheduler decides *when*. It owns the room's single countdown timer and
//! walks a game through
//!
//! ```text
//! game_started, countdown 3..0
//!   → question, time_update 10..0      ─┐  all answered: finalize now
//!   → question_result                  ←┘  deadline (0): finalize
//!   → next_question_countdown 5..0
//!   → next question | game_ended
//! ```
//!
//! # The finalize race
//!
//! A question can close two ways: the last participant answers, or the
//! answer window counts down to 0. Both paths call [`RoundScheduler::finalize`],
//! which bails out if the session has already scored the question and
//! otherwise cancels the timer *before* broadcasting. Because ticks and
//! answers are handled one at a time by the room actor, the loser of the
//! race either finds the timer disarmed or finds the result finalized,
//! and never broadcasts a second result.

use quizforge_protocol::{GameSettings, RoomCode, RoundResult, ServerEvent};
use quizforge_session::{Question, RoundControl, unix_millis};
use quizforge_tick::{CountdownTimer, Tick, TimerConfig};
use tracing::{debug, info, trace};

use crate::{Outbox, RoomConfig};

/// Which countdown the timer is running. Question-bound phases carry the
/// question index they were armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Pre-game count.
    Countdown,
    /// Answer window of question `question`.
    Answering { question: usize },
    /// Pause after the result of question `question`.
    Pause { question: usize },
}

/// Whether the game is still going after a scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundProgress {
    Running,
    /// `game_ended` was broadcast; the caller should discard the session.
    Ended,
}

/// Drives one room's rounds.
#[derive(Debug)]
pub struct RoundScheduler {
    room: RoomCode,
    timer: CountdownTimer<RoundPhase>,
    countdown_secs: u32,
    answer_window_secs: u32,
    pause_secs: u32,
}

impl RoundScheduler {
    pub fn new(room: RoomCode, config: &RoomConfig) -> Self {
        Self {
            room,
            timer: CountdownTimer::new(TimerConfig::with_period(config.tick_period)),
            countdown_secs: config.countdown_secs,
            answer_window_secs: u32::try_from(config.session.answer_window_secs)
                .unwrap_or(u32::MAX),
            pause_secs: config.result_pause_secs,
        }
    }

    /// Announces a new game and starts the pre-game countdown. Any round
    /// already in progress is abandoned.
    pub fn begin<S: RoundControl>(
        &mut self,
        settings: &GameSettings,
        session: &mut S,
        outbox: &Outbox,
    ) -> RoundProgress {
        self.timer.cancel();
        outbox.broadcast(ServerEvent::GameStarted {
            settings: settings.clone(),
        });
        if self.countdown_secs == 0 {
            return self.advance(session, outbox);
        }
        outbox.broadcast(ServerEvent::Countdown {
            count: self.countdown_secs,
        });
        self.timer.arm(RoundPhase::Countdown, self.countdown_secs);
        RoundProgress::Running
    }

    /// Waits for the next timer step. Pends forever while no countdown is
    /// armed, so it can sit in a `select!` next to the command channel.
    pub async fn next_tick(&mut self) -> Tick<RoundPhase> {
        self.timer.wait().await
    }

    /// Applies one timer step.
    pub fn on_tick<S: RoundControl>(
        &mut self,
        tick: Tick<RoundPhase>,
        session: &mut S,
        outbox: &Outbox,
    ) -> RoundProgress {
        trace!(room = %self.room, phase = ?tick.phase, remaining = tick.remaining, "tick");
        match tick.phase {
            RoundPhase::Countdown => {
                outbox.broadcast(ServerEvent::Countdown {
                    count: tick.remaining,
                });
                if tick.is_final() {
                    return self.advance(session, outbox);
                }
            }
            RoundPhase::Answering { question } => {
                if session.current_index() != Some(question) || session.is_result_finalized() {
                    debug!(room = %self.room, question, "stale answer-window tick ignored");
                    return RoundProgress::Running;
                }
                outbox.broadcast(ServerEvent::TimeUpdate {
                    time_remaining: tick.remaining,
                });
                if tick.is_final() {
                    return self.finalize(session, outbox);
                }
            }
            RoundPhase::Pause { question } => {
                if session.current_index() != Some(question) {
                    debug!(room = %self.room, question, "stale pause tick ignored");
                    return RoundProgress::Running;
                }
                outbox.broadcast(ServerEvent::NextQuestionCountdown {
                    count: tick.remaining,
                });
                if tick.is_final() {
                    return self.after_pause(session, outbox);
                }
            }
        }
        RoundProgress::Running
    }

    /// Called after the session admitted an answer. Finalizes at once when
    /// that answer was the last one outstanding.
    pub fn on_answer_accepted<S: RoundControl>(
        &mut self,
        session: &mut S,
        outbox: &Outbox,
    ) -> RoundProgress {
        if session.all_answered() {
            debug!(room = %self.room, "all answers in");
            return self.finalize(session, outbox);
        }
        RoundProgress::Running
    }

    /// Called after a participant was dropped from the session. Ends the
    /// game when nobody from the original roster is left; otherwise the
    /// departure may have made the current question fully answered.
    pub fn on_participant_left<S: RoundControl>(
        &mut self,
        session: &mut S,
        outbox: &Outbox,
        roster_empty: bool,
    ) -> RoundProgress {
        if roster_empty {
            return self.end_game(session, outbox);
        }
        self.on_answer_accepted(session, outbox)
    }

    /// Scores the open question, broadcasts the result and starts the
    /// pause. Does nothing if the question has already been finalized.
    pub fn finalize<S: RoundControl>(&mut self, session: &mut S, outbox: &Outbox) -> RoundProgress {
        if session.is_result_finalized() {
            return RoundProgress::Running;
        }
        let Some(question) = session.current_index() else {
            return RoundProgress::Running;
        };

        // Disarm the deadline first so it can never fire for this question.
        self.timer.cancel();

        let scoreboard = session.finalize_results();
        let (correct_answer, explanation) = session
            .current_question()
            .map(|q| (q.correct_answer, q.explanation.clone()))
            .unwrap_or_default();

        outbox.broadcast(ServerEvent::QuestionResult {
            result: RoundResult {
                correct_answer,
                explanation,
                scoreboard,
            },
        });
        debug!(room = %self.room, question, "result broadcast");

        if self.pause_secs == 0 {
            return self.after_pause(session, outbox);
        }
        outbox.broadcast(ServerEvent::NextQuestionCountdown {
            count: self.pause_secs,
        });
        self.timer.arm(RoundPhase::Pause { question }, self.pause_secs);
        RoundProgress::Running
    }

    /// Broadcasts the final scoreboard and stops the timer.
    pub fn end_game<S: RoundControl>(&mut self, session: &mut S, outbox: &Outbox) -> RoundProgress {
        self.timer.cancel();
        session.end();
        let final_scoreboard = session.final_scoreboard();
        info!(
            room = %self.room,
            players = final_scoreboard.len(),
            questions = session.total_questions(),
            "game ended"
        );
        outbox.broadcast(ServerEvent::GameEnded { final_scoreboard });
        RoundProgress::Ended
    }

    /// Stops whatever countdown is running. Used when the room is torn down
    /// or a new game replaces the current one.
    pub fn cancel(&mut self) {
        if let Some(phase) = self.timer.cancel() {
            debug!(room = %self.room, ?phase, "round timer canceled");
        }
    }

    /// `true` while any countdown is armed.
    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn phase(&self) -> Option<RoundPhase> {
        self.timer.phase().copied()
    }

    fn after_pause<S: RoundControl>(&mut self, session: &mut S, outbox: &Outbox) -> RoundProgress {
        if session.is_ended() {
            self.end_game(session, outbox)
        } else {
            self.advance(session, outbox)
        }
    }

    fn advance<S: RoundControl>(&mut self, session: &mut S, outbox: &Outbox) -> RoundProgress {
        let now = unix_millis();
        let Some(view) = session.advance_question(now).map(Question::view) else {
            return self.end_game(session, outbox);
        };
        let question_index = session.current_index().unwrap_or_default();
        let answer_deadline = session.answer_deadline().unwrap_or(now);

        outbox.broadcast(ServerEvent::Question {
            question: view,
            question_index,
            total_questions: session.total_questions(),
            answer_deadline,
        });
        debug!(room = %self.room, question = question_index, "question shown");

        if self.answer_window_secs == 0 {
            return self.finalize(session, outbox);
        }
        outbox.broadcast(ServerEvent::TimeUpdate {
            time_remaining: self.answer_window_secs,
        });
        self.timer.arm(
            RoundPhase::Answering {
                question: question_index,
            },
            self.answer_window_secs,
        );
        RoundProgress::Running
    }
}
