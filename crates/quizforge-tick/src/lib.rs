//! Phase-tagged countdown timers for Quizforge.
//!
//! A trivia round is a chain of short countdowns: the pre-game count
//! (3→0), the answer window (10→0), and the pause after each result
//! (5→0). [`CountdownTimer`] drives exactly one of those at a time and
//! tags every tick with the phase it was armed for, so the owner can tell
//! which state the tick belongs to.
//!
//! # Cancellation
//!
//! Arming a new countdown replaces the previous one, and [`CountdownTimer::cancel`]
//! disarms it outright. Because the timer is polled from inside its owner's
//! loop, a replaced countdown can never deliver another tick. Each arm also
//! bumps a generation counter carried on every [`Tick`], for owners that
//! forward ticks across a channel.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = timer.wait() => { /* advance the round */ }
//!     }
//! }
//! ```
//!
//! When nothing is armed, [`CountdownTimer::wait`] pends forever, leaving
//! the other `select!` branches in charge.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`CountdownTimer`].
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Length of one countdown step. One second in production.
    pub period: Duration,
    /// A tick that fires later than this fraction of `period` is logged
    /// as late. Default: 0.25.
    pub late_warn_threshold: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            late_warn_threshold: 0.25,
        }
    }
}

impl TimerConfig {
    /// Shortest allowed period; anything smaller is clamped.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// A config with the given step length and default thresholds.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_secs_f64() * 1000.0,
                "countdown period too small, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self.late_warn_threshold = self.late_warn_threshold.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// One step of an armed countdown, returned by [`CountdownTimer::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick<P> {
    /// The phase this countdown was armed for.
    pub phase: P,
    /// Steps left after this one. `0` means the countdown just finished
    /// and the timer has disarmed itself.
    pub remaining: u32,
    /// Generation of the arm call that produced this tick.
    pub generation: u64,
}

impl<P> Tick<P> {
    /// `true` on the final tick of a countdown.
    pub fn is_final(&self) -> bool {
        self.remaining == 0
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Armed<P> {
    phase: P,
    remaining: u32,
    next: Instant,
}

/// A single-slot countdown timer.
///
/// One per room actor. Not `Sync`-shared: the owner polls it.
#[derive(Debug)]
pub struct CountdownTimer<P> {
    config: TimerConfig,
    armed: Option<Armed<P>>,
    generation: u64,
    fired: u64,
}

impl<P: Clone + std::fmt::Debug> CountdownTimer<P> {
    /// Creates an idle timer.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config: config.validated(),
            armed: None,
            generation: 0,
            fired: 0,
        }
    }

    /// Creates an idle timer with the given step length.
    pub fn with_period(period: Duration) -> Self {
        Self::new(TimerConfig::with_period(period))
    }

    /// Starts counting down from `from` in phase `phase`, replacing any
    /// countdown already armed.
    ///
    /// The caller announces `from` itself; the timer then yields
    /// `from - 1, from - 2, ..., 0`, one per period. Arming with `from == 0`
    /// yields a single final tick after one period. Returns the new
    /// generation.
    pub fn arm(&mut self, phase: P, from: u32) -> u64 {
        self.generation += 1;
        if let Some(previous) = &self.armed {
            debug!(
                replaced = ?previous.phase,
                generation = self.generation,
                "countdown replaced before finishing"
            );
        }
        trace!(?phase, from, generation = self.generation, "countdown armed");
        self.armed = Some(Armed {
            phase,
            remaining: from,
            next: Instant::now() + self.config.period,
        });
        self.generation
    }

    /// Disarms the timer. Returns the phase that was armed, if any.
    ///
    /// Safe to call when idle (idempotent).
    pub fn cancel(&mut self) -> Option<P> {
        let previous = self.armed.take().map(|a| a.phase);
        if let Some(phase) = &previous {
            trace!(?phase, generation = self.generation, "countdown canceled");
        }
        previous
    }

    /// Waits for the next step of the armed countdown.
    ///
    /// Pends forever when idle. Cancel-safe: dropping the future before it
    /// completes leaves the countdown untouched.
    pub async fn wait(&mut self) -> Tick<P> {
        let next = match &self.armed {
            Some(armed) => armed.next,
            None => std::future::pending::<Instant>().await,
        };

        time::sleep_until(next).await;

        let late_by = Instant::now().saturating_duration_since(next);
        if late_by.as_secs_f64()
            > self.config.period.as_secs_f64() * self.config.late_warn_threshold
        {
            warn!(
                late_ms = late_by.as_secs_f64() * 1000.0,
                "countdown tick fired late"
            );
        }

        self.fired += 1;
        let generation = self.generation;
        let period = self.config.period;

        // `armed` cannot have changed since the sleep began: `wait` holds
        // `&mut self` for its whole duration.
        let Some(armed) = self.armed.as_mut() else {
            return std::future::pending().await;
        };
        armed.remaining = armed.remaining.saturating_sub(1);
        // Schedule from the intended instant, not from now, so a late tick
        // doesn't stretch the whole countdown.
        armed.next = next + period;

        let tick = Tick {
            phase: armed.phase.clone(),
            remaining: armed.remaining,
            generation,
        };
        if tick.is_final() {
            self.armed = None;
        }
        trace!(phase = ?tick.phase, remaining = tick.remaining, "countdown tick");
        tick
    }

    /// `true` while a countdown is in progress.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Phase of the countdown in progress.
    pub fn phase(&self) -> Option<&P> {
        self.armed.as_ref().map(|a| &a.phase)
    }

    /// Steps left in the countdown in progress.
    pub fn remaining(&self) -> Option<u32> {
        self.armed.as_ref().map(|a| a.remaining)
    }

    /// Generation of the most recent [`arm`](Self::arm) call.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total ticks delivered over the timer's lifetime.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// The configured step length.
    pub fn period(&self) -> Duration {
        self.config.period
    }
}
