//! Points for a correct answer.

/// The three knobs of the scoring formula.
///
/// A correct answer earns
///
/// ```text
/// base_points
///   + floor(ms_left * time_bonus_max / window_ms)
///   + streak_before * streak_bonus_unit
/// ```
///
/// where `ms_left` is clamped to `0..=window_ms`. Integer milliseconds keep
/// the floor exact; there is no float rounding at the boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub base_points: u32,
    /// Bonus for answering the instant the question appears.
    pub time_bonus_max: u32,
    /// Added once per consecutive correct answer before this one.
    pub streak_bonus_unit: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_points: 100,
            time_bonus_max: 50,
            streak_bonus_unit: 20,
        }
    }
}

impl ScoringRules {
    /// Points for a correct answer with `ms_left` of a `window_ms` window
    /// remaining, by a participant whose streak was `streak_before`.
    pub fn points(&self, ms_left: u64, window_ms: u64, streak_before: u32) -> u32 {
        let time_bonus = if window_ms == 0 {
            0
        } else {
            ms_left.min(window_ms) * u64::from(self.time_bonus_max) / window_ms
        };
        let streak_bonus = u64::from(streak_before) * u64::from(self.streak_bonus_unit);
        let total = u64::from(self.base_points) + time_bonus + streak_bonus;
        u32::try_from(total).unwrap_or(u32::MAX)
    }
}
