/*!
Score, level and cleared-row accounting for one round of play.
*/

use std::time::Duration;

/// Bookkeeper for score, level and cleared-row totals.
///
/// The keeper owns all scoring math and the level-dependent lock delay; the game
/// reports row clears to it and reads everything else back.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreKeeper {
    score: u64,
    level: u32,
    lines_cleared: u32,
    level_progress: u32,
}

impl ScoreKeeper {
    // Points awarded per cleared row before multipliers.
    const BASE_SCORE: u64 = 100;
    // Multiplier for clearing 1, 2, 3 or 4 rows at once, in tenths. One entry per
    // cell of a piece, as no single lock can complete more rows than its piece has
    // cells.
    const ROW_MULTIPLIER_TENTHS: [u64; 4] = [10, 15, 20, 25];
    // Additive multiplier bonus per level, in tenths.
    const LEVEL_BONUS_TENTHS: u64 = 2;
    // Cleared rows needed to advance one level.
    const CLEARS_PER_LEVEL: u32 = 10;
    const LOCK_DELAY_BASE: Duration = Duration::from_millis(1000);
    const LOCK_DELAY_STEP: Duration = Duration::from_millis(100);
    const LOCK_DELAY_FLOOR: Duration = Duration::from_millis(100);

    /// Creates a fresh keeper at level 0 with nothing scored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Banks one lock's worth of cleared rows: adds score for `rows` simultaneously
    /// cleared rows at the current level, then advances level progress.
    ///
    /// Scoring is `rows x 100 x multiplier`, where the multiplier starts at 1.0, 1.5,
    /// 2.0 or 2.5 for 1, 2, 3 or 4 rows, and grows by 0.2 per level already reached
    /// when the clear happens. Every factor is a multiple of one tenth, so the total
    /// stays a whole number of points.
    ///
    /// Every tenth cleared row advances the level by one, leftovers carrying over.
    ///
    /// # Panics
    /// Panics if `rows` is not in `1..=4`.
    pub fn register_clear(&mut self, rows: u32) {
        assert!(
            (1..=4).contains(&rows),
            "a lock can clear 1 to 4 rows, got {rows}"
        );
        self.lines_cleared += rows;
        let multiplier_tenths = Self::ROW_MULTIPLIER_TENTHS[(rows - 1) as usize]
            + Self::LEVEL_BONUS_TENTHS * u64::from(self.level);
        self.score += u64::from(rows) * Self::BASE_SCORE * multiplier_tenths / 10;
        self.level_progress += rows;
        self.level += self.level_progress / Self::CLEARS_PER_LEVEL;
        self.level_progress %= Self::CLEARS_PER_LEVEL;
    }

    /// The current lock-delay interval: how long a game lets time accumulate before
    /// running a gravity step.
    ///
    /// Starts at one second and shrinks by 100ms per level, never below 100ms.
    pub fn lock_delay(&self) -> Duration {
        Self::LOCK_DELAY_BASE
            .saturating_sub(Self::LOCK_DELAY_STEP * self.level)
            .max(Self::LOCK_DELAY_FLOOR)
    }

    /// Total points scored this round.
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// The current level; rounds start at level 0.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Total rows cleared this round.
    pub const fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }
}
