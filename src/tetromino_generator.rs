/*!
Infinite suppliers of [`Tetromino`]s.
*/

use rand::{seq::SliceRandom, Rng};

use super::*;

/// Represents a rule by which the next tetromino to spawn is chosen.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TetrominoGenerator {
    /// Repeatedly draws from a shuffled pool of all seven types, refilling the pool
    /// whenever it runs dry.
    ///
    /// A dry spell for any one type can last at most twelve draws, and every window
    /// of seven draws aligned to a refill is a permutation of all seven types.
    Bag {
        /// Tetrominos remaining in the current pool, dealt back to front.
        pool: Vec<Tetromino>,
    },
    /// Replays a fixed, non-empty sequence forever, wrapping around at the end.
    ///
    /// Useful for tests and scripted scenarios where the piece order must be exact.
    Scripted {
        /// The looped sequence.
        sequence: Vec<Tetromino>,
        /// Index of the next element to deal.
        index: usize,
    },
}

impl TetrominoGenerator {
    /// Creates the default, bag-based generator with an empty pool.
    pub const fn bag() -> Self {
        Self::Bag { pool: Vec::new() }
    }

    /// Creates a generator that replays `sequence` forever.
    ///
    /// Returns `None` if `sequence` is empty, as that leaves nothing to deal.
    pub fn scripted(sequence: Vec<Tetromino>) -> Option<Self> {
        if sequence.is_empty() {
            None
        } else {
            Some(Self::Scripted { sequence, index: 0 })
        }
    }

    /// Deals the next tetromino, using `rng` for any randomness required.
    ///
    /// The RNG is borrowed rather than owned so a game can feed every random decision
    /// from its one seeded stream.
    pub fn draw(&mut self, rng: &mut impl Rng) -> Tetromino {
        match self {
            Self::Bag { pool } => {
                if pool.is_empty() {
                    pool.extend_from_slice(&Tetromino::VARIANTS);
                    pool.shuffle(rng);
                }
                pool.pop().expect("bag pool refilled yet empty")
            }
            Self::Scripted { sequence, index } => {
                let tetromino = sequence[*index];
                *index = (*index + 1) % sequence.len();
                tetromino
            }
        }
    }

    /// Forgets all draw state, as if freshly constructed.
    ///
    /// A bag discards its part-used pool; a scripted sequence rewinds to the start.
    pub fn reset(&mut self) {
        match self {
            Self::Bag { pool } => pool.clear(),
            Self::Scripted { index, .. } => *index = 0,
        }
    }
}

impl Default for TetrominoGenerator {
    fn default() -> Self {
        Self::bag()
    }
}
