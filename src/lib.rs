/*!
# Gridfall Engine

`gridfall_engine` is an implementation of a classic falling-block game engine, with a
hidden spawn buffer above the visible field, ghost landing projection and bag
randomization.

The engine is I/O-free: rendering, input binding, audio and the window loop live in the
host application, which drives a [`Game`] through no-argument commands, an elapsed-time
[`Game::advance`] call, and read accessors.

# Examples

```
use std::time::Duration;

use gridfall_engine::{Command, Game};

// Start a reproducible round - the first piece is already spawned.
let mut game = Game::builder().seed(42).build();

// The host input layer translates keypresses to commands;
// commands without a legal effect are silent no-ops.
game.apply(Command::MoveLeft);
game.apply(Command::HardDrop);

// The host loop reports elapsed wall time;
// One gravity step fires per full lock-delay interval.
let feedback = game.advance(Duration::from_millis(1000));
assert!(!feedback.is_empty());

// Renderers read the grid cell by cell.
assert!(game.board().cell((0, 0)).is_empty());
```
*/

#![warn(missing_docs)]

mod game_builder;
mod game_update;
mod score_keeper;
mod tetromino_generator;

use std::time::Duration;

use rand_chacha::ChaCha12Rng;

pub use game_builder::GameBuilder;
pub use score_keeper::ScoreKeeper;
pub use tetromino_generator::TetrominoGenerator;

/// Coordinates used to address the [`Board`], as `(column, row)`.
///
/// Row `0` is the topmost row of the hidden buffer and rows grow downward.
/// Coordinates are signed because a piece's frame anchor may legally sit outside the
/// grid (e.g. left of column `0`) while all of its cells stay inside.
pub type Coord = (i32, i32);
/// Coordinate offsets within a piece's 4x4 local frame, as `(dx, dy)`.
pub type Offset = (i32, i32);
/// The type of horizontal rows of the playing grid.
pub type Row = [Cell; Game::WIDTH];

/// The internal RNG used by a game.
pub type GameRng = ChaCha12Rng;

/// Represents one of the seven "Tetrominos".
///
/// A *tetromino* is a two-dimensional, geometric shape made by
/// connecting four squares along their edges.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tetromino {
    /// 'I'-Tetromino; four cells in a straight line.
    I = 0,
    /// 'Z'-Tetromino; two offset pairs snaking one way.
    Z,
    /// 'S'-Tetromino; two offset pairs snaking the other way.
    S,
    /// 'O'-Tetromino; one solid square.
    O,
    /// 'T'-Tetromino; a bar with a stem in the middle.
    T,
    /// 'L'-Tetromino; a bar with a foot at one end.
    L,
    /// 'J'-Tetromino; the mirrored 'L'.
    J,
}

/// Represents the orientation an active piece can be in.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// North, the spawn orientation.
    N = 0,
    /// East, one clockwise turn from spawn.
    E,
    /// South, two turns from spawn.
    S,
    /// West, one counter-clockwise turn from spawn.
    W,
}

/// What a single [`Board`] cell holds.
///
/// Every occupancy kind is dispatched through this one closed tag; in particular the
/// ghost projection is a cell state, not a separate kind of block.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    /// Nothing here.
    #[default]
    Empty,
    /// A solid block of the given tetromino type; blocks movement of other pieces.
    Solid(Tetromino),
    /// A passable landing-preview marker of the given tetromino type.
    ///
    /// Ghost cells never block movement and are silently overwritten by solid cells.
    Ghost(Tetromino),
}

/// Policy selector for [`Board::is_occupied`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occupancy {
    /// Count any occupant, ghost markers included.
    Any,
    /// Count solid blocks only; this is the collision-relevant policy.
    Solid,
}

/// An active tetromino in play.
///
/// The ghost projection is a second, independent `Piece` value owned by the [`Game`];
/// the two are related only through the engine, never through references to each other.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    /// Type of tetromino the piece is.
    pub tetromino: Tetromino,
    /// In which way the tetromino is currently oriented.
    pub orientation: Orientation,
    /// Grid position of the piece's 4x4 local frame origin.
    pub position: Coord,
}

/// The playing grid: a dumb store of [`Cell`]s with no game rules of its own.
///
/// All invariants (what may be overwritten, when rows compact, ...) are upheld by the
/// [`Game`] that owns the board.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    cells: [Row; Game::HEIGHT],
}

/// Whether a round of play is still running.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStatus {
    /// The round is live and processing commands.
    #[default]
    Playing,
    /// The round is over; terminal until [`Game::new_game`].
    Defeated,
}

/// Represents an abstract game input.
///
/// Each variant corresponds 1:1 to a no-argument method on [`Game`] and can be routed
/// through [`Game::apply`] by a host's input layer.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Moves the piece once to the left.
    MoveLeft = 0,
    /// Moves the piece once to the right.
    MoveRight,
    /// Moves the piece down by one ("soft" drop); resets the lock-delay timer.
    MoveDown,
    /// Moves the piece down until blocked ("hard" drop) without locking it.
    HardDrop,
    /// Rotate the piece by -90° (counter-clockwise).
    RotateLeft,
    /// Rotate the piece by +90° (clockwise).
    RotateRight,
    /// Reset everything and start a fresh round.
    NewGame,
    /// Forfeit the current round.
    EndGame,
    /// Toggle echoing of processed commands as [`Feedback::Debug`].
    ToggleDebug,
}

/// A number of feedback events that can be returned by the game.
///
/// These are drained by [`Game::advance`] and let a host render effects or play sounds
/// without polling for state differences.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    /// A new piece entered the hidden buffer.
    PieceSpawned {
        /// The tetromino type that spawned.
        tetromino: Tetromino,
    },
    /// The active piece came to rest and became part of the stack.
    PieceLocked {
        /// The tetromino type that locked.
        tetromino: Tetromino,
    },
    /// One or more rows were completed and removed.
    LinesCleared {
        /// Row indices that were cleared, bottommost first.
        y_coords: Vec<usize>,
    },
    /// The score keeper banked enough cleared rows to advance the level.
    LevelUp {
        /// The level that was just reached.
        level: u32,
    },
    /// The round ended, by defeat or forfeit.
    GameOver,
    /// Echo of a processed command; only emitted while debug mode is on.
    Debug(Command),
}

/// Main game struct representing a round of play.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Game {
    board: Board,
    active_piece: Option<Piece>,
    ghost_piece: Option<Piece>,
    next_tetromino: Tetromino,
    tetromino_generator: TetrominoGenerator,
    rng: GameRng,
    score_keeper: ScoreKeeper,
    status: GameStatus,
    lock_timer: Duration,
    debug_mode: bool,
    feedback: Vec<Feedback>,
    seed: u64,
}

impl Tetromino {
    /// All `Tetromino` enum variants in order.
    ///
    /// Note that `Tetromino::VARIANTS[t as usize] == t` always holds.
    pub const VARIANTS: [Self; 7] = {
        use Tetromino::*;
        [I, Z, S, O, T, L, J]
    };

    /// Returns the cell offsets of a tetromino within its 4x4 local frame, given an
    /// orientation.
    ///
    /// The offsets are precomputed per orientation rather than derived by rotating a
    /// base shape, and their listed order is fixed: movement and rotation stamp cells
    /// in exactly this order.
    pub const fn offsets(&self, orientation: Orientation) -> [Offset; 4] {
        use Orientation::*;
        match self {
            Tetromino::I => match orientation {
                N => [(0, 1), (1, 1), (2, 1), (3, 1)],
                E => [(2, 0), (2, 1), (2, 2), (2, 3)],
                S => [(3, 2), (2, 2), (1, 2), (0, 2)],
                W => [(1, 3), (1, 2), (1, 1), (1, 0)],
            },
            Tetromino::Z => match orientation {
                N => [(0, 1), (1, 1), (1, 2), (2, 2)],
                E => [(1, 0), (1, 1), (0, 1), (0, 2)],
                S => [(2, 1), (1, 1), (1, 0), (0, 0)],
                W => [(1, 2), (1, 1), (2, 1), (2, 0)],
            },
            Tetromino::S => match orientation {
                N => [(2, 1), (1, 1), (1, 2), (0, 2)],
                E => [(1, 2), (1, 1), (0, 1), (0, 0)],
                S => [(0, 1), (1, 1), (1, 0), (2, 0)],
                W => [(1, 0), (1, 1), (2, 1), (2, 2)],
            },
            Tetromino::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Tetromino::T => match orientation {
                N => [(0, 1), (1, 1), (1, 0), (2, 1)],
                E => [(1, 0), (1, 1), (2, 1), (1, 2)],
                S => [(2, 1), (1, 1), (1, 2), (0, 1)],
                W => [(1, 2), (1, 1), (0, 1), (1, 0)],
            },
            Tetromino::L => match orientation {
                N => [(0, 1), (1, 1), (2, 1), (2, 0)],
                E => [(1, 0), (1, 1), (1, 2), (2, 2)],
                S => [(2, 1), (1, 1), (0, 1), (0, 2)],
                W => [(1, 2), (1, 1), (1, 0), (0, 0)],
            },
            Tetromino::J => match orientation {
                N => [(0, 1), (1, 1), (2, 1), (0, 0)],
                E => [(1, 0), (1, 1), (1, 2), (2, 0)],
                S => [(2, 1), (1, 1), (0, 1), (2, 2)],
                W => [(1, 2), (1, 1), (1, 0), (0, 2)],
            },
        }
    }

    /// Returns the board position at which this tetromino's local frame spawns.
    ///
    /// Every spawn anchor places the piece's entire [`Orientation::N`] footprint inside
    /// the hidden buffer rows.
    pub const fn spawn_position(&self) -> Coord {
        match self {
            Tetromino::I => (3, 2),
            Tetromino::O => (4, 4),
            _ => (3, 3),
        }
    }

    /// Returns the canonical single-letter representation of the tetromino.
    pub const fn glyph(&self) -> char {
        use Tetromino::*;
        match self {
            I => 'I',
            Z => 'Z',
            S => 'S',
            O => 'O',
            T => 'T',
            L => 'L',
            J => 'J',
        }
    }
}

impl Orientation {
    /// All `Orientation` enum variants in order.
    ///
    /// Note that `Orientation::VARIANTS[o as usize] == o` always holds.
    pub const VARIANTS: [Self; 4] = {
        use Orientation::*;
        [N, E, S, W]
    };

    /// Find a new orientation by turning clockwise some number of right angles.
    ///
    /// Negative `right_turns` turn counter-clockwise.
    pub const fn rotated_right(&self, right_turns: i8) -> Self {
        Orientation::VARIANTS[(*self as i16 + right_turns as i16).rem_euclid(4) as usize]
    }
}

impl Cell {
    /// Whether the cell holds nothing at all.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Whether the cell holds a solid block.
    pub const fn is_solid(&self) -> bool {
        matches!(self, Cell::Solid(_))
    }

    /// Whether the cell holds a passable ghost marker.
    pub const fn is_ghost(&self) -> bool {
        matches!(self, Cell::Ghost(_))
    }

    /// The tetromino type stamped into this cell, if any.
    pub const fn tetromino(&self) -> Option<Tetromino> {
        match self {
            Cell::Empty => None,
            Cell::Solid(tetromino) | Cell::Ghost(tetromino) => Some(*tetromino),
        }
    }
}

impl Piece {
    /// Returns the four board coordinates the piece occupies, in stamp order.
    pub fn cells(&self) -> [Coord; 4] {
        let Self {
            tetromino,
            orientation,
            position: (x, y),
        } = self;
        tetromino
            .offsets(*orientation)
            .map(|(dx, dy)| (x + dx, y + dy))
    }
}

impl Board {
    /// Whether a coordinate addresses a cell of the grid.
    pub const fn is_inside((x, y): Coord) -> bool {
        0 <= x && x < Game::WIDTH as i32 && 0 <= y && y < Game::HEIGHT as i32
    }

    /// Read a single cell.
    ///
    /// # Panics
    /// Panics if `coord` is outside the grid; callers bounds-check with
    /// [`Board::is_inside`] first.
    pub fn cell(&self, (x, y): Coord) -> Cell {
        self.cells[y as usize][x as usize]
    }

    /// Read access to all rows, topmost (hidden) row first.
    pub const fn rows(&self) -> &[Row; Game::HEIGHT] {
        &self.cells
    }

    /// Overwrite a single cell unconditionally.
    ///
    /// The caller has already validated that the write is legal; the board never
    /// second-guesses it. In particular solid cells silently overwrite ghost markers.
    ///
    /// # Panics
    /// Panics if `coord` is outside the grid.
    pub fn place(&mut self, (x, y): Coord, cell: Cell) {
        self.cells[y as usize][x as usize] = cell;
    }

    /// Empty a single cell unconditionally.
    ///
    /// # Panics
    /// Panics if `coord` is outside the grid.
    pub fn clear(&mut self, coord: Coord) {
        self.place(coord, Cell::Empty);
    }

    /// Whether a cell counts as occupied under the given policy.
    ///
    /// # Panics
    /// Panics if `coord` is outside the grid.
    pub fn is_occupied(&self, coord: Coord, occupancy: Occupancy) -> bool {
        match (self.cell(coord), occupancy) {
            (Cell::Empty, _) => false,
            (Cell::Solid(_), _) => true,
            (Cell::Ghost(_), Occupancy::Any) => true,
            (Cell::Ghost(_), Occupancy::Solid) => false,
        }
    }

    /// Remove the given full rows and shift everything above them down.
    ///
    /// `full_rows` holds distinct row indices in any order. Each removed row pulls all
    /// rows above it down by one and leaves a blank row at the top; cell tags move
    /// wholesale, their logical row index being the only notion of position.
    pub fn compact(&mut self, full_rows: &[usize]) {
        let mut rows = full_rows.to_vec();
        // Removing topmost-first keeps the later indices stable.
        rows.sort_unstable();
        for &y in &rows {
            self.cells[..=y].rotate_right(1);
            self.cells[0] = [Cell::Empty; Game::WIDTH];
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [[Cell::Empty; Game::WIDTH]; Game::HEIGHT],
        }
    }
}

impl Game {
    /// The game field width.
    pub const WIDTH: usize = 10;
    /// The total grid height, hidden buffer included.
    pub const HEIGHT: usize = 26;
    /// The number of hidden buffer rows above the visible field in which pieces spawn.
    ///
    /// A piece locking with any solid cell still inside the bottommost hidden row ends
    /// the round.
    pub const HIDDEN_ROWS: usize = 6;
    /// The height of the visible playing field.
    pub const VISIBLE_ROWS: usize = Self::HEIGHT - Self::HIDDEN_ROWS;

    /// Creates a blank new template representing a yet-to-be-started [`Game`] ready for
    /// configuration.
    pub fn builder() -> GameBuilder {
        GameBuilder::default()
    }

    /// Creates a randomly seeded game with default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Read accessor for the playing grid.
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Read accessor for the piece currently in play, if any.
    pub const fn active_piece(&self) -> Option<&Piece> {
        self.active_piece.as_ref()
    }

    /// Read accessor for the current ghost projection, if any.
    pub const fn ghost_piece(&self) -> Option<&Piece> {
        self.ghost_piece.as_ref()
    }

    /// The tetromino type that will spawn after the active piece locks.
    pub const fn next_tetromino(&self) -> Tetromino {
        self.next_tetromino
    }

    /// Read accessor for score, level and cleared-row accounting.
    pub const fn score_keeper(&self) -> &ScoreKeeper {
        &self.score_keeper
    }

    /// Whether the round is still running.
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// The value the game's PRNG was seeded with.
    ///
    /// Rebuilding with the same seed and generator reproduces the whole session.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether processed commands are currently echoed as [`Feedback::Debug`].
    pub const fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Resets all round state and immediately starts a new round with a fresh first
    /// piece.
    ///
    /// The PRNG stream is not rewound: consecutive rounds see fresh piece sequences
    /// while the session as a whole stays reproducible from [`Game::seed`]. The debug
    /// flag survives, being host tooling rather than round state.
    pub fn new_game(&mut self) {
        self.board = Board::default();
        self.active_piece = None;
        self.ghost_piece = None;
        self.tetromino_generator.reset();
        self.score_keeper = ScoreKeeper::default();
        self.status = GameStatus::Playing;
        self.lock_timer = Duration::ZERO;
        self.feedback.clear();
        self.next_tetromino = self.tetromino_generator.draw(&mut self.rng);
        self.spawn_piece();
    }

    /// Immediately ends the current round as a forced defeat.
    ///
    /// The stack (and the active piece's solid cells) stays on the board for display;
    /// all further commands besides [`Game::new_game`] become no-ops.
    pub fn end_game(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.clear_ghost();
        self.active_piece = None;
        self.status = GameStatus::Defeated;
        self.feedback.push(Feedback::GameOver);
    }

    /// Toggles debug mode.
    ///
    /// While on, every command processed through [`Game::apply`] is echoed as
    /// [`Feedback::Debug`].
    pub fn toggle_debug(&mut self) {
        self.debug_mode = !self.debug_mode;
    }

    /// Renders the grid as multiline text, one row per line.
    ///
    /// Solid cells show as their tetromino letter, ghost cells as `+`, empty cells as
    /// `.`; a dashed line separates the hidden buffer from the visible field. Intended
    /// for debug dumps, with any printing left to the host.
    pub fn dump_grid(&self) -> String {
        let mut out = String::with_capacity((Game::WIDTH + 1) * (Game::HEIGHT + 1));
        for (y, row) in self.board.rows().iter().enumerate() {
            if y == Game::HIDDEN_ROWS {
                for _ in 0..Game::WIDTH {
                    out.push('-');
                }
                out.push('\n');
            }
            for cell in row {
                out.push(match cell {
                    Cell::Empty => '.',
                    Cell::Solid(tetromino) => tetromino.glyph(),
                    Cell::Ghost(_) => '+',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Command {
    /// All `Command` enum variants in order.
    ///
    /// Note that `Command::VARIANTS[c as usize] == c` always holds.
    pub const VARIANTS: [Self; 9] = {
        use Command::*;
        [
            MoveLeft,
            MoveRight,
            MoveDown,
            HardDrop,
            RotateLeft,
            RotateRight,
            NewGame,
            EndGame,
            ToggleDebug,
        ]
    };
}

/// Checks whether all `candidates` cells are available for `piece` to occupy.
///
/// A cell is available if it lies between the walls, above the floor, and is not
/// solidly occupied by anything other than `piece` itself; ghost markers and the
/// piece's own current cells never block. The check is stateless with respect to the
/// piece: callers pass whatever candidate footprint (shifted, rotated) they intend.
pub fn piece_fits(board: &Board, piece: &Piece, candidates: [Coord; 4]) -> bool {
    let own_cells = piece.cells();
    candidates.iter().all(|&coord| {
        Board::is_inside(coord)
            && (!board.is_occupied(coord, Occupancy::Solid) || own_cells.contains(&coord))
    })
}
