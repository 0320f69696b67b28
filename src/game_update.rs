/*!
Internal module for time advancement and command handling on a [`Game`].
*/

use super::*;

impl Game {
    /// Informs the game that `elapsed` wall time has passed since the last call and
    /// returns the feedback events accumulated in the meantime.
    ///
    /// Once the accumulated time reaches the current lock-delay interval the
    /// accumulator resets and a single gravity step runs: the active piece descends
    /// one row, or locks if it cannot. While defeated, time no longer accumulates but
    /// pending feedback is still drained.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Feedback> {
        if self.status == GameStatus::Playing {
            self.lock_timer += elapsed;
            if self.lock_timer >= self.score_keeper.lock_delay() {
                self.lock_timer = Duration::ZERO;
                self.tick();
            }
        }
        std::mem::take(&mut self.feedback)
    }

    /// Routes a [`Command`] to its corresponding game method.
    ///
    /// In debug mode each processed command is additionally echoed as
    /// [`Feedback::Debug`], the echo landing after whatever feedback the command
    /// itself produced. The echo follows the handler, so switching debug on already
    /// echoes the switching command itself.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::MoveDown => self.move_down(),
            Command::HardDrop => self.hard_drop(),
            Command::RotateLeft => self.rotate_left(),
            Command::RotateRight => self.rotate_right(),
            Command::NewGame => self.new_game(),
            Command::EndGame => self.end_game(),
            Command::ToggleDebug => self.toggle_debug(),
        }
        if self.debug_mode {
            self.feedback.push(Feedback::Debug(command));
        }
    }

    /// Moves the active piece one column to the left, if nothing blocks it.
    pub fn move_left(&mut self) {
        if self.try_shift(-1, 0) {
            self.refresh_ghost();
        }
    }

    /// Moves the active piece one column to the right, if nothing blocks it.
    pub fn move_right(&mut self) {
        if self.try_shift(1, 0) {
            self.refresh_ghost();
        }
    }

    /// Moves the active piece down one row ("soft drop").
    ///
    /// A successful descent restarts the lock-delay interval, the piece having
    /// demonstrably not come to rest yet.
    pub fn move_down(&mut self) {
        if self.try_shift(0, 1) {
            self.lock_timer = Duration::ZERO;
        }
    }

    /// Drops the active piece straight down until something blocks it.
    ///
    /// The piece is left resting, not locked: locking stays with the gravity tick, so
    /// a hard-dropped piece can still be slid and rotated during its lock delay.
    pub fn hard_drop(&mut self) {
        let mut dropped = false;
        while self.try_shift(0, 1) {
            dropped = true;
        }
        if dropped {
            self.lock_timer = Duration::ZERO;
        }
    }

    /// Rotates the active piece a quarter turn counter-clockwise, if the turned
    /// footprint fits.
    pub fn rotate_left(&mut self) {
        self.try_rotate(-1);
    }

    /// Rotates the active piece a quarter turn clockwise, if the turned footprint
    /// fits.
    pub fn rotate_right(&mut self) {
        self.try_rotate(1);
    }

    /// One gravity step: the piece descends one row, or locks where it rests.
    fn tick(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        if self.active_piece.is_none() {
            self.spawn_piece();
            return;
        }
        if !self.try_shift(0, 1) {
            self.lock_piece();
        }
    }

    /// Attempts to translate the active piece by one step, reporting success.
    ///
    /// Movement is two-pass: the destination is validated against the grid with the
    /// piece's own cells exempt, and only then are the old cells vacated and the new
    /// ones stamped. Self-overlapping steps thus work without special cases, and an
    /// illegal step leaves the grid untouched.
    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        if self.status != GameStatus::Playing {
            return false;
        }
        let Some(mut piece) = self.active_piece else {
            return false;
        };
        let destination = piece.cells().map(|(x, y)| (x + dx, y + dy));
        if !piece_fits(&self.board, &piece, destination) {
            return false;
        }
        for cell in piece.cells() {
            self.board.clear(cell);
        }
        piece.position = (piece.position.0 + dx, piece.position.1 + dy);
        for cell in piece.cells() {
            self.board.place(cell, Cell::Solid(piece.tetromino));
        }
        self.active_piece = Some(piece);
        true
    }

    /// Attempts to re-orient the active piece in place; no wall kicks are tried.
    ///
    /// The frame anchor stays fixed: a rotation either succeeds exactly where the
    /// piece stands or leaves it untouched.
    fn try_rotate(&mut self, right_turns: i8) {
        if self.status != GameStatus::Playing {
            return;
        }
        let Some(piece) = self.active_piece else {
            return;
        };
        let mut turned = piece;
        turned.orientation = piece.orientation.rotated_right(right_turns);
        if !piece_fits(&self.board, &piece, turned.cells()) {
            return;
        }
        for cell in piece.cells() {
            self.board.clear(cell);
        }
        for cell in turned.cells() {
            self.board.place(cell, Cell::Solid(turned.tetromino));
        }
        self.active_piece = Some(turned);
        self.refresh_ghost();
    }

    /// Finalizes the resting piece and runs the lock sequence: defeat check, then row
    /// clears and scoring, then the next spawn.
    ///
    /// The order matters. A piece locking with solid cells still in the bottommost
    /// hidden row ends the round before any rows clear, and scoring uses the level
    /// reached before this clear is banked.
    fn lock_piece(&mut self) {
        self.clear_ghost();
        let Some(piece) = self.active_piece.take() else {
            return;
        };
        self.feedback.push(Feedback::PieceLocked {
            tetromino: piece.tetromino,
        });

        let buffer_floor = Game::HIDDEN_ROWS as i32 - 1;
        let defeated = (0..Game::WIDTH as i32)
            .any(|x| self.board.is_occupied((x, buffer_floor), Occupancy::Solid));
        if defeated {
            self.status = GameStatus::Defeated;
            self.feedback.push(Feedback::GameOver);
            return;
        }

        // Hidden rows hold no stack cells at this point, only the visible region can
        // have completed rows.
        let full_rows: Vec<usize> = (Game::HIDDEN_ROWS..Game::HEIGHT)
            .rev()
            .filter(|&y| self.board.rows()[y].iter().all(Cell::is_solid))
            .collect();
        if !full_rows.is_empty() {
            self.board.compact(&full_rows);
            let level_before = self.score_keeper.level();
            self.score_keeper
                .register_clear(full_rows.len() as u32);
            self.feedback.push(Feedback::LinesCleared {
                y_coords: full_rows,
            });
            let level = self.score_keeper.level();
            if level > level_before {
                self.feedback.push(Feedback::LevelUp { level });
            }
        }

        self.spawn_piece();
    }

    /// Takes the queued tetromino into play, stamping it into the hidden buffer, and
    /// draws a new "next" from the generator.
    ///
    /// By the time this runs the defeat check has passed, so the buffer rows the
    /// footprint lands on hold no stack cells and the write is unconditional.
    pub(crate) fn spawn_piece(&mut self) {
        let tetromino = self.next_tetromino;
        self.next_tetromino = self.tetromino_generator.draw(&mut self.rng);
        let piece = Piece {
            tetromino,
            orientation: Orientation::N,
            position: tetromino.spawn_position(),
        };
        for cell in piece.cells() {
            self.board.place(cell, Cell::Solid(tetromino));
        }
        self.active_piece = Some(piece);
        self.feedback.push(Feedback::PieceSpawned { tetromino });
        self.refresh_ghost();
    }

    /// Recomputes the landing projection for the active piece.
    ///
    /// The old markers are wiped first, then the piece is projected straight down to
    /// its resting position and ghost markers are written into the grid, skipping any
    /// cell the piece itself occupies.
    fn refresh_ghost(&mut self) {
        self.clear_ghost();
        let Some(piece) = self.active_piece else {
            return;
        };
        let mut descent = 0;
        while piece_fits(
            &self.board,
            &piece,
            piece.cells().map(|(x, y)| (x, y + descent + 1)),
        ) {
            descent += 1;
        }
        let mut ghost = piece;
        ghost.position = (piece.position.0, piece.position.1 + descent);
        let own_cells = piece.cells();
        for cell in ghost.cells() {
            if !own_cells.contains(&cell) {
                self.board.place(cell, Cell::Ghost(ghost.tetromino));
            }
        }
        self.ghost_piece = Some(ghost);
    }

    /// Removes the current ghost markers from the grid.
    ///
    /// Only cells still tagged as ghosts are wiped; any marker that a solid block has
    /// since overwritten stays as it is.
    pub(crate) fn clear_ghost(&mut self) {
        if let Some(ghost) = self.ghost_piece.take() {
            for cell in ghost.cells() {
                if self.board.cell(cell).is_ghost() {
                    self.board.clear(cell);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCK_TICK: Duration = Duration::from_millis(1000);

    fn scripted_game(sequence: &[Tetromino]) -> Game {
        let generator =
            TetrominoGenerator::scripted(sequence.to_vec()).expect("test sequence is non-empty");
        Game::builder()
            .seed(0)
            .tetromino_generator(generator)
            .build()
    }

    #[test]
    fn gravity_tick_descends_then_locks() {
        let mut game = scripted_game(&[Tetromino::T]);
        let spawn_y = game.active_piece().expect("piece in play").position.1;

        let feedback = game.advance(LOCK_TICK);
        assert_eq!(
            game.active_piece().expect("piece in play").position.1,
            spawn_y + 1
        );
        assert!(!feedback.contains(&Feedback::PieceLocked {
            tetromino: Tetromino::T
        }));

        game.hard_drop();
        let feedback = game.advance(LOCK_TICK);
        assert!(feedback.contains(&Feedback::PieceLocked {
            tetromino: Tetromino::T
        }));
        assert!(feedback.contains(&Feedback::PieceSpawned {
            tetromino: Tetromino::T
        }));
    }

    #[test]
    fn completed_rows_clear_and_score() {
        let mut game = scripted_game(&[Tetromino::I]);
        let bottom = Game::HEIGHT - 1;
        // Leave exactly the I-shaped hole at columns 3..=6.
        for x in 0..Game::WIDTH as i32 {
            if !(3..=6).contains(&x) {
                game.board.place((x, bottom as i32), Cell::Solid(Tetromino::O));
            }
        }

        game.hard_drop();
        let feedback = game.advance(LOCK_TICK);

        assert!(feedback.contains(&Feedback::LinesCleared {
            y_coords: vec![bottom]
        }));
        assert_eq!(game.score_keeper().score(), 100);
        assert_eq!(game.score_keeper().lines_cleared(), 1);
        assert_eq!(game.score_keeper().level(), 0);
        // The stack is gone; only the fresh spawn and its ghost markers remain.
        for y in Game::HIDDEN_ROWS..Game::HEIGHT {
            for x in 0..Game::WIDTH as i32 {
                assert!(!game.board.cell((x, y as i32)).is_solid());
            }
        }
    }

    #[test]
    fn locking_in_the_buffer_defeats() {
        let mut game = scripted_game(&[Tetromino::O]);
        // Wall off the spawn columns so the O can never leave the buffer.
        for y in Game::HIDDEN_ROWS..Game::HEIGHT {
            game.board.place((4, y as i32), Cell::Solid(Tetromino::T));
            game.board.place((5, y as i32), Cell::Solid(Tetromino::T));
        }

        let feedback = game.advance(LOCK_TICK);

        assert_eq!(game.status(), GameStatus::Defeated);
        assert!(feedback.contains(&Feedback::GameOver));
        assert!(game.active_piece().is_none());
        assert!(game.ghost_piece().is_none());

        // Defeat is terminal: commands are inert until a new round starts.
        let stack = game.board.clone();
        game.apply(Command::MoveLeft);
        game.apply(Command::HardDrop);
        game.apply(Command::RotateRight);
        assert_eq!(game.board, stack);
        assert_eq!(game.status(), GameStatus::Defeated);
    }

    #[test]
    fn soft_drop_restarts_the_lock_delay() {
        let mut game = scripted_game(&[Tetromino::T]);
        let spawn_y = game.active_piece().expect("piece in play").position.1;

        game.advance(Duration::from_millis(600));
        game.move_down();
        assert_eq!(
            game.active_piece().expect("piece in play").position.1,
            spawn_y + 1
        );

        // Without the restart this would cross the 1000ms interval and tick.
        game.advance(Duration::from_millis(600));
        assert_eq!(
            game.active_piece().expect("piece in play").position.1,
            spawn_y + 1
        );

        game.advance(Duration::from_millis(400));
        assert_eq!(
            game.active_piece().expect("piece in play").position.1,
            spawn_y + 2
        );
    }

    #[test]
    fn hard_drop_leaves_the_piece_active() {
        let mut game = scripted_game(&[Tetromino::T]);

        game.advance(Duration::from_millis(900));
        game.hard_drop();
        let resting = game.active_piece().expect("piece in play").position;
        assert_eq!(resting.1, Game::HEIGHT as i32 - 2);

        // The drop restarted the interval, so 900ms later nothing has locked and the
        // piece can still be slid along the floor.
        let feedback = game.advance(Duration::from_millis(900));
        assert!(!feedback.contains(&Feedback::PieceLocked {
            tetromino: Tetromino::T
        }));
        game.move_left();
        assert_eq!(
            game.active_piece().expect("piece in play").position,
            (resting.0 - 1, resting.1)
        );

        let feedback = game.advance(Duration::from_millis(100));
        assert!(feedback.contains(&Feedback::PieceLocked {
            tetromino: Tetromino::T
        }));
    }

    #[test]
    fn rotation_round_trips_in_an_open_field() {
        for tetromino in Tetromino::VARIANTS {
            let mut game = scripted_game(&[tetromino]);
            game.move_down();
            game.move_down();
            let before = *game.active_piece().expect("piece in play");

            game.rotate_right();
            game.rotate_left();

            let after = *game.active_piece().expect("piece in play");
            assert_eq!(before, after, "{tetromino:?} did not round-trip");
            assert_eq!(before.cells(), after.cells());
        }
    }

    #[test]
    fn rotation_has_no_wall_kicks() {
        let mut game = scripted_game(&[Tetromino::I]);
        game.rotate_right();
        for _ in 0..5 {
            game.move_left();
        }
        let piece = *game.active_piece().expect("piece in play");
        assert_eq!(piece.orientation, Orientation::E);
        assert_eq!(piece.position, (-2, 2));

        // Hugging the wall: a further turn would poke out of bounds, and without
        // kicks it is simply refused.
        game.move_left();
        game.rotate_right();
        let piece = *game.active_piece().expect("piece in play");
        assert_eq!(piece.orientation, Orientation::E);
        assert_eq!(piece.position, (-2, 2));
    }

    #[test]
    fn ghost_markers_follow_the_piece() {
        let mut game = scripted_game(&[Tetromino::O]);
        let bottom = Game::HEIGHT as i32 - 1;
        for x in [4, 5] {
            assert!(game.board.cell((x, bottom)).is_ghost());
            assert!(game.board.cell((x, bottom - 1)).is_ghost());
        }

        game.move_left();
        for y in [bottom - 1, bottom] {
            assert!(game.board.cell((3, y)).is_ghost());
            assert!(game.board.cell((4, y)).is_ghost());
            assert!(!game.board.cell((5, y)).is_ghost());
        }
        assert_eq!(
            game.ghost_piece().expect("ghost in play").position,
            (3, bottom - 1)
        );
    }

    #[test]
    fn ghost_markers_sit_on_top_of_the_stack() {
        let mut game = scripted_game(&[Tetromino::O]);
        game.hard_drop();
        game.advance(LOCK_TICK);

        // The first O locked at the bottom; the second projects onto it.
        let bottom = Game::HEIGHT as i32 - 1;
        for x in [4, 5] {
            assert!(game.board.cell((x, bottom)).is_solid());
            assert!(game.board.cell((x, bottom - 1)).is_solid());
            assert!(game.board.cell((x, bottom - 2)).is_ghost());
            assert!(game.board.cell((x, bottom - 3)).is_ghost());
        }
        assert_eq!(
            game.ghost_piece().expect("ghost in play").position,
            (4, bottom - 3)
        );
    }

    #[test]
    fn new_game_resets_the_round_but_not_the_host_switches() {
        let mut game = scripted_game(&[Tetromino::I, Tetromino::O]);
        game.hard_drop();
        game.advance(LOCK_TICK);
        game.toggle_debug();

        game.apply(Command::NewGame);

        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.score_keeper().score(), 0);
        assert_eq!(game.score_keeper().lines_cleared(), 0);
        assert!(game.debug_mode());
        assert_eq!(
            game.active_piece().expect("piece in play").tetromino,
            Tetromino::I
        );
        for y in Game::HIDDEN_ROWS..Game::HEIGHT {
            for x in 0..Game::WIDTH as i32 {
                assert!(!game.board.cell((x, y as i32)).is_solid());
            }
        }

        let feedback = game.advance(Duration::ZERO);
        assert!(feedback.contains(&Feedback::Debug(Command::NewGame)));
        assert!(feedback.contains(&Feedback::PieceSpawned {
            tetromino: Tetromino::I
        }));
    }
}
