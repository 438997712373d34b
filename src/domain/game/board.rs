//! Board rule engine: placement, line-of-five detection, undo-by-replay.
//!
//! The board is a value type. `place` returns a new snapshot instead of
//! mutating, so callers can treat any board they hold as immutable; the
//! only path that returns a cell to empty is a full rebuild from a move
//! prefix.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// Board side length.
pub const BOARD_SIZE: usize = 15;

/// Contiguous same-color stones required to win.
pub const WIN_LENGTH: usize = 5;

/// Stone color; Black is always the first mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoneColor {
    Black,
    White,
}

impl StoneColor {
    /// The opposing color.
    pub fn opponent(&self) -> StoneColor {
        match self {
            StoneColor::Black => StoneColor::White,
            StoneColor::White => StoneColor::Black,
        }
    }
}

impl std::fmt::Display for StoneColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoneColor::Black => write!(f, "black"),
            StoneColor::White => write!(f, "white"),
        }
    }
}

/// Board coordinate. Signed so out-of-range client input is representable
/// and rejected rather than wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True if the position lies inside the board.
    pub fn in_bounds(&self) -> bool {
        self.x >= 0
            && self.x < BOARD_SIZE as i32
            && self.y >= 0
            && self.y < BOARD_SIZE as i32
    }
}

/// 15x15 grid of cells. Cheap to clone; every placement produces a
/// structural copy so earlier snapshots stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<StoneColor>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Returns the cell at `pos`, or `None` when out of bounds or empty.
    pub fn cell(&self, pos: Position) -> Option<StoneColor> {
        if !pos.in_bounds() {
            return None;
        }
        self.cells[pos.y as usize][pos.x as usize]
    }

    /// Places a stone, returning the resulting board.
    ///
    /// # Errors
    ///
    /// - `OutOfBounds` when `pos` lies outside the grid
    /// - `CellOccupied` when the target cell already holds a stone
    pub fn place(&self, pos: Position, color: StoneColor) -> Result<Board, DomainError> {
        if !pos.in_bounds() {
            return Err(DomainError::OutOfBounds { x: pos.x, y: pos.y });
        }
        if self.cells[pos.y as usize][pos.x as usize].is_some() {
            return Err(DomainError::CellOccupied { x: pos.x, y: pos.y });
        }

        let mut next = *self;
        next.cells[pos.y as usize][pos.x as usize] = Some(color);
        Ok(next)
    }

    /// Scans the four axes through `last_pos` for a contiguous run of
    /// `color` with length >= `WIN_LENGTH`.
    ///
    /// Returns the entire contiguous run (possibly longer than five),
    /// ordered from one end to the other.
    pub fn check_win(&self, last_pos: Position, color: StoneColor) -> Option<Vec<Position>> {
        const DIRECTIONS: [(i32, i32); 4] = [
            (1, 0),  // horizontal
            (0, 1),  // vertical
            (1, 1),  // diagonal, down-right
            (1, -1), // diagonal, up-right
        ];

        for (dx, dy) in DIRECTIONS {
            let line = self.contiguous_run(last_pos, dx, dy, color);
            if line.len() >= WIN_LENGTH {
                return Some(line);
            }
        }

        None
    }

    /// Collects the contiguous run of `color` through `start` along one
    /// axis, extending in both directions.
    fn contiguous_run(
        &self,
        start: Position,
        dx: i32,
        dy: i32,
        color: StoneColor,
    ) -> Vec<Position> {
        let mut line = vec![start];

        let mut pos = Position::new(start.x + dx, start.y + dy);
        while self.cell(pos) == Some(color) {
            line.push(pos);
            pos = Position::new(pos.x + dx, pos.y + dy);
        }

        let mut pos = Position::new(start.x - dx, start.y - dy);
        while self.cell(pos) == Some(color) {
            line.insert(0, pos);
            pos = Position::new(pos.x - dx, pos.y - dy);
        }

        line
    }

    /// True iff no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_some()))
    }

    /// Deterministic replay of an ordered move prefix onto an empty board.
    ///
    /// The prefix is assumed to have been legal when first played, so
    /// replay writes cells directly rather than re-validating.
    pub fn rebuild(moves: impl IntoIterator<Item = (Position, StoneColor)>) -> Board {
        let mut board = Board::empty();
        for (pos, color) in moves {
            if pos.in_bounds() {
                board.cells[pos.y as usize][pos.x as usize] = Some(color);
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn place_all(board: Board, stones: &[(i32, i32, StoneColor)]) -> Board {
        stones.iter().fold(board, |b, &(x, y, color)| {
            b.place(Position::new(x, y), color).unwrap()
        })
    }

    #[test]
    fn place_rejects_out_of_bounds() {
        let board = Board::empty();
        let err = board
            .place(Position::new(-1, 3), StoneColor::Black)
            .unwrap_err();
        assert_eq!(err, DomainError::OutOfBounds { x: -1, y: 3 });

        let err = board
            .place(Position::new(15, 0), StoneColor::Black)
            .unwrap_err();
        assert_eq!(err, DomainError::OutOfBounds { x: 15, y: 0 });
    }

    #[test]
    fn place_rejects_occupied_cell() {
        let board = Board::empty()
            .place(Position::new(7, 7), StoneColor::Black)
            .unwrap();
        let err = board
            .place(Position::new(7, 7), StoneColor::White)
            .unwrap_err();
        assert_eq!(err, DomainError::CellOccupied { x: 7, y: 7 });
    }

    #[test]
    fn place_does_not_mutate_input_board() {
        let before = Board::empty();
        let after = before
            .place(Position::new(0, 0), StoneColor::Black)
            .unwrap();

        assert_eq!(before.cell(Position::new(0, 0)), None);
        assert_eq!(after.cell(Position::new(0, 0)), Some(StoneColor::Black));
    }

    #[test]
    fn five_in_a_row_horizontal_wins() {
        let board = place_all(
            Board::empty(),
            &[
                (7, 7, StoneColor::Black),
                (8, 7, StoneColor::Black),
                (9, 7, StoneColor::Black),
                (10, 7, StoneColor::Black),
                (11, 7, StoneColor::Black),
            ],
        );

        let line = board
            .check_win(Position::new(11, 7), StoneColor::Black)
            .unwrap();
        assert_eq!(line.len(), 5);
        assert_eq!(line[0], Position::new(7, 7));
        assert_eq!(line[4], Position::new(11, 7));
    }

    #[test]
    fn four_in_a_row_does_not_win() {
        let board = place_all(
            Board::empty(),
            &[
                (7, 7, StoneColor::Black),
                (8, 7, StoneColor::Black),
                (9, 7, StoneColor::Black),
                (10, 7, StoneColor::Black),
            ],
        );

        assert!(board
            .check_win(Position::new(10, 7), StoneColor::Black)
            .is_none());
    }

    #[test]
    fn six_in_a_row_wins_with_full_run_reported() {
        let board = place_all(
            Board::empty(),
            &[
                (2, 2, StoneColor::White),
                (3, 3, StoneColor::White),
                (4, 4, StoneColor::White),
                (5, 5, StoneColor::White),
                (6, 6, StoneColor::White),
                (7, 7, StoneColor::White),
            ],
        );

        // Last stone placed in the middle of the run still finds all six.
        let line = board
            .check_win(Position::new(4, 4), StoneColor::White)
            .unwrap();
        assert_eq!(line.len(), 6);
        assert_eq!(line[0], Position::new(2, 2));
        assert_eq!(line[5], Position::new(7, 7));
    }

    #[test]
    fn vertical_and_antidiagonal_runs_win() {
        let vertical = place_all(
            Board::empty(),
            &[
                (0, 0, StoneColor::Black),
                (0, 1, StoneColor::Black),
                (0, 2, StoneColor::Black),
                (0, 3, StoneColor::Black),
                (0, 4, StoneColor::Black),
            ],
        );
        assert!(vertical
            .check_win(Position::new(0, 2), StoneColor::Black)
            .is_some());

        let antidiagonal = place_all(
            Board::empty(),
            &[
                (3, 10, StoneColor::White),
                (4, 9, StoneColor::White),
                (5, 8, StoneColor::White),
                (6, 7, StoneColor::White),
                (7, 6, StoneColor::White),
            ],
        );
        assert!(antidiagonal
            .check_win(Position::new(5, 8), StoneColor::White)
            .is_some());
    }

    #[test]
    fn run_broken_by_opponent_stone_does_not_win() {
        let board = place_all(
            Board::empty(),
            &[
                (3, 3, StoneColor::Black),
                (4, 3, StoneColor::Black),
                (5, 3, StoneColor::White),
                (6, 3, StoneColor::Black),
                (7, 3, StoneColor::Black),
                (8, 3, StoneColor::Black),
            ],
        );

        assert!(board
            .check_win(Position::new(8, 3), StoneColor::Black)
            .is_none());
    }

    #[test]
    fn empty_board_is_not_full() {
        assert!(!Board::empty().is_full());
    }

    #[test]
    fn board_with_every_cell_set_is_full() {
        let mut board = Board::empty();
        for y in 0..BOARD_SIZE as i32 {
            for x in 0..BOARD_SIZE as i32 {
                // Alternate colors; legality does not matter for is_full.
                let color = if (x + y) % 2 == 0 {
                    StoneColor::Black
                } else {
                    StoneColor::White
                };
                board = board.place(Position::new(x, y), color).unwrap();
            }
        }
        assert!(board.is_full());
    }

    #[test]
    fn rebuild_replays_prefix_exactly() {
        let moves = [
            (Position::new(7, 7), StoneColor::Black),
            (Position::new(8, 8), StoneColor::White),
            (Position::new(7, 8), StoneColor::Black),
        ];

        let rebuilt = Board::rebuild(moves);
        assert_eq!(rebuilt.cell(Position::new(7, 7)), Some(StoneColor::Black));
        assert_eq!(rebuilt.cell(Position::new(8, 8)), Some(StoneColor::White));
        assert_eq!(rebuilt.cell(Position::new(7, 8)), Some(StoneColor::Black));
        assert_eq!(rebuilt.cell(Position::new(0, 0)), None);
    }

    proptest! {
        /// Replaying every move placed so far always reproduces the board
        /// built by incremental placement.
        #[test]
        fn rebuild_matches_incremental_placement(
            raw in proptest::collection::vec((0..15i32, 0..15i32), 1..60)
        ) {
            let mut board = Board::empty();
            let mut moves: Vec<(Position, StoneColor)> = Vec::new();

            for (i, (x, y)) in raw.into_iter().enumerate() {
                let pos = Position::new(x, y);
                let color = if i % 2 == 0 { StoneColor::Black } else { StoneColor::White };
                if let Ok(next) = board.place(pos, color) {
                    board = next;
                    moves.push((pos, color));
                }
            }

            prop_assert_eq!(Board::rebuild(moves), board);
        }

        /// A reported winning line is contiguous, single-colored, and runs
        /// through at least five cells.
        #[test]
        fn winning_line_is_contiguous_and_long_enough(
            x0 in 0..10i32,
            y in 0..15i32,
            extra in 0..2i32,
        ) {
            let mut board = Board::empty();
            let len = 5 + extra;
            for i in 0..len {
                board = board
                    .place(Position::new(x0 + i, y), StoneColor::Black)
                    .unwrap();
            }

            let line = board
                .check_win(Position::new(x0, y), StoneColor::Black)
                .unwrap();
            prop_assert_eq!(line.len() as i32, len);
            for pair in line.windows(2) {
                prop_assert_eq!(pair[1].x - pair[0].x, 1);
                prop_assert_eq!(pair[1].y, pair[0].y);
            }
        }
    }
}
