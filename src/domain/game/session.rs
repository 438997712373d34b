//! Game session: a single match with turn state, move history, a turn
//! clock, and termination handling.
//!
//! # Invariants
//!
//! - Black (the host seat) always moves first.
//! - Move sequence numbers are strictly increasing and equal the history
//!   length once the move is appended.
//! - A cell only returns to empty through `undo`, which rebuilds the board
//!   from the retained prefix rather than patching cells.
//! - Terminal transitions are idempotent: once `Finished`, further
//!   timeout/surrender/disconnect signals are no-ops so a result is never
//!   double-counted.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, GameId, RoomId, Timestamp};
use crate::domain::game::board::{Board, Position, StoneColor};

/// One placed stone in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub position: Position,
    pub color: StoneColor,
    pub sequence_number: u32,
    pub timestamp: Timestamp,
}

/// Who won a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Black,
    White,
    Draw,
}

impl From<StoneColor> for Winner {
    fn from(color: StoneColor) -> Self {
        match color {
            StoneColor::Black => Winner::Black,
            StoneColor::White => Winner::White,
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    FiveInARow,
    Timeout,
    Surrender,
    Disconnect,
    BoardFull,
}

/// Final outcome of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub winner: Winner,
    pub reason: GameEndReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<Vec<Position>>,
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Finished,
}

/// Outcome of a successful move: the appended move plus the terminal
/// result when the move ended the game.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub mv: Move,
    pub result: Option<GameResult>,
}

/// One in-progress or finished match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    id: GameId,
    room_id: RoomId,
    board: Board,
    color_to_move: StoneColor,
    moves: Vec<Move>,
    status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<GameResult>,
    turn_limit_secs: u32,
    turn_remaining_secs: u32,
    created_at: Timestamp,
}

impl GameSession {
    /// Creates an active session with Black to move.
    pub fn new(room_id: RoomId, turn_limit_secs: u32) -> Self {
        Self {
            id: GameId::new(),
            room_id,
            board: Board::empty(),
            color_to_move: StoneColor::Black,
            moves: Vec::new(),
            status: SessionStatus::Active,
            result: None,
            turn_limit_secs,
            turn_remaining_secs: turn_limit_secs,
            created_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn color_to_move(&self) -> StoneColor {
        self.color_to_move
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn turn_limit_secs(&self) -> u32 {
        self.turn_limit_secs
    }

    pub fn turn_remaining_secs(&self) -> u32 {
        self.turn_remaining_secs
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Places a stone for `color`.
    ///
    /// Win is evaluated before draw, so filling the last cell with a
    /// five-in-a-row scores as a win. On a non-terminal move the turn flips
    /// and the turn clock resets.
    ///
    /// # Errors
    ///
    /// - `GameFinished` when the session is no longer active
    /// - `NotYourTurn` when `color` is not the color to move
    /// - `OutOfBounds` / `CellOccupied` from the board engine
    pub fn apply_move(
        &mut self,
        color: StoneColor,
        pos: Position,
    ) -> Result<MoveOutcome, DomainError> {
        if self.status != SessionStatus::Active {
            return Err(DomainError::GameFinished);
        }
        if color != self.color_to_move {
            return Err(DomainError::NotYourTurn);
        }

        self.board = self.board.place(pos, color)?;

        let mv = Move {
            position: pos,
            color,
            sequence_number: self.moves.len() as u32 + 1,
            timestamp: Timestamp::now(),
        };
        self.moves.push(mv);

        let result = if let Some(line) = self.board.check_win(pos, color) {
            Some(GameResult {
                winner: color.into(),
                reason: GameEndReason::FiveInARow,
                winning_line: Some(line),
            })
        } else if self.board.is_full() {
            Some(GameResult {
                winner: Winner::Draw,
                reason: GameEndReason::BoardFull,
                winning_line: None,
            })
        } else {
            None
        };

        match &result {
            Some(r) => {
                self.status = SessionStatus::Finished;
                self.result = Some(r.clone());
            }
            None => {
                self.color_to_move = color.opponent();
                self.turn_remaining_secs = self.turn_limit_secs;
            }
        }

        Ok(MoveOutcome { mv, result })
    }

    /// Removes the last `count` moves and rebuilds the board from the
    /// remaining prefix. Returns the removed moves, oldest first.
    ///
    /// The color to move becomes the opposite of the last remaining move's
    /// color, or Black when no moves remain.
    ///
    /// # Errors
    ///
    /// - `GameFinished` when the session is no longer active
    /// - `InsufficientHistory` when `count` exceeds the history length
    pub fn undo(&mut self, count: usize) -> Result<Vec<Move>, DomainError> {
        if self.status != SessionStatus::Active {
            return Err(DomainError::GameFinished);
        }
        if count > self.moves.len() {
            return Err(DomainError::InsufficientHistory {
                requested: count,
                available: self.moves.len(),
            });
        }

        let removed = self.moves.split_off(self.moves.len() - count);
        self.board = Board::rebuild(self.moves.iter().map(|m| (m.position, m.color)));
        self.color_to_move = match self.moves.last() {
            Some(last) => last.color.opponent(),
            None => StoneColor::Black,
        };
        self.turn_remaining_secs = self.turn_limit_secs;

        Ok(removed)
    }

    /// Decrements the turn clock by one second, returning the remainder.
    ///
    /// Does nothing once finished; the caller decides when a drained clock
    /// becomes a timeout.
    pub fn tick_second(&mut self) -> u32 {
        if self.status == SessionStatus::Active {
            self.turn_remaining_secs = self.turn_remaining_secs.saturating_sub(1);
        }
        self.turn_remaining_secs
    }

    /// The side whose clock ran out loses. No-op when already finished.
    pub fn timeout(&mut self) -> Option<GameResult> {
        self.finish_with(GameResult {
            winner: self.color_to_move.opponent().into(),
            reason: GameEndReason::Timeout,
            winning_line: None,
        })
    }

    /// `color` concedes; the opponent wins. No-op when already finished.
    pub fn surrender(&mut self, color: StoneColor) -> Option<GameResult> {
        self.finish_with(GameResult {
            winner: color.opponent().into(),
            reason: GameEndReason::Surrender,
            winning_line: None,
        })
    }

    /// `color` dropped its connection mid-game; scored like a surrender
    /// with a distinct reason tag for display. No-op when already finished.
    pub fn disconnect(&mut self, color: StoneColor) -> Option<GameResult> {
        self.finish_with(GameResult {
            winner: color.opponent().into(),
            reason: GameEndReason::Disconnect,
            winning_line: None,
        })
    }

    fn finish_with(&mut self, result: GameResult) -> Option<GameResult> {
        if self.status != SessionStatus::Active {
            return None;
        }
        self.status = SessionStatus::Finished;
        self.result = Some(result.clone());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(RoomId::new(), 60)
    }

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn black_moves_first() {
        let s = session();
        assert_eq!(s.color_to_move(), StoneColor::Black);
        assert!(s.is_active());
    }

    #[test]
    fn apply_move_rejects_wrong_turn() {
        let mut s = session();
        let err = s.apply_move(StoneColor::White, pos(7, 7)).unwrap_err();
        assert_eq!(err, DomainError::NotYourTurn);
    }

    #[test]
    fn apply_move_flips_turn_and_resets_clock() {
        let mut s = session();
        s.tick_second();
        assert_eq!(s.turn_remaining_secs(), 59);

        let outcome = s.apply_move(StoneColor::Black, pos(7, 7)).unwrap();
        assert!(outcome.result.is_none());
        assert_eq!(outcome.mv.sequence_number, 1);
        assert_eq!(s.color_to_move(), StoneColor::White);
        assert_eq!(s.turn_remaining_secs(), 60);
    }

    #[test]
    fn sequence_numbers_strictly_increase() {
        let mut s = session();
        s.apply_move(StoneColor::Black, pos(0, 0)).unwrap();
        s.apply_move(StoneColor::White, pos(1, 0)).unwrap();
        let outcome = s.apply_move(StoneColor::Black, pos(2, 0)).unwrap();

        assert_eq!(outcome.mv.sequence_number, 3);
        assert_eq!(s.moves().len(), 3);
        assert!(s
            .moves()
            .windows(2)
            .all(|w| w[1].sequence_number == w[0].sequence_number + 1));
    }

    #[test]
    fn fifth_stone_in_a_row_finishes_the_game() {
        let mut s = session();
        // Black builds (7,7)..(11,7); White answers on another row.
        for i in 0..4 {
            s.apply_move(StoneColor::Black, pos(7 + i, 7)).unwrap();
            s.apply_move(StoneColor::White, pos(7 + i, 0)).unwrap();
        }
        let outcome = s.apply_move(StoneColor::Black, pos(11, 7)).unwrap();

        let result = outcome.result.unwrap();
        assert_eq!(result.winner, Winner::Black);
        assert_eq!(result.reason, GameEndReason::FiveInARow);
        let line = result.winning_line.unwrap();
        assert_eq!(line.len(), 5);
        assert_eq!(line[0], pos(7, 7));
        assert_eq!(line[4], pos(11, 7));
        assert!(!s.is_active());
        // Turn does not flip on a terminal move.
        assert_eq!(s.color_to_move(), StoneColor::Black);
    }

    #[test]
    fn undo_restores_board_and_turn() {
        let mut s = session();
        s.apply_move(StoneColor::Black, pos(7, 7)).unwrap();
        s.apply_move(StoneColor::White, pos(8, 8)).unwrap();
        s.apply_move(StoneColor::Black, pos(9, 9)).unwrap();

        let removed = s.undo(2).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].position, pos(8, 8));
        assert_eq!(removed[1].position, pos(9, 9));

        assert_eq!(s.moves().len(), 1);
        assert_eq!(s.board().cell(pos(8, 8)), None);
        assert_eq!(s.board().cell(pos(9, 9)), None);
        assert_eq!(s.board().cell(pos(7, 7)), Some(StoneColor::Black));
        // Last remaining move is Black's, so White moves next.
        assert_eq!(s.color_to_move(), StoneColor::White);
    }

    #[test]
    fn undo_everything_returns_turn_to_black() {
        let mut s = session();
        s.apply_move(StoneColor::Black, pos(0, 0)).unwrap();
        s.apply_move(StoneColor::White, pos(1, 1)).unwrap();

        s.undo(2).unwrap();
        assert!(s.moves().is_empty());
        assert_eq!(s.color_to_move(), StoneColor::Black);
        assert_eq!(*s.board(), Board::empty());
    }

    #[test]
    fn undo_rejects_more_than_history() {
        let mut s = session();
        s.apply_move(StoneColor::Black, pos(0, 0)).unwrap();

        let err = s.undo(2).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientHistory {
                requested: 2,
                available: 1
            }
        );
    }

    #[test]
    fn undo_then_replay_reproduces_board() {
        let mut s = session();
        s.apply_move(StoneColor::Black, pos(7, 7)).unwrap();
        s.apply_move(StoneColor::White, pos(8, 8)).unwrap();
        s.apply_move(StoneColor::Black, pos(6, 6)).unwrap();
        s.apply_move(StoneColor::White, pos(9, 9)).unwrap();
        let before = *s.board();

        let removed = s.undo(2).unwrap();
        for mv in removed {
            s.apply_move(mv.color, mv.position).unwrap();
        }

        assert_eq!(*s.board(), before);
    }

    #[test]
    fn timeout_scores_against_side_to_move() {
        let mut s = session();
        s.apply_move(StoneColor::Black, pos(7, 7)).unwrap();

        // White is to move and runs out of time.
        let result = s.timeout().unwrap();
        assert_eq!(result.winner, Winner::Black);
        assert_eq!(result.reason, GameEndReason::Timeout);
        assert!(!s.is_active());
    }

    #[test]
    fn surrender_scores_for_the_opponent() {
        let mut s = session();
        let result = s.surrender(StoneColor::Black).unwrap();
        assert_eq!(result.winner, Winner::White);
        assert_eq!(result.reason, GameEndReason::Surrender);
    }

    #[test]
    fn disconnect_uses_distinct_reason() {
        let mut s = session();
        let result = s.disconnect(StoneColor::White).unwrap();
        assert_eq!(result.winner, Winner::Black);
        assert_eq!(result.reason, GameEndReason::Disconnect);
    }

    #[test]
    fn terminal_transitions_are_idempotent() {
        let mut s = session();
        assert!(s.surrender(StoneColor::Black).is_some());

        // Late signals after the game finished must not rewrite the result.
        assert!(s.disconnect(StoneColor::White).is_none());
        assert!(s.timeout().is_none());
        assert!(s.surrender(StoneColor::White).is_none());
        assert_eq!(s.result().unwrap().winner, Winner::White);
        assert_eq!(s.result().unwrap().reason, GameEndReason::Surrender);
    }

    #[test]
    fn moves_and_undo_rejected_once_finished() {
        let mut s = session();
        s.surrender(StoneColor::Black);

        assert_eq!(
            s.apply_move(StoneColor::Black, pos(0, 0)).unwrap_err(),
            DomainError::GameFinished
        );
        assert_eq!(s.undo(1).unwrap_err(), DomainError::GameFinished);
    }

    #[test]
    fn tick_second_saturates_at_zero() {
        let mut s = GameSession::new(RoomId::new(), 1);
        assert_eq!(s.tick_second(), 0);
        assert_eq!(s.tick_second(), 0);
    }

    /// Period-4 tiling of the whole board with no run of five in any
    /// direction: rows go BBWW, columns alternate, diagonals run in pairs.
    /// Black gets 113 cells, White 112, so the two lists interleave into a
    /// legal move sequence starting with Black.
    fn full_board_tiling() -> (Vec<Position>, Vec<Position>) {
        use crate::domain::game::BOARD_SIZE;

        let mut blacks = Vec::new();
        let mut whites = Vec::new();
        for y in 0..BOARD_SIZE as i32 {
            for x in 0..BOARD_SIZE as i32 {
                if (x + 2 * y) % 4 < 2 {
                    blacks.push(pos(x, y));
                } else {
                    whites.push(pos(x, y));
                }
            }
        }
        (blacks, whites)
    }

    /// Plays blacks and whites alternately (Black first) and returns the
    /// final outcome, asserting every earlier move was non-terminal.
    fn play_out(s: &mut GameSession, blacks: &[Position], whites: &[Position]) -> MoveOutcome {
        let total = blacks.len() + whites.len();
        let mut last = None;
        for i in 0..total {
            let (color, p) = if i % 2 == 0 {
                (StoneColor::Black, blacks[i / 2])
            } else {
                (StoneColor::White, whites[i / 2])
            };
            let outcome = s.apply_move(color, p).unwrap();
            if i + 1 < total {
                assert!(outcome.result.is_none(), "game ended early at move {}", i + 1);
            }
            last = Some(outcome);
        }
        last.unwrap()
    }

    #[test]
    fn filling_the_board_without_five_is_a_draw() {
        let (blacks, whites) = full_board_tiling();
        assert_eq!(blacks.len(), whites.len() + 1);

        let mut s = session();
        let outcome = play_out(&mut s, &blacks, &whites);

        let result = outcome.result.expect("a full board must end the game");
        assert_eq!(result.winner, Winner::Draw);
        assert_eq!(result.reason, GameEndReason::BoardFull);
        assert!(result.winning_line.is_none());
        assert!(s.board().is_full());
        assert!(!s.is_active());
    }

    #[test]
    fn win_on_the_board_filling_move_beats_the_draw() {
        // Rearranged tiling: (2,0) and (3,0) go to Black so row y=0 holds
        // six Black stones once (2,0) lands; (0,14) and (5,14) go to White
        // to keep the counts at 113/112. No other line reaches five.
        let (mut blacks, mut whites) = full_board_tiling();
        for p in [pos(0, 14), pos(5, 14)] {
            blacks.retain(|&b| b != p);
            whites.push(p);
        }
        whites.retain(|&w| w != pos(2, 0) && w != pos(3, 0));
        blacks.push(pos(3, 0));
        // The board-filling stone, held for the very last move.
        blacks.push(pos(2, 0));

        let mut s = session();
        let outcome = play_out(&mut s, &blacks, &whites);

        let result = outcome.result.expect("the last stone ends the game");
        assert!(s.board().is_full());
        assert_eq!(result.reason, GameEndReason::FiveInARow);
        assert_eq!(result.winner, Winner::Black);
        let line = result.winning_line.unwrap();
        assert_eq!(line.len(), 6);
        assert!(line.contains(&pos(2, 0)));
    }
}
