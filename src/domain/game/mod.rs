//! Game module - board rules and the per-match state machine.

mod board;
mod session;

pub use board::{Board, Position, StoneColor, BOARD_SIZE, WIN_LENGTH};
pub use session::{
    GameEndReason, GameResult, GameSession, Move, MoveOutcome, SessionStatus, Winner,
};
