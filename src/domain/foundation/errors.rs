//! Error types for the domain layer.
//!
//! Two classes matter to callers: validation errors (bad input, game state
//! unchanged) and state errors (the operation does not apply to the current
//! room/queue state). Both are recoverable per-request failures surfaced to
//! exactly one caller; none is fatal to the process.

use std::fmt;
use thiserror::Error;

/// Errors raised by rule enforcement and room/queue state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // Validation errors
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Position ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Cell ({x}, {y}) is already occupied")]
    CellOccupied { x: i32, y: i32 },

    #[error("Cannot undo {requested} moves, only {available} in history")]
    InsufficientHistory { requested: usize, available: usize },

    #[error("Undo is disabled in this room")]
    UndoDisabled,

    // State errors
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is not accepting players")]
    RoomNotAccepting,

    #[error("Room is full")]
    RoomFull,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Spectators are not allowed in this room")]
    SpectatorsNotAllowed,

    #[error("Room is not ready to start")]
    RoomNotReady,

    #[error("Maximum room limit reached")]
    RoomLimitReached,

    #[error("Already in matchmaking queue")]
    AlreadyQueued,

    #[error("No game in progress")]
    GameNotFound,

    #[error("Game is already finished")]
    GameFinished,

    #[error("You are not a seated player in this room")]
    NotAPlayer,

    #[error("Join the lobby first")]
    NotInLobby,
}

impl DomainError {
    /// Stable wire code for this error, sent to the originating connection.
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::NotYourTurn => ErrorCode::NotYourTurn,
            DomainError::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            DomainError::CellOccupied { .. } => ErrorCode::CellOccupied,
            DomainError::InsufficientHistory { .. } => ErrorCode::InsufficientHistory,
            DomainError::UndoDisabled => ErrorCode::UndoDisabled,
            DomainError::RoomNotFound => ErrorCode::RoomNotFound,
            DomainError::RoomNotAccepting => ErrorCode::RoomNotAccepting,
            DomainError::RoomFull => ErrorCode::RoomFull,
            DomainError::WrongPassword => ErrorCode::WrongPassword,
            DomainError::SpectatorsNotAllowed => ErrorCode::SpectatorsNotAllowed,
            DomainError::RoomNotReady => ErrorCode::RoomNotReady,
            DomainError::RoomLimitReached => ErrorCode::RoomLimitReached,
            DomainError::AlreadyQueued => ErrorCode::AlreadyQueued,
            DomainError::GameNotFound => ErrorCode::GameNotFound,
            DomainError::GameFinished => ErrorCode::GameFinished,
            DomainError::NotAPlayer => ErrorCode::NotAPlayer,
            DomainError::NotInLobby => ErrorCode::NotInLobby,
        }
    }

    /// True for input-shaped failures that leave all state untouched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::NotYourTurn
                | DomainError::OutOfBounds { .. }
                | DomainError::CellOccupied { .. }
                | DomainError::InsufficientHistory { .. }
                | DomainError::UndoDisabled
        )
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    NotYourTurn,
    OutOfBounds,
    CellOccupied,
    InsufficientHistory,
    UndoDisabled,

    // State errors
    RoomNotFound,
    RoomNotAccepting,
    RoomFull,
    WrongPassword,
    SpectatorsNotAllowed,
    RoomNotReady,
    RoomLimitReached,
    AlreadyQueued,
    GameNotFound,
    GameFinished,
    NotAPlayer,
    NotInLobby,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotYourTurn => "NOT_YOUR_TURN",
            ErrorCode::OutOfBounds => "OUT_OF_BOUNDS",
            ErrorCode::CellOccupied => "CELL_OCCUPIED",
            ErrorCode::InsufficientHistory => "INSUFFICIENT_HISTORY",
            ErrorCode::UndoDisabled => "UNDO_DISABLED",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::RoomNotAccepting => "ROOM_NOT_ACCEPTING",
            ErrorCode::RoomFull => "ROOM_FULL",
            ErrorCode::WrongPassword => "WRONG_PASSWORD",
            ErrorCode::SpectatorsNotAllowed => "SPECTATORS_NOT_ALLOWED",
            ErrorCode::RoomNotReady => "ROOM_NOT_READY",
            ErrorCode::RoomLimitReached => "ROOM_LIMIT_REACHED",
            ErrorCode::AlreadyQueued => "ALREADY_QUEUED",
            ErrorCode::GameNotFound => "GAME_NOT_FOUND",
            ErrorCode::GameFinished => "GAME_FINISHED",
            ErrorCode::NotAPlayer => "NOT_A_PLAYER",
            ErrorCode::NotInLobby => "NOT_IN_LOBBY",
        };
        write!(f, "{}", s)
    }
}
