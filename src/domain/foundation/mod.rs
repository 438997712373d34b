//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, and error types that form the vocabulary
//! of the gomoku domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{ConnectionId, GameId, RoomId, UserId};
pub use timestamp::Timestamp;
