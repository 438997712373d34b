//! Application layer - stateful in-memory services.
//!
//! These own all shared mutable state (rooms, the matchmaking queue) and
//! enforce the single-writer discipline the gateway relies on.

pub mod matchmaking;
pub mod rooms;

pub use matchmaking::{MatchmakingQueue, QueueEntry, RatingWindow};
pub use rooms::{
    GameStartInfo, LeaveReport, LeaverRole, Room, RoomConfig, RoomListItem, RoomRegistry,
    RoomSnapshot, RoomStatus, RoomVisibility,
};
