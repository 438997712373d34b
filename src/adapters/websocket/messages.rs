//! WebSocket message types for the game protocol.
//!
//! Defines the contract between server and connected clients:
//! - Client → Server: lobby, room, matchmaking, and in-game actions
//! - Server → Client: room state, game events, matchmaking results, errors
//!
//! Messages are JSON with a `type` tag; payload fields are camelCase.

use serde::{Deserialize, Serialize};

use crate::application::rooms::{RoomListItem, RoomSnapshot, RoomStatus};
use crate::domain::foundation::{ConnectionId, GameId, RoomId, UserId};
use crate::domain::game::{GameResult, Move, Position, StoneColor};
use crate::domain::player::PlayerProfile;
use crate::domain::rating::Rank;

// ============================================
// Client → Server Messages
// ============================================

/// Room settings supplied by the client on create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfigRequest {
    pub allow_spectators: bool,
    pub turn_limit_secs: Option<u32>,
    pub allow_undo: bool,
}

/// All message types that can be received from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter the lobby and receive a profile plus the room list.
    JoinLobby {
        #[serde(rename = "displayName")]
        display_name: Option<String>,
    },

    /// Request a fresh room list.
    ListRooms,

    /// Create a room and sit as host.
    CreateRoom {
        name: String,
        private: bool,
        password: Option<String>,
        config: RoomConfigRequest,
    },

    /// Take the guest seat in a room.
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        password: Option<String>,
    },

    /// Watch a room without taking a seat.
    SpectateRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Leave the current room.
    LeaveRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Enter the matchmaking queue.
    StartMatchmaking,

    /// Leave the matchmaking queue.
    CancelMatchmaking,

    /// Place a stone.
    Move {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        position: Position,
    },

    /// Ask the opponent to allow an undo.
    UndoRequest {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Answer an undo request.
    UndoResponse {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        accepted: bool,
    },

    /// Concede the game.
    Surrender {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Ask the opponent for a rematch.
    RematchRequest {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Answer a rematch request.
    RematchResponse {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        accepted: bool,
    },
}

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Lobby entry succeeded; carries the issued profile.
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
        profile: PlayerProfile,
    },

    /// Lobby room list.
    RoomsUpdate { rooms: Vec<RoomListItem> },

    /// The caller's room was created.
    RoomCreated { room: RoomSnapshot },

    /// The caller joined a room (as guest or spectator).
    RoomJoined { room: RoomSnapshot },

    /// Another player joined the caller's room.
    PlayerJoined { profile: PlayerProfile },

    /// A player left the caller's room.
    PlayerLeft {
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
    },

    /// Room status changed (e.g. back to waiting after a departure).
    RoomStatusUpdate {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        status: RoomStatus,
    },

    /// Matchmaking search state.
    MatchmakingStatus {
        #[serde(rename = "isSearching")]
        is_searching: bool,
        #[serde(rename = "estimatedWaitSecs")]
        estimated_wait_secs: u64,
    },

    /// An opponent was found; both players are seated in `room`.
    MatchFound { room: RoomSnapshot },

    /// A game began. Sent individually to each seat: `your_color` differs
    /// per recipient.
    GameStart {
        #[serde(rename = "gameId")]
        game_id: GameId,
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "yourColor")]
        your_color: StoneColor,
        opponent: PlayerProfile,
        #[serde(rename = "firstMove")]
        first_move: StoneColor,
    },

    /// A stone was placed.
    MoveMade {
        #[serde(rename = "move")]
        mv: Move,
    },

    /// Whose turn it is and how long they have.
    TurnUpdate {
        #[serde(rename = "colorToMove")]
        color_to_move: StoneColor,
        #[serde(rename = "timeRemainingSecs")]
        time_remaining_secs: u32,
    },

    /// The game finished.
    GameEnd { result: GameResult },

    /// The opponent asks to undo; sent to the non-requesting seat only.
    UndoRequested {
        #[serde(rename = "requesterId")]
        requester_id: UserId,
    },

    /// Outcome of an undo request.
    UndoResult {
        accepted: bool,
        #[serde(rename = "removedMoves", skip_serializing_if = "Option::is_none")]
        removed_moves: Option<Vec<Move>>,
    },

    /// The opponent asks for a rematch; sent to the non-requesting seat.
    RematchRequested {
        #[serde(rename = "requesterId")]
        requester_id: UserId,
    },

    /// Outcome of a rematch request.
    RematchResult { accepted: bool },

    /// Post-game statistics for the recipient's own profile.
    StatsUpdate {
        rating: i32,
        #[serde(rename = "ratingChange")]
        rating_change: i32,
        wins: u32,
        losses: u32,
        rank: Rank,
    },

    /// A request failed; sent only to the originating connection.
    Error { code: String, message: String },
}
