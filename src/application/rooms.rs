//! Room registry: membership, the room status machine, and at most one
//! active game session per room.
//!
//! # Concurrency
//!
//! The registry is the single writer for every room. The outer map is only
//! touched to insert, look up, or remove rooms; every mutation of a room or
//! its session happens under that room's own `Mutex`, so operations on the
//! same room are serialized while different rooms proceed independently.
//!
//! Lock order is always outer map first, then the room mutex, never the
//! reverse.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{ConnectionId, DomainError, GameId, RoomId, Timestamp};
use crate::domain::game::{GameResult, GameSession, SessionStatus, StoneColor};
use crate::domain::player::PlayerProfile;

/// Room visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomVisibility {
    Public,
    Private,
}

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Ready,
    Playing,
    Finished,
}

/// Per-room configuration chosen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub allow_spectators: bool,
    pub turn_limit_secs: u32,
    pub allow_undo: bool,
    /// Plain equality check for private rooms; never serialized outward.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// One room: two seats, optional spectators, at most one session.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    visibility: RoomVisibility,
    config: RoomConfig,
    status: RoomStatus,
    host: PlayerProfile,
    host_conn: ConnectionId,
    guest: Option<PlayerProfile>,
    guest_conn: Option<ConnectionId>,
    spectators: HashMap<ConnectionId, PlayerProfile>,
    session: Option<GameSession>,
    created_at: Timestamp,
}

impl Room {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn host(&self) -> &PlayerProfile {
        &self.host
    }

    pub fn guest(&self) -> Option<&PlayerProfile> {
        self.guest.as_ref()
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut GameSession> {
        self.session.as_mut()
    }

    /// Marks the room finished; called when its session reaches a terminal
    /// state.
    pub fn finish(&mut self) {
        self.status = RoomStatus::Finished;
    }

    /// The seat color bound to a connection, if it is seated.
    ///
    /// The host always holds Black, the guest White.
    pub fn seat_color(&self, conn: ConnectionId) -> Option<StoneColor> {
        if self.host_conn == conn {
            Some(StoneColor::Black)
        } else if self.guest_conn == Some(conn) {
            Some(StoneColor::White)
        } else {
            None
        }
    }

    /// Profile and connection currently holding `color`.
    pub fn seat(&self, color: StoneColor) -> Option<(&PlayerProfile, ConnectionId)> {
        match color {
            StoneColor::Black => Some((&self.host, self.host_conn)),
            StoneColor::White => self
                .guest
                .as_ref()
                .and_then(|g| self.guest_conn.map(|c| (g, c))),
        }
    }

    /// Every connection attached to this room: both seats plus spectators.
    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut conns = vec![self.host_conn];
        if let Some(conn) = self.guest_conn {
            conns.push(conn);
        }
        conns.extend(self.spectators.keys().copied());
        conns
    }

    /// Public snapshot with the password redacted.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            name: self.name.clone(),
            visibility: self.visibility,
            status: self.status,
            allow_spectators: self.config.allow_spectators,
            turn_limit_secs: self.config.turn_limit_secs,
            allow_undo: self.config.allow_undo,
            has_password: self.config.password.is_some(),
            host: self.host.clone(),
            guest: self.guest.clone(),
            spectators: self.spectators.values().cloned().collect(),
            created_at: self.created_at,
        }
    }

    fn list_item(&self) -> RoomListItem {
        RoomListItem {
            id: self.id,
            name: self.name.clone(),
            visibility: self.visibility,
            status: self.status,
            host_display_name: self.host.display_name.clone(),
            host_rating: self.host.rating,
            has_password: self.config.password.is_some(),
            spectator_count: self.spectators.len(),
            created_at: self.created_at,
        }
    }
}

/// Wire-safe view of a room; never carries the password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub visibility: RoomVisibility,
    pub status: RoomStatus,
    pub allow_spectators: bool,
    pub turn_limit_secs: u32,
    pub allow_undo: bool,
    pub has_password: bool,
    pub host: PlayerProfile,
    pub guest: Option<PlayerProfile>,
    pub spectators: Vec<PlayerProfile>,
    pub created_at: Timestamp,
}

/// Lobby listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListItem {
    pub id: RoomId,
    pub name: String,
    pub visibility: RoomVisibility,
    pub status: RoomStatus,
    pub host_display_name: String,
    pub host_rating: i32,
    pub has_password: bool,
    pub spectator_count: usize,
    pub created_at: Timestamp,
}

/// Everything the gateway needs to announce a freshly started game.
#[derive(Debug, Clone)]
pub struct GameStartInfo {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub host: PlayerProfile,
    pub host_conn: ConnectionId,
    pub guest: PlayerProfile,
    pub guest_conn: ConnectionId,
    pub turn_limit_secs: u32,
}

/// Which role the departing connection held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaverRole {
    Host,
    Guest,
    Spectator,
}

/// Outcome of a `leave` call, captured before membership changed.
#[derive(Debug, Clone)]
pub struct LeaveReport {
    pub role: LeaverRole,
    /// Set when the departure ended a game in progress; the game is scored
    /// as a disconnect for the departing seat before membership changes.
    pub ended: Option<GameResult>,
    /// Seats as they were when the leave began.
    pub host_seat: (PlayerProfile, ConnectionId),
    pub guest_seat: Option<(PlayerProfile, ConnectionId)>,
    /// True when the room no longer exists (host left with no guest).
    pub room_deleted: bool,
    /// Room status after the departure (meaningless if deleted).
    pub status: RoomStatus,
    /// Connections still attached after the departure.
    pub remaining: Vec<ConnectionId>,
}

/// Owns all rooms; the only component allowed to create or destroy them.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
    max_rooms: usize,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            max_rooms,
        }
    }

    /// Creates a room with `host_profile` seated as host; starts `waiting`.
    ///
    /// # Errors
    ///
    /// - `RoomLimitReached` at the configured cap
    pub async fn create_room(
        &self,
        name: String,
        visibility: RoomVisibility,
        config: RoomConfig,
        host_profile: PlayerProfile,
        host_conn: ConnectionId,
    ) -> Result<RoomSnapshot, DomainError> {
        let mut rooms = self.rooms.write().await;
        if rooms.len() >= self.max_rooms {
            return Err(DomainError::RoomLimitReached);
        }

        let room = Room {
            id: RoomId::new(),
            name,
            visibility,
            config,
            status: RoomStatus::Waiting,
            host: host_profile,
            host_conn,
            guest: None,
            guest_conn: None,
            spectators: HashMap::new(),
            session: None,
            created_at: Timestamp::now(),
        };

        let snapshot = room.snapshot();
        tracing::info!(room_id = %room.id, host = %room.host.display_name, "room created");
        rooms.insert(room.id, Arc::new(Mutex::new(room)));
        Ok(snapshot)
    }

    /// Looks up the shared handle for a room.
    pub async fn room(&self, room_id: RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(&room_id).cloned()
    }

    async fn require(&self, room_id: RoomId) -> Result<Arc<Mutex<Room>>, DomainError> {
        self.room(room_id).await.ok_or(DomainError::RoomNotFound)
    }

    /// Seats `profile` as guest.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `RoomNotAccepting` (status is not `waiting`),
    ///   `RoomFull`, `WrongPassword`
    pub async fn join_room(
        &self,
        room_id: RoomId,
        profile: PlayerProfile,
        conn: ConnectionId,
        password: Option<&str>,
    ) -> Result<RoomSnapshot, DomainError> {
        let handle = self.require(room_id).await?;
        let mut room = handle.lock().await;

        if room.status != RoomStatus::Waiting {
            return Err(DomainError::RoomNotAccepting);
        }
        if room.guest.is_some() {
            return Err(DomainError::RoomFull);
        }
        if let Some(expected) = &room.config.password {
            if password != Some(expected.as_str()) {
                return Err(DomainError::WrongPassword);
            }
        }

        tracing::info!(room_id = %room_id, guest = %profile.display_name, "guest joined");
        room.guest = Some(profile);
        room.guest_conn = Some(conn);
        room.status = RoomStatus::Ready;
        Ok(room.snapshot())
    }

    /// Attaches a spectator; allowed in any room status.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `SpectatorsNotAllowed`
    pub async fn join_as_spectator(
        &self,
        room_id: RoomId,
        profile: PlayerProfile,
        conn: ConnectionId,
    ) -> Result<RoomSnapshot, DomainError> {
        let handle = self.require(room_id).await?;
        let mut room = handle.lock().await;

        if !room.config.allow_spectators {
            return Err(DomainError::SpectatorsNotAllowed);
        }

        room.spectators.insert(conn, profile);
        Ok(room.snapshot())
    }

    /// Starts a new session; host plays Black and moves first.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `RoomNotReady` (wrong status or no guest)
    pub async fn start_game(&self, room_id: RoomId) -> Result<GameStartInfo, DomainError> {
        let handle = self.require(room_id).await?;
        let mut room = handle.lock().await;

        if room.status != RoomStatus::Ready {
            return Err(DomainError::RoomNotReady);
        }
        let (guest, guest_conn) = match (&room.guest, room.guest_conn) {
            (Some(g), Some(c)) => (g.clone(), c),
            _ => return Err(DomainError::RoomNotReady),
        };

        let session = GameSession::new(room_id, room.config.turn_limit_secs);
        let info = GameStartInfo {
            game_id: session.id(),
            room_id,
            host: room.host.clone(),
            host_conn: room.host_conn,
            guest,
            guest_conn,
            turn_limit_secs: room.config.turn_limit_secs,
        };

        tracing::info!(room_id = %room_id, game_id = %info.game_id, "game started");
        room.session = Some(session);
        room.status = RoomStatus::Playing;
        Ok(info)
    }

    /// Detaches a connection from a room.
    ///
    /// A seated departure during `playing` first scores the game as a
    /// disconnect for the departing color. Then: a leaving host hands the
    /// room to the guest (or the room is deleted when no guest exists); a
    /// leaving guest clears the seat; spectators simply detach. Returns
    /// `None` when the connection was not part of the room, or the room
    /// does not exist.
    pub async fn leave(&self, room_id: RoomId, conn: ConnectionId) -> Option<LeaveReport> {
        // Write lock up front: this path may delete the room.
        let mut rooms = self.rooms.write().await;
        let handle = rooms.get(&room_id)?.clone();
        let mut room = handle.lock().await;

        let role = if room.host_conn == conn {
            LeaverRole::Host
        } else if room.guest_conn == Some(conn) {
            LeaverRole::Guest
        } else if room.spectators.contains_key(&conn) {
            LeaverRole::Spectator
        } else {
            return None;
        };

        let host_seat = (room.host.clone(), room.host_conn);
        let guest_seat = room
            .guest
            .clone()
            .and_then(|g| room.guest_conn.map(|c| (g, c)));

        // Score the departure before any membership change.
        let ended = if role != LeaverRole::Spectator && room.status == RoomStatus::Playing {
            match room.seat_color(conn) {
                Some(color) => room.session_mut().and_then(|s| s.disconnect(color)),
                None => None,
            }
        } else {
            None
        };

        let mut room_deleted = false;
        match role {
            LeaverRole::Host => {
                if let (Some(guest), Some(guest_conn)) = (room.guest.take(), room.guest_conn.take())
                {
                    // Ownership transfer: the guest becomes host.
                    room.host = guest;
                    room.host_conn = guest_conn;
                    room.session = None;
                    room.status = RoomStatus::Waiting;
                    tracing::info!(room_id = %room_id, "host left, guest promoted");
                } else {
                    rooms.remove(&room_id);
                    room_deleted = true;
                    tracing::info!(room_id = %room_id, "last occupant left, room deleted");
                }
            }
            LeaverRole::Guest => {
                room.guest = None;
                room.guest_conn = None;
                room.session = None;
                room.status = RoomStatus::Waiting;
            }
            LeaverRole::Spectator => {
                room.spectators.remove(&conn);
            }
        }

        Some(LeaveReport {
            role,
            ended,
            host_seat,
            guest_seat,
            room_deleted,
            status: room.status,
            remaining: if room_deleted {
                Vec::new()
            } else {
                room.connections()
            },
        })
    }

    /// Resets a finished room for a rematch: host and guest swap seats so
    /// the first mover alternates, the old session is discarded, and the
    /// room returns to `ready`.
    pub async fn reset_for_rematch(&self, room_id: RoomId) -> Result<RoomSnapshot, DomainError> {
        let handle = self.require(room_id).await?;
        let mut room = handle.lock().await;

        if let (Some(guest), Some(guest_conn)) = (room.guest.take(), room.guest_conn.take()) {
            let old_host = std::mem::replace(&mut room.host, guest);
            let old_host_conn = std::mem::replace(&mut room.host_conn, guest_conn);
            room.guest = Some(old_host);
            room.guest_conn = Some(old_host_conn);
        }

        room.session = None;
        room.status = RoomStatus::Ready;
        Ok(room.snapshot())
    }

    /// Writes an updated profile back into whichever seat or spectator slot
    /// `conn` occupies. Keeps room listings in step with post-game ratings.
    pub async fn update_profile(&self, room_id: RoomId, conn: ConnectionId, profile: PlayerProfile) {
        if let Some(handle) = self.room(room_id).await {
            let mut room = handle.lock().await;
            if room.host_conn == conn {
                room.host = profile;
            } else if room.guest_conn == Some(conn) {
                room.guest = Some(profile);
            } else if let Some(slot) = room.spectators.get_mut(&conn) {
                *slot = profile;
            }
        }
    }

    /// Lobby listing: waiting and playing rooms, newest first.
    pub async fn list_rooms(&self) -> Vec<RoomListItem> {
        let rooms = self.rooms.read().await;
        let mut items = Vec::new();
        for handle in rooms.values() {
            let room = handle.lock().await;
            if matches!(room.status, RoomStatus::Waiting | RoomStatus::Playing) {
                items.push(room.list_item());
            }
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// Number of rooms currently registered.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
