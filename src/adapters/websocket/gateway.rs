//! Event gateway: routes client messages to the application layer and fans
//! results back out over the connection registry.
//!
//! All room mutation goes through `RoomRegistry`, so handlers here follow
//! one shape: resolve the room, mutate under its lock, capture what the
//! broadcast needs, drop the lock, then send. Nothing awaits a send while a
//! room lock is held.
//!
//! Each playing room gets one timer task that ticks the turn clock once a
//! second; a drained clock ends the game as a timeout. A separate sweep
//! task periodically pairs whoever is left in the matchmaking queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::application::matchmaking::{MatchmakingQueue, QueueEntry};
use crate::application::rooms::{
    GameStartInfo, LeaverRole, RoomConfig, RoomRegistry, RoomVisibility,
};
use crate::domain::foundation::{ConnectionId, DomainError, RoomId};
use crate::domain::game::{GameResult, StoneColor, Winner};
use crate::domain::player::PlayerProfile;
use crate::domain::rating::{self, MatchScore};
use crate::ports::{ProfileDirectory, StatsStore, StatsUpdate};

use super::connections::ConnectionRegistry;
use super::messages::{ClientMessage, RoomConfigRequest, ServerMessage};

/// Central dispatcher for one server process.
pub struct EventGateway {
    connections: ConnectionRegistry,
    rooms: Arc<RoomRegistry>,
    queue: Arc<MatchmakingQueue>,
    profiles: Arc<dyn ProfileDirectory>,
    stats: Arc<dyn StatsStore>,
    /// One turn-clock task per playing room, tagged with the generation it
    /// was started under so a task that stops on its own can tell whether
    /// the map entry is still its own.
    timers: Mutex<HashMap<RoomId, (u64, JoinHandle<()>)>>,
    timer_seq: AtomicU64,
    default_turn_limit_secs: u32,
    sweep_interval_secs: u64,
    /// Handed to spawned tasks so they never keep the gateway alive.
    self_ref: Weak<EventGateway>,
}

impl EventGateway {
    pub fn new(
        rooms: Arc<RoomRegistry>,
        queue: Arc<MatchmakingQueue>,
        profiles: Arc<dyn ProfileDirectory>,
        stats: Arc<dyn StatsStore>,
        default_turn_limit_secs: u32,
        sweep_interval_secs: u64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            connections: ConnectionRegistry::new(),
            rooms,
            queue,
            profiles,
            stats,
            timers: Mutex::new(HashMap::new()),
            timer_seq: AtomicU64::new(0),
            default_turn_limit_secs,
            sweep_interval_secs,
            self_ref: self_ref.clone(),
        })
    }

    /// Registers a fresh connection's outbound channel.
    pub async fn handle_connect(
        &self,
        conn: ConnectionId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        tracing::debug!(conn = %conn, "connection opened");
        self.connections.register(conn, sender).await;
    }

    /// Routes one parsed client message. Failures are reported back to the
    /// originating connection only.
    pub async fn dispatch(&self, conn: ConnectionId, message: ClientMessage) {
        let outcome = match message {
            ClientMessage::JoinLobby { display_name } => {
                self.on_join_lobby(conn, display_name).await
            }
            ClientMessage::ListRooms => self.on_list_rooms(conn).await,
            ClientMessage::CreateRoom {
                name,
                private,
                password,
                config,
            } => self.on_create_room(conn, name, private, password, config).await,
            ClientMessage::JoinRoom { room_id, password } => {
                self.on_join_room(conn, room_id, password).await
            }
            ClientMessage::SpectateRoom { room_id } => self.on_spectate(conn, room_id).await,
            ClientMessage::LeaveRoom { room_id } => {
                self.depart(room_id, conn).await;
                Ok(())
            }
            ClientMessage::StartMatchmaking => self.on_start_matchmaking(conn).await,
            ClientMessage::CancelMatchmaking => self.on_cancel_matchmaking(conn).await,
            ClientMessage::Move { room_id, position } => {
                self.on_move(conn, room_id, position).await
            }
            ClientMessage::UndoRequest { room_id } => self.on_undo_request(conn, room_id).await,
            ClientMessage::UndoResponse { room_id, accepted } => {
                self.on_undo_response(conn, room_id, accepted).await
            }
            ClientMessage::Surrender { room_id } => self.on_surrender(conn, room_id).await,
            ClientMessage::RematchRequest { room_id } => {
                self.on_rematch_request(conn, room_id).await
            }
            ClientMessage::RematchResponse { room_id, accepted } => {
                self.on_rematch_response(conn, room_id, accepted).await
            }
        };

        if let Err(err) = outcome {
            if !err.is_validation() {
                tracing::warn!(conn = %conn, error = %err, "request failed");
            }
            self.connections
                .send(
                    conn,
                    ServerMessage::Error {
                        code: err.code().to_string(),
                        message: err.to_string(),
                    },
                )
                .await;
        }
    }

    /// Tears down a dropped connection: out of the queue, out of its room
    /// (scoring an in-progress game as a disconnect), out of the registry.
    pub async fn handle_disconnect(&self, conn: ConnectionId) {
        tracing::debug!(conn = %conn, "connection closed");
        self.queue.dequeue(conn).await;
        if let Some(room_id) = self.connections.room_of(conn).await {
            self.depart(room_id, conn).await;
        }
        self.connections.unregister(conn).await;
    }

    /// Spawns the periodic queue sweep so aged windows pair up even when no
    /// new player arrives to trigger a match attempt.
    pub fn spawn_matchmaking_sweep(&self) -> JoinHandle<()> {
        let weak = self.self_ref.clone();
        let period = Duration::from_secs(self.sweep_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(gateway) = weak.upgrade() else { break };
                let pairs = gateway.queue.sweep_all().await;
                for (a, b) in pairs {
                    gateway.pair_players(a, b).await;
                }
            }
        })
    }

    // ---- lobby ----

    async fn on_join_lobby(
        &self,
        conn: ConnectionId,
        display_name: Option<String>,
    ) -> Result<(), DomainError> {
        let profile = self.profiles.issue_profile(conn, display_name).await;
        tracing::info!(conn = %conn, player = %profile.display_name, "joined lobby");
        self.connections.set_profile(conn, profile.clone()).await;
        self.connections
            .send(
                conn,
                ServerMessage::Connected {
                    connection_id: conn,
                    profile,
                },
            )
            .await;
        self.on_list_rooms(conn).await
    }

    async fn on_list_rooms(&self, conn: ConnectionId) -> Result<(), DomainError> {
        let rooms = self.rooms.list_rooms().await;
        self.connections
            .send(conn, ServerMessage::RoomsUpdate { rooms })
            .await;
        Ok(())
    }

    async fn require_profile(&self, conn: ConnectionId) -> Result<PlayerProfile, DomainError> {
        self.connections
            .profile(conn)
            .await
            .ok_or(DomainError::NotInLobby)
    }

    async fn broadcast_room_list(&self) {
        let rooms = self.rooms.list_rooms().await;
        let members = self.connections.lobby_members().await;
        self.connections
            .send_many(&members, &ServerMessage::RoomsUpdate { rooms })
            .await;
    }

    // ---- rooms ----

    async fn on_create_room(
        &self,
        conn: ConnectionId,
        name: String,
        private: bool,
        password: Option<String>,
        request: RoomConfigRequest,
    ) -> Result<(), DomainError> {
        let profile = self.require_profile(conn).await?;
        let visibility = if private {
            RoomVisibility::Private
        } else {
            RoomVisibility::Public
        };
        let config = RoomConfig {
            allow_spectators: request.allow_spectators,
            turn_limit_secs: request.turn_limit_secs.unwrap_or(self.default_turn_limit_secs),
            allow_undo: request.allow_undo,
            password,
        };

        let snapshot = self
            .rooms
            .create_room(name, visibility, config, profile, conn)
            .await?;
        self.connections.set_room(conn, Some(snapshot.id)).await;
        self.connections
            .send(conn, ServerMessage::RoomCreated { room: snapshot })
            .await;
        self.broadcast_room_list().await;
        Ok(())
    }

    async fn on_join_room(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        password: Option<String>,
    ) -> Result<(), DomainError> {
        let profile = self.require_profile(conn).await?;
        let snapshot = self
            .rooms
            .join_room(room_id, profile.clone(), conn, password.as_deref())
            .await?;
        self.connections.set_room(conn, Some(room_id)).await;

        let others = self.room_connections_except(room_id, conn).await;
        self.connections
            .send(conn, ServerMessage::RoomJoined { room: snapshot })
            .await;
        self.connections
            .send_many(&others, &ServerMessage::PlayerJoined { profile })
            .await;
        self.broadcast_room_list().await;

        // Both seats are filled; the game starts without further input.
        self.begin_game(room_id).await
    }

    async fn on_spectate(&self, conn: ConnectionId, room_id: RoomId) -> Result<(), DomainError> {
        let profile = self.require_profile(conn).await?;
        let snapshot = self
            .rooms
            .join_as_spectator(room_id, profile.clone(), conn)
            .await?;
        self.connections.set_room(conn, Some(room_id)).await;

        let others = self.room_connections_except(room_id, conn).await;
        self.connections
            .send(conn, ServerMessage::RoomJoined { room: snapshot })
            .await;
        self.connections
            .send_many(&others, &ServerMessage::PlayerJoined { profile })
            .await;
        self.broadcast_room_list().await;
        Ok(())
    }

    async fn room_connections_except(
        &self,
        room_id: RoomId,
        skip: ConnectionId,
    ) -> Vec<ConnectionId> {
        match self.rooms.room(room_id).await {
            Some(handle) => {
                let room = handle.lock().await;
                room.connections().into_iter().filter(|c| *c != skip).collect()
            }
            None => Vec::new(),
        }
    }

    /// Shared leave path for explicit leaves and socket drops.
    async fn depart(&self, room_id: RoomId, conn: ConnectionId) {
        let Some(report) = self.rooms.leave(room_id, conn).await else {
            return;
        };
        self.connections.set_room(conn, None).await;

        // Seated departures discard the session either way.
        if report.role != LeaverRole::Spectator {
            self.stop_timer(room_id).await;
        }

        if let Some(result) = &report.ended {
            let mut recipients = report.remaining.clone();
            recipients.push(conn);
            self.connections
                .send_many(&recipients, &ServerMessage::GameEnd { result: result.clone() })
                .await;
            self.settle(room_id, result, &report.host_seat, report.guest_seat.as_ref())
                .await;
        }

        if !report.room_deleted {
            self.connections
                .send_many(
                    &report.remaining,
                    &ServerMessage::PlayerLeft {
                        connection_id: conn,
                    },
                )
                .await;
            self.connections
                .send_many(
                    &report.remaining,
                    &ServerMessage::RoomStatusUpdate {
                        room_id,
                        status: report.status,
                    },
                )
                .await;
        }
        self.broadcast_room_list().await;
    }

    // ---- matchmaking ----

    async fn on_start_matchmaking(&self, conn: ConnectionId) -> Result<(), DomainError> {
        let profile = self.require_profile(conn).await?;
        if self.connections.room_of(conn).await.is_some() {
            return Err(DomainError::NotInLobby);
        }

        self.queue.enqueue(conn, profile).await?;
        let wait = self.queue.estimated_wait_secs(conn).await;
        self.connections
            .send(
                conn,
                ServerMessage::MatchmakingStatus {
                    is_searching: true,
                    estimated_wait_secs: wait,
                },
            )
            .await;

        if let Some((a, b)) = self.queue.attempt_match(conn).await {
            self.pair_players(a, b).await;
        }
        Ok(())
    }

    async fn on_cancel_matchmaking(&self, conn: ConnectionId) -> Result<(), DomainError> {
        self.queue.dequeue(conn).await;
        self.connections
            .send(
                conn,
                ServerMessage::MatchmakingStatus {
                    is_searching: false,
                    estimated_wait_secs: 0,
                },
            )
            .await;
        Ok(())
    }

    /// Seats a matched pair in a fresh room and starts their game.
    async fn pair_players(&self, a: QueueEntry, b: QueueEntry) {
        let name = format!(
            "Match: {} vs {}",
            a.profile.display_name, b.profile.display_name
        );
        let config = RoomConfig {
            allow_spectators: true,
            turn_limit_secs: self.default_turn_limit_secs,
            allow_undo: false,
            password: None,
        };

        let created = self
            .rooms
            .create_room(name, RoomVisibility::Public, config, a.profile.clone(), a.conn)
            .await;
        let snapshot = match created {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "matched pair could not get a room");
                for conn in [a.conn, b.conn] {
                    self.connections
                        .send(
                            conn,
                            ServerMessage::Error {
                                code: err.code().to_string(),
                                message: err.to_string(),
                            },
                        )
                        .await;
                }
                return;
            }
        };
        let room_id = snapshot.id;

        // Joining our own fresh room cannot fail short of a registry bug.
        if let Err(err) = self
            .rooms
            .join_room(room_id, b.profile.clone(), b.conn, None)
            .await
        {
            tracing::error!(room_id = %room_id, error = %err, "guest seat rejected in match room");
            return;
        }

        self.connections.set_room(a.conn, Some(room_id)).await;
        self.connections.set_room(b.conn, Some(room_id)).await;

        if let Some(handle) = self.rooms.room(room_id).await {
            let snapshot = handle.lock().await.snapshot();
            self.connections
                .send_many(&[a.conn, b.conn], &ServerMessage::MatchFound { room: snapshot })
                .await;
        }

        if let Err(err) = self.begin_game(room_id).await {
            tracing::error!(room_id = %room_id, error = %err, "match room failed to start");
        }
    }

    // ---- game lifecycle ----

    /// Starts the session in a ready room and announces it to both seats.
    async fn begin_game(&self, room_id: RoomId) -> Result<(), DomainError> {
        let info = self.rooms.start_game(room_id).await?;
        self.announce_start(&info).await;
        self.start_timer(room_id).await;
        self.broadcast_room_list().await;
        Ok(())
    }

    async fn announce_start(&self, info: &GameStartInfo) {
        self.connections
            .send(
                info.host_conn,
                ServerMessage::GameStart {
                    game_id: info.game_id,
                    room_id: info.room_id,
                    your_color: StoneColor::Black,
                    opponent: info.guest.clone(),
                    first_move: StoneColor::Black,
                },
            )
            .await;
        self.connections
            .send(
                info.guest_conn,
                ServerMessage::GameStart {
                    game_id: info.game_id,
                    room_id: info.room_id,
                    your_color: StoneColor::White,
                    opponent: info.host.clone(),
                    first_move: StoneColor::Black,
                },
            )
            .await;
    }

    async fn on_move(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        position: crate::domain::game::Position,
    ) -> Result<(), DomainError> {
        let handle = self
            .rooms
            .room(room_id)
            .await
            .ok_or(DomainError::RoomNotFound)?;

        // Mutate under the room lock, capture, then send.
        let (outcome, conns, turn, seats) = {
            let mut room = handle.lock().await;
            let color = room.seat_color(conn).ok_or(DomainError::NotAPlayer)?;
            let session = room.session_mut().ok_or(DomainError::GameNotFound)?;
            let outcome = session.apply_move(color, position)?;

            let turn = (session.color_to_move(), session.turn_remaining_secs());
            let seats = if outcome.result.is_some() {
                room.finish();
                Some((
                    room.seat(StoneColor::Black).map(|(p, c)| (p.clone(), c)),
                    room.seat(StoneColor::White).map(|(p, c)| (p.clone(), c)),
                ))
            } else {
                None
            };
            (outcome, room.connections(), turn, seats)
        };

        self.connections
            .send_many(&conns, &ServerMessage::MoveMade { mv: outcome.mv })
            .await;

        match outcome.result {
            Some(result) => {
                self.stop_timer(room_id).await;
                self.connections
                    .send_many(&conns, &ServerMessage::GameEnd { result: result.clone() })
                    .await;
                if let Some((Some(host), guest)) = seats {
                    self.settle(room_id, &result, &host, guest.as_ref()).await;
                }
                self.broadcast_room_list().await;
            }
            None => {
                self.connections
                    .send_many(
                        &conns,
                        &ServerMessage::TurnUpdate {
                            color_to_move: turn.0,
                            time_remaining_secs: turn.1,
                        },
                    )
                    .await;
            }
        }
        Ok(())
    }

    async fn on_surrender(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), DomainError> {
        let handle = self
            .rooms
            .room(room_id)
            .await
            .ok_or(DomainError::RoomNotFound)?;

        let (result, conns, seats) = {
            let mut room = handle.lock().await;
            let color = room.seat_color(conn).ok_or(DomainError::NotAPlayer)?;
            let session = room.session_mut().ok_or(DomainError::GameNotFound)?;
            let result = session.surrender(color).ok_or(DomainError::GameFinished)?;
            room.finish();
            let seats = (
                room.seat(StoneColor::Black).map(|(p, c)| (p.clone(), c)),
                room.seat(StoneColor::White).map(|(p, c)| (p.clone(), c)),
            );
            (result, room.connections(), seats)
        };

        self.stop_timer(room_id).await;
        self.connections
            .send_many(&conns, &ServerMessage::GameEnd { result: result.clone() })
            .await;
        if let (Some(host), guest) = seats {
            self.settle(room_id, &result, &host, guest.as_ref()).await;
        }
        self.broadcast_room_list().await;
        Ok(())
    }

    // ---- undo ----

    async fn on_undo_request(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), DomainError> {
        let handle = self
            .rooms
            .room(room_id)
            .await
            .ok_or(DomainError::RoomNotFound)?;

        let (requester_id, opponent_conn) = {
            let room = handle.lock().await;
            if !room.config().allow_undo {
                return Err(DomainError::UndoDisabled);
            }
            let color = room.seat_color(conn).ok_or(DomainError::NotAPlayer)?;
            let session = room.session().ok_or(DomainError::GameNotFound)?;
            if !session.is_active() {
                return Err(DomainError::GameFinished);
            }
            let (me, _) = room.seat(color).ok_or(DomainError::NotAPlayer)?;
            let (_, opponent_conn) = room
                .seat(color.opponent())
                .ok_or(DomainError::NotAPlayer)?;
            (me.id, opponent_conn)
        };

        // Only the opponent gets to answer.
        self.connections
            .send(opponent_conn, ServerMessage::UndoRequested { requester_id })
            .await;
        Ok(())
    }

    async fn on_undo_response(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        accepted: bool,
    ) -> Result<(), DomainError> {
        let handle = self
            .rooms
            .room(room_id)
            .await
            .ok_or(DomainError::RoomNotFound)?;

        let (removed, conns, turn) = {
            let mut room = handle.lock().await;
            room.seat_color(conn).ok_or(DomainError::NotAPlayer)?;

            if !accepted {
                let conns = room.connections();
                drop(room);
                self.connections
                    .send_many(
                        &conns,
                        &ServerMessage::UndoResult {
                            accepted: false,
                            removed_moves: None,
                        },
                    )
                    .await;
                return Ok(());
            }

            let session = room.session_mut().ok_or(DomainError::GameNotFound)?;
            // Undo removes one move per player, or less when the game just
            // started.
            let count = session.moves().len().min(2);
            let removed = session.undo(count)?;
            let turn = (session.color_to_move(), session.turn_remaining_secs());
            (removed, room.connections(), turn)
        };

        self.connections
            .send_many(
                &conns,
                &ServerMessage::UndoResult {
                    accepted: true,
                    removed_moves: Some(removed),
                },
            )
            .await;
        self.connections
            .send_many(
                &conns,
                &ServerMessage::TurnUpdate {
                    color_to_move: turn.0,
                    time_remaining_secs: turn.1,
                },
            )
            .await;
        Ok(())
    }

    // ---- rematch ----

    async fn on_rematch_request(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), DomainError> {
        let handle = self
            .rooms
            .room(room_id)
            .await
            .ok_or(DomainError::RoomNotFound)?;

        let (requester_id, opponent_conn) = {
            let room = handle.lock().await;
            let color = room.seat_color(conn).ok_or(DomainError::NotAPlayer)?;
            // A rematch only makes sense over a finished game.
            if room.session().map_or(true, |s| s.is_active()) {
                return Err(DomainError::GameNotFound);
            }
            let (me, _) = room.seat(color).ok_or(DomainError::NotAPlayer)?;
            let (_, opponent_conn) = room
                .seat(color.opponent())
                .ok_or(DomainError::NotAPlayer)?;
            (me.id, opponent_conn)
        };

        self.connections
            .send(opponent_conn, ServerMessage::RematchRequested { requester_id })
            .await;
        Ok(())
    }

    async fn on_rematch_response(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        accepted: bool,
    ) -> Result<(), DomainError> {
        let handle = self
            .rooms
            .room(room_id)
            .await
            .ok_or(DomainError::RoomNotFound)?;
        let conns = {
            let room = handle.lock().await;
            room.seat_color(conn).ok_or(DomainError::NotAPlayer)?;
            room.connections()
        };

        if !accepted {
            self.connections
                .send_many(&conns, &ServerMessage::RematchResult { accepted: false })
                .await;
            return Ok(());
        }

        self.rooms.reset_for_rematch(room_id).await?;
        self.connections
            .send_many(&conns, &ServerMessage::RematchResult { accepted: true })
            .await;
        self.begin_game(room_id).await
    }

    // ---- rating and stats ----

    /// Applies the rating exchange for a finished game and pushes the new
    /// numbers to both players, the stats store, and the room seats.
    async fn settle(
        &self,
        room_id: RoomId,
        result: &GameResult,
        host_seat: &(PlayerProfile, ConnectionId),
        guest_seat: Option<&(PlayerProfile, ConnectionId)>,
    ) {
        let Some(guest_seat) = guest_seat else {
            return;
        };

        let (host_score, guest_score) = match result.winner {
            Winner::Black => (MatchScore::Win, MatchScore::Loss),
            Winner::White => (MatchScore::Loss, MatchScore::Win),
            Winner::Draw => (MatchScore::Draw, MatchScore::Draw),
        };

        let pairs = [
            (host_seat, host_score, guest_seat.0.rating),
            (guest_seat, guest_score, host_seat.0.rating),
        ];
        for ((profile, conn), score, opponent_rating) in pairs {
            let change = rating::rate(profile.rating, opponent_rating, score);
            let mut updated = profile.clone();
            updated.rating = change.new_rating;
            updated.rank = change.rank;
            match score {
                MatchScore::Win => updated.wins += 1,
                MatchScore::Loss => updated.losses += 1,
                MatchScore::Draw => {}
            }

            self.connections.set_profile(*conn, updated.clone()).await;
            self.rooms.update_profile(room_id, *conn, updated.clone()).await;

            if let Err(err) = self
                .stats
                .record(StatsUpdate {
                    user_id: updated.id,
                    rating: updated.rating,
                    rating_change: change.delta,
                    wins: updated.wins,
                    losses: updated.losses,
                    rank: updated.rank,
                })
                .await
            {
                tracing::warn!(user = %updated.id, error = %err, "stats update dropped");
            }

            self.connections
                .send(
                    *conn,
                    ServerMessage::StatsUpdate {
                        rating: updated.rating,
                        rating_change: change.delta,
                        wins: updated.wins,
                        losses: updated.losses,
                        rank: updated.rank,
                    },
                )
                .await;
        }
    }

    // ---- turn clock ----

    async fn start_timer(&self, room_id: RoomId) {
        let generation = self.timer_seq.fetch_add(1, Ordering::Relaxed);
        let weak = self.self_ref.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(gateway) = weak.upgrade() else { return };
                if !gateway.tick_room(room_id).await {
                    break;
                }
            }
            // Stopped on its own (timeout, room gone): drop the handle this
            // task left in the map. A rematch may already have replaced it
            // with a newer timer, so only this generation's entry is removed.
            if let Some(gateway) = weak.upgrade() {
                let mut timers = gateway.timers.lock().await;
                if timers.get(&room_id).map(|(g, _)| *g) == Some(generation) {
                    timers.remove(&room_id);
                }
            }
        });

        if let Some((_, old)) = self.timers.lock().await.insert(room_id, (generation, task)) {
            old.abort();
        }
    }

    async fn stop_timer(&self, room_id: RoomId) {
        if let Some((_, task)) = self.timers.lock().await.remove(&room_id) {
            task.abort();
        }
    }

    #[cfg(test)]
    async fn timer_count(&self) -> usize {
        self.timers.lock().await.len()
    }

    /// One clock tick for a room. Returns false when the timer should stop.
    async fn tick_room(&self, room_id: RoomId) -> bool {
        let Some(handle) = self.rooms.room(room_id).await else {
            return false;
        };

        let tick = {
            let mut room = handle.lock().await;
            let Some(session) = room.session_mut() else {
                return false;
            };
            if !session.is_active() {
                return false;
            }

            let remaining = session.tick_second();
            if remaining > 0 {
                Ok((session.color_to_move(), remaining, room.connections()))
            } else {
                let result = session.timeout();
                room.finish();
                let seats = (
                    room.seat(StoneColor::Black).map(|(p, c)| (p.clone(), c)),
                    room.seat(StoneColor::White).map(|(p, c)| (p.clone(), c)),
                );
                Err((result, seats, room.connections()))
            }
        };

        match tick {
            Ok((color, remaining, conns)) => {
                self.connections
                    .send_many(
                        &conns,
                        &ServerMessage::TurnUpdate {
                            color_to_move: color,
                            time_remaining_secs: remaining,
                        },
                    )
                    .await;
                true
            }
            Err((result, seats, conns)) => {
                if let Some(result) = result {
                    tracing::info!(room_id = %room_id, "turn clock expired");
                    self.connections
                        .send_many(&conns, &ServerMessage::GameEnd { result: result.clone() })
                        .await;
                    if let (Some(host), guest) = seats {
                        self.settle(room_id, &result, &host, guest.as_ref()).await;
                    }
                    self.broadcast_room_list().await;
                }
                false
            }
        }
    }
}
