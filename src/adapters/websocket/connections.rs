//! Connection registry: outbound channels and per-connection session state.
//!
//! Each WebSocket connection owns an unbounded mpsc channel drained by its
//! send task. The registry maps connection ids to those senders plus the
//! issued profile and the room the connection currently sits in, so the
//! gateway can address messages without touching sockets directly.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::player::PlayerProfile;

use super::messages::ServerMessage;

struct ConnectionState {
    sender: mpsc::UnboundedSender<ServerMessage>,
    profile: Option<PlayerProfile>,
    current_room: Option<RoomId>,
}

/// Tracks every live connection and where to deliver its messages.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<HashMap<ConnectionId, ConnectionState>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, conn: ConnectionId, sender: mpsc::UnboundedSender<ServerMessage>) {
        self.inner.write().await.insert(
            conn,
            ConnectionState {
                sender,
                profile: None,
                current_room: None,
            },
        );
    }

    pub async fn unregister(&self, conn: ConnectionId) {
        self.inner.write().await.remove(&conn);
    }

    pub async fn set_profile(&self, conn: ConnectionId, profile: PlayerProfile) {
        if let Some(state) = self.inner.write().await.get_mut(&conn) {
            state.profile = Some(profile);
        }
    }

    pub async fn profile(&self, conn: ConnectionId) -> Option<PlayerProfile> {
        self.inner.read().await.get(&conn)?.profile.clone()
    }

    pub async fn set_room(&self, conn: ConnectionId, room: Option<RoomId>) {
        if let Some(state) = self.inner.write().await.get_mut(&conn) {
            state.current_room = room;
        }
    }

    pub async fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.inner.read().await.get(&conn)?.current_room
    }

    /// Delivers one message; silently drops it if the connection is gone or
    /// its send task has shut down.
    pub async fn send(&self, conn: ConnectionId, message: ServerMessage) {
        if let Some(state) = self.inner.read().await.get(&conn) {
            let _ = state.sender.send(message);
        }
    }

    pub async fn send_many(&self, conns: &[ConnectionId], message: &ServerMessage) {
        let inner = self.inner.read().await;
        for conn in conns {
            if let Some(state) = inner.get(conn) {
                let _ = state.sender.send(message.clone());
            }
        }
    }

    /// Connections in the lobby: profiled but not attached to any room.
    /// Room list broadcasts go to exactly this set.
    pub async fn lobby_members(&self) -> Vec<ConnectionId> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|(_, state)| state.profile.is_some() && state.current_room.is_none())
            .map(|(conn, _)| *conn)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        mpsc::UnboundedSender<ServerMessage>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn send_reaches_registered_connection() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        let (tx, mut rx) = channel();
        registry.register(conn, tx).await;

        registry
            .send(
                conn,
                ServerMessage::MatchmakingStatus {
                    is_searching: false,
                    estimated_wait_secs: 0,
                },
            )
            .await;

        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::MatchmakingStatus { .. })
        ));
    }

    #[tokio::test]
    async fn send_to_unknown_connection_is_a_noop() {
        let registry = ConnectionRegistry::new();
        registry
            .send(
                ConnectionId::new(),
                ServerMessage::RoomsUpdate { rooms: vec![] },
            )
            .await;
    }

    #[tokio::test]
    async fn lobby_members_excludes_seated_connections() {
        let registry = ConnectionRegistry::new();
        let in_lobby = ConnectionId::new();
        let in_room = ConnectionId::new();
        let anonymous = ConnectionId::new();

        for conn in [in_lobby, in_room, anonymous] {
            let (tx, _rx) = channel();
            registry.register(conn, tx).await;
        }
        registry
            .set_profile(in_lobby, PlayerProfile::guest("a".into(), "A".into()))
            .await;
        registry
            .set_profile(in_room, PlayerProfile::guest("b".into(), "B".into()))
            .await;
        registry.set_room(in_room, Some(RoomId::new())).await;

        let members = registry.lobby_members().await;
        assert_eq!(members, vec![in_lobby]);
    }

    #[tokio::test]
    async fn unregister_forgets_state() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        let (tx, _rx) = channel();
        registry.register(conn, tx).await;
        registry
            .set_profile(conn, PlayerProfile::guest("a".into(), "A".into()))
            .await;

        registry.unregister(conn).await;
        assert!(registry.profile(conn).await.is_none());
        assert_eq!(registry.len().await, 0);
    }
}
