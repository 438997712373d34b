//! WebSocket upgrade handler and connection lifecycle.
//!
//! Handles the HTTP → WebSocket upgrade and runs the connection:
//! 1. Upgrade and assign a connection id
//! 2. Register the outbound channel with the gateway
//! 3. Pump inbound frames into the gateway, outbound messages to the socket
//! 4. On either pump ending, tear the connection down through the gateway

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::foundation::ConnectionId;

use super::gateway::EventGateway;
use super::messages::{ClientMessage, ServerMessage};

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(gateway): State<Arc<EventGateway>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, gateway))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, gateway: Arc<EventGateway>) {
    let (mut sender, mut receiver) = socket.split();
    let conn = ConnectionId::new();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    gateway.handle_connect(conn, tx).await;

    // Drain the gateway's outbound channel onto the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(conn = %conn, "send error, closing connection: {}", e);
                break;
            }
        }
    });

    // Feed inbound frames into the gateway.
    let recv_gateway = gateway.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => recv_gateway.dispatch(conn, msg).await,
                    Err(e) => {
                        tracing::debug!(conn = %conn, "unparseable message: {}", e);
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::warn!(conn = %conn, "binary frames are not supported");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level frames; axum answers pings itself.
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(conn = %conn, "client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(conn = %conn, "receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    gateway.handle_disconnect(conn).await;
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).expect("ServerMessage serialization should not fail");
    sender.send(Message::Text(json)).await
}

/// Router exposing the game endpoint.
pub fn websocket_router() -> Router<Arc<EventGateway>> {
    Router::new().route("/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::identity::GuestDirectory;
    use crate::adapters::stats::InMemoryStatsStore;
    use crate::application::matchmaking::MatchmakingQueue;
    use crate::application::rooms::RoomRegistry;

    fn gateway() -> Arc<EventGateway> {
        EventGateway::new(
            Arc::new(RoomRegistry::new(10)),
            Arc::new(MatchmakingQueue::new(100, 50, 10)),
            Arc::new(GuestDirectory::new()),
            Arc::new(InMemoryStatsStore::new()),
            60,
            5,
        )
    }

    #[tokio::test]
    async fn ws_route_rejects_plain_http_requests() {
        let app = websocket_router().with_state(gateway());

        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        // No upgrade headers, so the handshake is refused before any
        // connection state is created.
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let app = websocket_router().with_state(gateway());

        let response = app
            .oneshot(Request::builder().uri("/lobby").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
