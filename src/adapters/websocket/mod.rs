//! Real-time game transport: the WebSocket endpoint, the wire protocol, the
//! connection registry, and the event gateway that ties them to the
//! application layer.

pub mod connections;
pub mod gateway;
pub mod handler;
pub mod messages;

pub use connections::ConnectionRegistry;
pub use gateway::EventGateway;
pub use handler::websocket_router;
pub use messages::{ClientMessage, ServerMessage};
