//! Adapters: concrete implementations at the edges of the system.

pub mod identity;
pub mod stats;
pub mod websocket;
