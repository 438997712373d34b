//! Gomoku Arena - Real-time connect-five game server
//!
//! Enforces gomoku rules, tracks match and room state, pairs opposing
//! players by skill, and keeps all of it consistent under concurrent
//! events from independent connections and background timers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
