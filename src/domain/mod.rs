//! Domain layer - pure rules and entities.
//!
//! No IO and no locks in here; concurrency discipline lives in the
//! application layer that owns these types.

pub mod foundation;
pub mod game;
pub mod player;
pub mod rating;
