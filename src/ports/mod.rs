//! Ports - trait seams for external collaborators.
//!
//! Identity issuance and stat persistence live outside this process; the
//! gateway only talks to them through these interfaces.

mod profile_directory;
mod stats_store;

pub use profile_directory::ProfileDirectory;
pub use stats_store::{StatsError, StatsStore, StatsUpdate};
