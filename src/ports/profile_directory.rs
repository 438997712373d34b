//! Profile directory port - external identity provider.
//!
//! Credential storage, token issuance, and account lookups are external to
//! this server. The core only needs a profile to seat at a board; the
//! in-process adapter issues guest profiles.

use async_trait::async_trait;

use crate::domain::foundation::ConnectionId;
use crate::domain::player::PlayerProfile;

/// Port for resolving the profile behind a connection.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Issues a profile for a connection entering the lobby.
    ///
    /// `display_name` is the client's requested name; implementations may
    /// ignore or normalize it.
    async fn issue_profile(
        &self,
        conn: ConnectionId,
        display_name: Option<String>,
    ) -> PlayerProfile;
}
