//! Guest profile issuer.
//!
//! Stands in for the external identity provider: every lobby join gets a
//! fresh guest profile at the default rating. Registered-account lookup
//! belongs to the real directory outside this process.

use async_trait::async_trait;

use crate::domain::foundation::ConnectionId;
use crate::domain::player::PlayerProfile;
use crate::ports::ProfileDirectory;

/// Issues anonymous guest profiles keyed off the connection id.
#[derive(Debug, Default)]
pub struct GuestDirectory;

impl GuestDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProfileDirectory for GuestDirectory {
    async fn issue_profile(
        &self,
        conn: ConnectionId,
        display_name: Option<String>,
    ) -> PlayerProfile {
        let short = conn.to_string().chars().take(6).collect::<String>();
        let username = format!("guest_{}", short);
        let display = display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Player_{}", short));
        PlayerProfile::guest(username, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issues_guest_with_requested_name() {
        let directory = GuestDirectory::new();
        let profile = directory
            .issue_profile(ConnectionId::new(), Some("Yunseo".into()))
            .await;

        assert!(profile.is_guest);
        assert_eq!(profile.display_name, "Yunseo");
        assert!(profile.username.starts_with("guest_"));
    }

    #[tokio::test]
    async fn blank_name_falls_back_to_generated() {
        let directory = GuestDirectory::new();
        let profile = directory
            .issue_profile(ConnectionId::new(), Some("   ".into()))
            .await;

        assert!(profile.display_name.starts_with("Player_"));
    }
}
