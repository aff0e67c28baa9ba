use std::collections::HashMap;

use futures::future::join_all;
use relayarr_core::types::Requester;
use tracing::{debug, warn};

use crate::SourceError;
use crate::provider::RequestSource;

/// Request-manager users by id, resolved to how they should be addressed.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<i64, Requester>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: i64, requester: Requester) {
        self.users.insert(user_id, requester);
    }

    pub fn get(&self, user_id: i64) -> Option<&Requester> {
        self.users.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// List every user and resolve their chat id from notification preferences.
///
/// A user whose preferences cannot be fetched is kept without a chat id.
pub async fn load_user_directory(source: &dyn RequestSource) -> Result<UserDirectory, SourceError> {
    let users = source.users().await?;

    let settings = join_all(
        users
            .iter()
            .map(|user| source.notification_settings(user.id)),
    )
    .await;

    let mut directory = UserDirectory::new();
    for (user, settings) in users.into_iter().zip(settings) {
        let chat_id = match settings {
            Ok(s) if s.discord_enabled => s.discord_id.filter(|id| !id.trim().is_empty()),
            Ok(_) => None,
            Err(e) => {
                warn!(user_id = user.id, error = %e, "could not load notification settings");
                None
            }
        };
        let display_name = user
            .display_name
            .or(user.username)
            .unwrap_or_else(|| "Unknown".to_string());
        directory.insert(
            user.id,
            Requester {
                display_name,
                chat_id,
            },
        );
    }

    debug!(users = directory.len(), "user directory loaded");
    Ok(directory)
}
