use serde::Serialize;
use tracing::info;

use crate::SinkError;

/// Channel types that accept messages and threads.
const GUILD_TEXT: u8 = 0;
const GUILD_ANNOUNCEMENT: u8 = 5;

/// Message body: embeds only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub guild_id: Option<String>,
    pub kind: u8,
    pub name: Option<String>,
}

impl Channel {
    pub fn is_text_based(&self) -> bool {
        matches!(self.kind, GUILD_TEXT | GUILD_ANNOUNCEMENT)
    }
}

/// A message as seen on the platform, with the thread started from it if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub id: String,
    pub channel_id: String,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle {
    pub id: String,
}

/// Guild → channel → message/thread primitives consumed by the sink adapter.
#[async_trait::async_trait]
pub trait MessagingPlatform: Send + Sync {
    async fn fetch_guild(&self, guild_id: &str) -> Result<Guild, SinkError>;

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, SinkError>;

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<PostedMessage, SinkError>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<PostedMessage, SinkError>;

    /// `Ok(None)` when the message does not exist.
    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<PostedMessage>, SinkError>;

    async fn start_thread(
        &self,
        channel_id: &str,
        message_id: &str,
        name: &str,
    ) -> Result<ThreadHandle, SinkError>;

    async fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), SinkError>;
}

/// Resolve the configured guild and channel, failing if either is unusable.
pub async fn wait_ready(
    platform: &dyn MessagingPlatform,
    guild_id: &str,
    channel_id: &str,
) -> Result<Channel, SinkError> {
    let guild = platform
        .fetch_guild(guild_id)
        .await
        .map_err(|e| SinkError::Unreachable(format!("guild {guild_id} not reachable: {e}")))?;

    let channel = platform
        .fetch_channel(channel_id)
        .await
        .map_err(|e| SinkError::Unreachable(format!("channel {channel_id} not reachable: {e}")))?;

    if channel.guild_id.as_deref() != Some(guild.id.as_str()) {
        return Err(SinkError::Unreachable(format!(
            "channel {channel_id} does not belong to guild {guild_id}"
        )));
    }
    if !channel.is_text_based() {
        return Err(SinkError::Unreachable(format!(
            "channel {channel_id} is not a text channel"
        )));
    }

    info!(guild = %guild.name, channel_id = %channel.id, "messaging sink ready");
    Ok(channel)
}
