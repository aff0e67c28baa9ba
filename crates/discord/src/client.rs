//! Discord REST API v10 client.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::SinkError;
use crate::platform::{Channel, Guild, MessagePayload, MessagingPlatform, PostedMessage, ThreadHandle};

const API_BASE: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Threads archive after a day of inactivity.
const THREAD_AUTO_ARCHIVE_MINUTES: u32 = 1440;

/// JSON error codes that identify a vanished object.
const UNKNOWN_CHANNEL: u64 = 10003;
const UNKNOWN_MESSAGE: u64 = 10008;

pub struct DiscordClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct WireGuild {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct WireChannel {
    id: String,
    guild_id: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    channel_id: String,
    thread: Option<WireChannel>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    code: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
}

impl From<WireMessage> for PostedMessage {
    fn from(m: WireMessage) -> Self {
        Self {
            id: m.id,
            channel_id: m.channel_id,
            thread_id: m.thread.map(|t| t.id),
        }
    }
}

impl From<WireChannel> for Channel {
    fn from(c: WireChannel) -> Self {
        Self {
            id: c.id,
            guild_id: c.guild_id,
            kind: c.kind,
            name: c.name,
        }
    }
}

impl DiscordClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, API_BASE)
    }

    /// Point the client at another API root (a proxy, or a local stub in tests).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, SinkError> {
        let url = format!("{}{path}", self.base_url);
        debug!(method = %method, path = %path, "discord request");

        let mut req = self
            .client
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| SinkError::Transient(format!("request {path}: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail: Option<WireError> = resp.json().await.ok();
        let code = detail.as_ref().and_then(|d| d.code);
        match (status, code) {
            // A bare 404 (bad route, proxy) says nothing about the object itself
            (StatusCode::NOT_FOUND, Some(UNKNOWN_MESSAGE)) => Err(SinkError::NotFound),
            (StatusCode::NOT_FOUND, Some(UNKNOWN_CHANNEL)) => Err(SinkError::UnknownChannel),
            (StatusCode::TOO_MANY_REQUESTS, _) => Err(SinkError::RateLimited {
                retry_after_secs: detail.and_then(|d| d.retry_after).unwrap_or(0.0),
            }),
            _ => Err(SinkError::Transient(format!(
                "{path} returned {status}: {}",
                detail
                    .and_then(|d| d.message)
                    .unwrap_or_else(|| "no message".to_string())
            ))),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, SinkError> {
        self.send(method, path, body)
            .await?
            .json()
            .await
            .map_err(|e| SinkError::Transient(format!("parse {path}: {e}")))
    }

    fn payload_json(payload: &MessagePayload) -> Result<serde_json::Value, SinkError> {
        serde_json::to_value(payload).map_err(|e| SinkError::Transient(format!("encode: {e}")))
    }
}

#[async_trait::async_trait]
impl MessagingPlatform for DiscordClient {
    async fn fetch_guild(&self, guild_id: &str) -> Result<Guild, SinkError> {
        let guild: WireGuild = self
            .send_json(Method::GET, &format!("/guilds/{guild_id}"), None)
            .await?;
        Ok(Guild {
            id: guild.id,
            name: guild.name,
        })
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, SinkError> {
        let channel: WireChannel = self
            .send_json(Method::GET, &format!("/channels/{channel_id}"), None)
            .await?;
        Ok(channel.into())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<PostedMessage, SinkError> {
        let message: WireMessage = self
            .send_json(
                Method::POST,
                &format!("/channels/{channel_id}/messages"),
                Some(Self::payload_json(payload)?),
            )
            .await?;
        Ok(message.into())
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<PostedMessage, SinkError> {
        let message: WireMessage = self
            .send_json(
                Method::PATCH,
                &format!("/channels/{channel_id}/messages/{message_id}"),
                Some(Self::payload_json(payload)?),
            )
            .await?;
        Ok(message.into())
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<PostedMessage>, SinkError> {
        let result: Result<WireMessage, SinkError> = self
            .send_json(
                Method::GET,
                &format!("/channels/{channel_id}/messages/{message_id}"),
                None,
            )
            .await;
        match result {
            Ok(message) => Ok(Some(message.into())),
            Err(SinkError::NotFound) => {
                debug!(message_id, "message not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn start_thread(
        &self,
        channel_id: &str,
        message_id: &str,
        name: &str,
    ) -> Result<ThreadHandle, SinkError> {
        let thread: WireChannel = self
            .send_json(
                Method::POST,
                &format!("/channels/{channel_id}/messages/{message_id}/threads"),
                Some(serde_json::json!({
                    "name": name,
                    "auto_archive_duration": THREAD_AUTO_ARCHIVE_MINUTES,
                })),
            )
            .await?;
        Ok(ThreadHandle { id: thread.id })
    }

    async fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), SinkError> {
        self.send(
            Method::PUT,
            &format!("/channels/{thread_id}/thread-members/{user_id}"),
            None,
        )
        .await?;
        Ok(())
    }
}
