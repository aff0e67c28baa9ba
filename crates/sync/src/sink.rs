use std::sync::Arc;

use futures::future::join_all;
use relayarr_core::types::{MediaRecord, Requester, Transition};
use relayarr_discord::SinkError;
use relayarr_discord::platform::{MessagingPlatform, PostedMessage, ThreadHandle};
use relayarr_discord::render;
use tracing::{debug, info, warn};

use crate::SyncError;

/// Keeps exactly one live message per tracked item, with a thread for updates.
#[derive(Clone)]
pub struct SinkAdapter {
    platform: Arc<dyn MessagingPlatform>,
    channel_id: String,
}

/// Result of [`SinkAdapter::upsert`].
#[derive(Debug, Clone)]
pub struct Upserted {
    pub message: PostedMessage,
    /// A new object was created, either first sight or replacing a vanished one.
    pub created: bool,
}

impl SinkAdapter {
    pub fn new(platform: Arc<dyn MessagingPlatform>, channel_id: impl Into<String>) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
        }
    }

    /// Update the object behind `existing` in place, or create one.
    ///
    /// If `existing` refers to a message the platform no longer has, a
    /// replacement is created. The stale snapshot is left for the caller to
    /// swap once the replacement exists, so a failed create loses nothing.
    pub async fn upsert(
        &self,
        record: &MediaRecord,
        existing: Option<&str>,
    ) -> Result<Upserted, SyncError> {
        let payload = render::main_message(record);

        if let Some(message_id) = existing {
            if let Some(live) = self
                .platform
                .fetch_message(&self.channel_id, message_id)
                .await?
            {
                match self
                    .platform
                    .edit_message(&self.channel_id, &live.id, &payload)
                    .await
                {
                    Ok(edited) => {
                        info!(sink_object_id = %edited.id, title = %record.title, "updated message");
                        return Ok(Upserted {
                            message: PostedMessage {
                                thread_id: edited.thread_id.or(live.thread_id),
                                ..edited
                            },
                            created: false,
                        });
                    }
                    // Deleted between fetch and edit
                    Err(SinkError::NotFound) => {}
                    Err(e) => return Err(e.into()),
                }
            }

            warn!(
                sink_object_id = message_id,
                title = %record.title,
                "message no longer exists, recreating"
            );
        }

        let message = self
            .platform
            .send_message(&self.channel_id, &payload)
            .await?;
        info!(sink_object_id = %message.id, title = %record.title, "created message");

        Ok(Upserted {
            message,
            created: true,
        })
    }

    /// The item's thread, started on first use.
    pub async fn thread_for(
        &self,
        message: &PostedMessage,
        record: &MediaRecord,
    ) -> Result<ThreadHandle, SyncError> {
        match &message.thread_id {
            Some(id) => Ok(ThreadHandle { id: id.clone() }),
            None => self.open_thread(message, record).await,
        }
    }

    async fn open_thread(
        &self,
        message: &PostedMessage,
        record: &MediaRecord,
    ) -> Result<ThreadHandle, SyncError> {
        let thread = self
            .platform
            .start_thread(&self.channel_id, &message.id, &render::thread_name(record))
            .await?;
        debug!(thread_id = %thread.id, title = %record.title, "started thread");

        self.add_participants(&thread, &record.requesters).await;
        Ok(thread)
    }

    /// Add every requester with a chat id to the thread. Best effort: each add
    /// is independent and failures are only logged. Returns how many succeeded.
    pub async fn add_participants(&self, thread: &ThreadHandle, requesters: &[Requester]) -> usize {
        let chat_ids: Vec<&str> = requesters
            .iter()
            .filter_map(|r| r.chat_id.as_deref())
            .collect();

        let results = join_all(
            chat_ids
                .iter()
                .map(|id| self.platform.add_thread_member(&thread.id, id)),
        )
        .await;

        let mut added = 0;
        for (chat_id, result) in chat_ids.iter().zip(results) {
            match result {
                Ok(()) => added += 1,
                Err(e) => {
                    warn!(thread_id = %thread.id, chat_id, error = %e, "failed to add member to thread")
                }
            }
        }
        added
    }

    pub async fn notify(
        &self,
        thread: &ThreadHandle,
        transition: &Transition,
    ) -> Result<(), SyncError> {
        self.platform
            .send_message(&thread.id, &render::transition_message(transition))
            .await?;
        info!(thread_id = %thread.id, ?transition, "sent update");
        Ok(())
    }

    /// Send `transitions` in order into the item's thread. A remembered thread
    /// that has been deleted is replaced by a new one.
    pub async fn notify_all(
        &self,
        message: &PostedMessage,
        record: &MediaRecord,
        transitions: &[Transition],
    ) -> Result<(), SyncError> {
        let Some((first, rest)) = transitions.split_first() else {
            return Ok(());
        };

        let mut thread = self.thread_for(message, record).await?;
        match self.notify(&thread, first).await {
            Err(SyncError::Sink(SinkError::UnknownChannel)) if message.thread_id.is_some() => {
                warn!(thread_id = %thread.id, title = %record.title, "thread no longer exists, starting a new one");
                thread = self.open_thread(message, record).await?;
                self.notify(&thread, first).await?;
            }
            result => result?,
        }

        for transition in rest {
            self.notify(&thread, transition).await?;
        }
        Ok(())
    }
}
