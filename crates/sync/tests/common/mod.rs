#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use relayarr_core::types::{Episode, MediaDetails, MediaRecord, MediaStatus, Requester, Season};
use relayarr_discord::SinkError;
use relayarr_discord::platform::{
    Channel, Guild, MessagePayload, MessagingPlatform, PostedMessage, ThreadHandle,
};
use relayarr_sources::SourceError;
use relayarr_sources::payload::{
    EpisodeResource, MediaInfo, MediaRequest, MovieDetails, MovieResource, NotificationSettings,
    RequestUser, SeriesResource, TvDetails, UserSummary,
};
use relayarr_sources::provider::{MovieSource, RequestSource, SeriesSource};
use relayarr_sync::aggregate::Sources;
use relayarr_sync::reconcile::Reconciler;
use relayarr_sync::sink::SinkAdapter;
use sqlx::SqlitePool;

pub const CHANNEL: &str = "chan-1";

pub async fn test_pool() -> SqlitePool {
    let pool = relayarr_db::connect(":memory:").await.unwrap();
    relayarr_db::migrate::run(&pool).await.unwrap();
    pool
}

pub fn reconciler(pool: &SqlitePool, platform: &Arc<FakePlatform>) -> Reconciler {
    let platform: Arc<dyn MessagingPlatform> = platform.clone();
    Reconciler::new(
        pool.clone(),
        SinkAdapter::new(platform, CHANNEL),
    )
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub fn requester(name: &str, chat_id: Option<&str>) -> Requester {
    Requester {
        display_name: name.to_string(),
        chat_id: chat_id.map(String::from),
    }
}

pub fn movie(id: i64, status: MediaStatus) -> MediaRecord {
    MediaRecord {
        id,
        title: format!("Movie {id}"),
        overview: "A film.".into(),
        image_url: String::new(),
        link: format!("https://requests.example.com/movie/{id}"),
        status,
        download_progress: 0.0,
        requesters: vec![requester("Alice", Some("111"))],
        details: MediaDetails::Movie,
    }
}

/// A series whose seasons are given as `(season, flags)`, one flag per
/// episode: `y` for available, anything else for missing.
pub fn show(id: i64, status: MediaStatus, seasons: &[(u32, &str)]) -> MediaRecord {
    let seasons = seasons
        .iter()
        .map(|(number, flags)| {
            let episodes: BTreeMap<u32, Episode> = flags
                .chars()
                .enumerate()
                .map(|(i, flag)| (i as u32 + 1, Episode { available: flag == 'y' }))
                .collect();
            (*number, Season::from_episodes(episodes))
        })
        .collect();

    MediaRecord {
        id,
        title: format!("Show {id}"),
        overview: String::new(),
        image_url: String::new(),
        link: format!("https://requests.example.com/tv/{id}"),
        status,
        download_progress: 0.0,
        requesters: vec![
            requester("Alice", Some("111")),
            requester("Bob", None),
            requester("Carol", Some("333")),
        ],
        details: MediaDetails::Tv { seasons },
    }
}

// ---------------------------------------------------------------------------
// Messaging platform
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlatformState {
    next_id: u64,
    /// Live messages in the main channel, by id.
    pub messages: HashMap<String, PostedMessage>,
    /// Every message sent, as `(channel or thread id, title)`.
    pub sent: Vec<(String, String)>,
    pub edits: Vec<String>,
    /// `(message id, thread name)` for every started thread.
    pub threads: Vec<(String, String)>,
    /// `(thread id, user id)` for every successful member add.
    pub members: Vec<(String, String)>,
    pub failing_members: HashSet<String>,
    /// Edits report the message as gone even though fetch found it.
    pub edits_vanish: bool,
    pub fail_sends: bool,
    pub fail_fetches: bool,
    /// Threads removed on the platform side.
    pub deleted_threads: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct FakePlatform {
    pub state: Mutex<PlatformState>,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delete_message(&self, id: &str) {
        self.state.lock().unwrap().messages.remove(id);
    }

    /// Titles of everything posted into `target`, in order.
    pub fn titles_in(&self, target: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(to, _)| to == target)
            .map(|(_, title)| title.clone())
            .collect()
    }

    pub fn delete_thread(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .deleted_threads
            .insert(id.to_string());
    }

    pub fn thread_of(&self, message_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(message_id)
            .and_then(|m| m.thread_id.clone())
    }
}

fn title(payload: &MessagePayload) -> String {
    payload
        .embeds
        .first()
        .map(|e| e.title.clone())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl MessagingPlatform for FakePlatform {
    async fn fetch_guild(&self, guild_id: &str) -> Result<Guild, SinkError> {
        Ok(Guild {
            id: guild_id.to_string(),
            name: "Home".into(),
        })
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, SinkError> {
        Ok(Channel {
            id: channel_id.to_string(),
            guild_id: Some("guild-1".into()),
            kind: 0,
            name: Some("media".into()),
        })
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<PostedMessage, SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(SinkError::Transient("500 Internal Server Error".into()));
        }
        if state.deleted_threads.contains(channel_id) {
            return Err(SinkError::UnknownChannel);
        }
        state.next_id += 1;
        let message = PostedMessage {
            id: format!("msg-{}", state.next_id),
            channel_id: channel_id.to_string(),
            thread_id: None,
        };
        state.sent.push((channel_id.to_string(), title(payload)));
        if channel_id == CHANNEL {
            state.messages.insert(message.id.clone(), message.clone());
        }
        Ok(message)
    }

    async fn edit_message(
        &self,
        _channel_id: &str,
        message_id: &str,
        _payload: &MessagePayload,
    ) -> Result<PostedMessage, SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.edits_vanish {
            return Err(SinkError::NotFound);
        }
        let message = state
            .messages
            .get(message_id)
            .cloned()
            .ok_or(SinkError::NotFound)?;
        state.edits.push(message_id.to_string());
        // Edit responses do not carry the thread
        Ok(PostedMessage {
            thread_id: None,
            ..message
        })
    }

    async fn fetch_message(
        &self,
        _channel_id: &str,
        message_id: &str,
    ) -> Result<Option<PostedMessage>, SinkError> {
        let state = self.state.lock().unwrap();
        if state.fail_fetches {
            return Err(SinkError::Transient("502 Bad Gateway".into()));
        }
        Ok(state.messages.get(message_id).cloned())
    }

    async fn start_thread(
        &self,
        _channel_id: &str,
        message_id: &str,
        name: &str,
    ) -> Result<ThreadHandle, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("thread-{}", state.next_id);
        if let Some(message) = state.messages.get_mut(message_id) {
            message.thread_id = Some(id.clone());
        }
        state
            .threads
            .push((message_id.to_string(), name.to_string()));
        Ok(ThreadHandle { id })
    }

    async fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_members.contains(user_id) {
            return Err(SinkError::Transient("403 Forbidden".into()));
        }
        state
            .members
            .push((thread_id.to_string(), user_id.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

fn unreachable(endpoint: impl Into<String>) -> SourceError {
    SourceError::Fetch {
        endpoint: endpoint.into(),
        reason: "connection refused".into(),
    }
}

#[derive(Debug, Default)]
pub struct FakeRequests {
    pub movies: HashMap<i64, MovieDetails>,
    pub shows: HashMap<i64, TvDetails>,
    pub users: Vec<UserSummary>,
    pub settings: HashMap<i64, NotificationSettings>,
    pub users_down: bool,
}

impl FakeRequests {
    pub fn with_user(mut self, id: i64, name: &str, discord_id: Option<&str>) -> Self {
        self.users.push(UserSummary {
            id,
            display_name: Some(name.to_string()),
            username: None,
        });
        self.settings.insert(
            id,
            NotificationSettings {
                discord_enabled: discord_id.is_some(),
                discord_id: discord_id.map(String::from),
            },
        );
        self
    }

    pub fn with_movie(mut self, tmdb_id: i64, title: Option<&str>, status: i64, user: i64) -> Self {
        self.movies.insert(
            tmdb_id,
            MovieDetails {
                id: Some(tmdb_id),
                title: title.map(String::from),
                media_info: Some(media_info(status, user)),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_show(mut self, tmdb_id: i64, name: &str, status: i64, user: i64) -> Self {
        self.shows.insert(
            tmdb_id,
            TvDetails {
                id: Some(tmdb_id),
                name: Some(name.to_string()),
                media_info: Some(media_info(status, user)),
                ..Default::default()
            },
        );
        self
    }
}

fn media_info(status: i64, user: i64) -> MediaInfo {
    MediaInfo {
        status: Some(status),
        requests: vec![MediaRequest {
            id: user * 100,
            requested_by: Some(RequestUser {
                id: user,
                display_name: None,
            }),
        }],
        download_status: Vec::new(),
    }
}

#[async_trait::async_trait]
impl RequestSource for FakeRequests {
    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, SourceError> {
        self.movies
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| unreachable(format!("/movie/{tmdb_id}")))
    }

    async fn tv_details(&self, tmdb_id: i64) -> Result<TvDetails, SourceError> {
        self.shows
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| unreachable(format!("/tv/{tmdb_id}")))
    }

    async fn users(&self) -> Result<Vec<UserSummary>, SourceError> {
        if self.users_down {
            return Err(unreachable("/user"));
        }
        Ok(self.users.clone())
    }

    async fn notification_settings(
        &self,
        user_id: i64,
    ) -> Result<NotificationSettings, SourceError> {
        self.settings
            .get(&user_id)
            .cloned()
            .ok_or_else(|| unreachable(format!("/user/{user_id}/settings/notifications")))
    }
}

#[derive(Debug, Default)]
pub struct FakeSeries {
    pub series: Vec<SeriesResource>,
    /// Episode listings by series id; a missing entry fails the fetch.
    pub episodes: HashMap<i64, Vec<EpisodeResource>>,
    pub down: bool,
}

impl FakeSeries {
    pub fn with_series(mut self, id: i64, tmdb_id: Option<i64>, episodes: &[(u32, u32, bool)]) -> Self {
        self.series.push(SeriesResource {
            id,
            tmdb_id,
            title: Some(format!("Series {id}")),
        });
        self.episodes.insert(
            id,
            episodes
                .iter()
                .map(|&(season_number, episode_number, has_file)| EpisodeResource {
                    season_number,
                    episode_number,
                    has_file,
                })
                .collect(),
        );
        self
    }
}

#[async_trait::async_trait]
impl SeriesSource for FakeSeries {
    async fn series(&self) -> Result<Vec<SeriesResource>, SourceError> {
        if self.down {
            return Err(unreachable("/api/v3/series"));
        }
        Ok(self.series.clone())
    }

    async fn episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>, SourceError> {
        self.episodes
            .get(&series_id)
            .cloned()
            .ok_or_else(|| unreachable("/api/v3/episode"))
    }
}

#[derive(Debug, Default)]
pub struct FakeMovies {
    pub movies: Vec<MovieResource>,
    pub down: bool,
}

impl FakeMovies {
    pub fn with_movie(mut self, id: i64, tmdb_id: Option<i64>) -> Self {
        self.movies.push(MovieResource {
            id,
            tmdb_id,
            title: Some(format!("Radarr {id}")),
        });
        self
    }
}

#[async_trait::async_trait]
impl MovieSource for FakeMovies {
    async fn movies(&self) -> Result<Vec<MovieResource>, SourceError> {
        if self.down {
            return Err(unreachable("/api/v3/movie"));
        }
        Ok(self.movies.clone())
    }
}

pub fn sources(requests: FakeRequests, series: FakeSeries, movies: FakeMovies) -> Sources {
    Sources {
        requests: Arc::new(requests),
        series: Some(Arc::new(series)),
        movies: Some(Arc::new(movies)),
        public_url: "https://requests.example.com".into(),
    }
}
