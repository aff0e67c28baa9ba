use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Media discriminant stored in the `media_snapshot.media_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request lifecycle status of a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaStatus {
    Pending,
    Processing,
    Available,
    Blacklisted,
    Unknown,
}

impl MediaStatus {
    /// Map a request-manager media status code. Unmapped codes become `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Pending,
            // "partially available": some content is in, the rest is still in flight
            3 | 4 => Self::Processing,
            5 => Self::Available,
            6 => Self::Blacklisted,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Available => "Available",
            Self::Blacklisted => "Blacklisted",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Someone who asked for the item. `chat_id` is their messaging-platform user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub display_name: String,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Season {
    pub available: bool,
    pub episodes: BTreeMap<u32, Episode>,
}

impl Season {
    /// Build a season whose `available` flag is the AND over its episodes.
    /// A season with no episodes is never available.
    pub fn from_episodes(episodes: BTreeMap<u32, Episode>) -> Self {
        let available = !episodes.is_empty() && episodes.values().all(|e| e.available);
        Self {
            available,
            episodes,
        }
    }
}

/// Per-type payload of a [`MediaRecord`]. Movies carry no season tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "media_type", rename_all = "snake_case")]
pub enum MediaDetails {
    Movie,
    Tv { seasons: BTreeMap<u32, Season> },
}

/// Canonical, source-agnostic state of one tracked item.
///
/// Only serialized: stored snapshots are read back through a tolerant partial
/// shape because older rows may predate fields added here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub image_url: String,
    pub link: String,
    pub status: MediaStatus,
    /// Fraction in `[0, 1]` over all in-flight downloads for the item.
    pub download_progress: f64,
    pub requesters: Vec<Requester>,
    #[serde(flatten)]
    pub details: MediaDetails,
}

impl MediaRecord {
    pub fn media_type(&self) -> MediaType {
        match self.details {
            MediaDetails::Movie => MediaType::Movie,
            MediaDetails::Tv { .. } => MediaType::Tv,
        }
    }

    pub fn key(&self) -> MediaKey {
        MediaKey {
            media_type: self.media_type(),
            source_id: self.id,
        }
    }

    pub fn seasons(&self) -> Option<&BTreeMap<u32, Season>> {
        match &self.details {
            MediaDetails::Movie => None,
            MediaDetails::Tv { seasons } => Some(seasons),
        }
    }
}

/// Compound key `(media_type, source_id)` identifying a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaKey {
    pub media_type: MediaType,
    pub source_id: i64,
}

impl std::fmt::Display for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.media_type, self.source_id)
    }
}

/// An observed change worth telling the requesters about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StatusChanged { status: MediaStatus },
    SeasonAvailable { season: u32 },
    EpisodeAvailable { season: u32, episode: u32 },
}
