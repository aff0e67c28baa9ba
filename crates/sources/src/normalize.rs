//! Source normalizer: maps request-manager payloads (plus the series episode
//! listing) onto the canonical [`MediaRecord`].

use std::collections::{BTreeMap, HashSet};

use relayarr_core::types::{
    Episode, MediaDetails, MediaRecord, MediaStatus, MediaType, Requester, Season,
};

use crate::SourceError;
use crate::payload::{DownloadingItem, EpisodeResource, MediaInfo, MovieDetails, TvDetails};
use crate::users::UserDirectory;

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w600_and_h900_bestv2";

/// Everything a mapping needs besides the payload itself.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    /// Public base URL of the request manager, used for item links.
    pub public_url: &'a str,
    pub users: &'a UserDirectory,
}

pub fn movie_record(
    movie: &MovieDetails,
    ctx: NormalizeContext<'_>,
) -> Result<MediaRecord, SourceError> {
    let id = movie
        .id
        .ok_or_else(|| SourceError::Mapping("movie payload has no id".into()))?;
    let title = required_title(movie.title.as_deref(), MediaType::Movie, id)?;
    let info = movie.media_info.clone().unwrap_or_default();

    Ok(MediaRecord {
        id,
        title,
        overview: movie.overview.clone().unwrap_or_default(),
        image_url: image_url(movie.poster_path.as_deref()),
        link: item_link(ctx.public_url, MediaType::Movie, id),
        status: status(&info),
        download_progress: download_progress(&info.download_status),
        requesters: requesters(&info, ctx.users)?,
        details: MediaDetails::Movie,
    })
}

pub fn tv_record(
    series: &TvDetails,
    episodes: &[EpisodeResource],
    ctx: NormalizeContext<'_>,
) -> Result<MediaRecord, SourceError> {
    let id = series
        .id
        .ok_or_else(|| SourceError::Mapping("tv payload has no id".into()))?;
    let title = required_title(series.name.as_deref(), MediaType::Tv, id)?;
    let info = series.media_info.clone().unwrap_or_default();

    Ok(MediaRecord {
        id,
        title,
        overview: series.overview.clone().unwrap_or_default(),
        image_url: image_url(series.poster_path.as_deref()),
        link: item_link(ctx.public_url, MediaType::Tv, id),
        status: status(&info),
        download_progress: download_progress(&info.download_status),
        requesters: requesters(&info, ctx.users)?,
        details: MediaDetails::Tv {
            seasons: season_tree(episodes),
        },
    })
}

/// Aggregate progress over all downloads: fetched bytes over total bytes.
/// Zero when nothing is downloading.
pub fn download_progress(downloads: &[DownloadingItem]) -> f64 {
    let (fetched, total) = downloads.iter().fold((0.0, 0.0), |(fetched, total), d| {
        (fetched + (d.size - d.size_left), total + d.size)
    });

    if total > 0.0 {
        (fetched / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fold an episode listing into seasons, each available iff all its episodes are.
pub fn season_tree(episodes: &[EpisodeResource]) -> BTreeMap<u32, Season> {
    let mut grouped: BTreeMap<u32, BTreeMap<u32, Episode>> = BTreeMap::new();
    for ep in episodes {
        grouped.entry(ep.season_number).or_default().insert(
            ep.episode_number,
            Episode {
                available: ep.has_file,
            },
        );
    }

    grouped
        .into_iter()
        .map(|(number, episodes)| (number, Season::from_episodes(episodes)))
        .collect()
}

fn status(info: &MediaInfo) -> MediaStatus {
    info.status
        .map(MediaStatus::from_code)
        .unwrap_or(MediaStatus::Unknown)
}

/// Requesters in request order, one entry per user.
fn requesters(info: &MediaInfo, users: &UserDirectory) -> Result<Vec<Requester>, SourceError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for request in &info.requests {
        let user = request.requested_by.as_ref().ok_or_else(|| {
            SourceError::Mapping(format!(
                "request {} has no user associated with it",
                request.id
            ))
        })?;
        if !seen.insert(user.id) {
            continue;
        }

        let requester = match users.get(user.id) {
            Some(known) => known.clone(),
            // Not in the directory: fall back to the name carried on the request
            None => Requester {
                display_name: user.display_name.clone().ok_or_else(|| {
                    SourceError::Mapping(format!(
                        "user {} on request {} not found",
                        user.id, request.id
                    ))
                })?,
                chat_id: None,
            },
        };
        out.push(requester);
    }

    Ok(out)
}

fn required_title(title: Option<&str>, media_type: MediaType, id: i64) -> Result<String, SourceError> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .ok_or_else(|| SourceError::Mapping(format!("{media_type} {id} has no title")))
}

fn image_url(poster_path: Option<&str>) -> String {
    poster_path
        .map(|p| p.trim_start_matches('/'))
        .filter(|p| !p.is_empty())
        .map(|p| format!("{IMAGE_BASE}/{p}"))
        .unwrap_or_default()
}

fn item_link(public_url: &str, media_type: MediaType, id: i64) -> String {
    format!("{}/{media_type}/{id}", public_url.trim_end_matches('/'))
}
