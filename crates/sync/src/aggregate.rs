use std::sync::Arc;

use futures::future::join_all;
use relayarr_core::types::MediaRecord;
use relayarr_sources::SourceError;
use relayarr_sources::normalize::{self, NormalizeContext};
use relayarr_sources::payload::{MovieResource, SeriesResource};
use relayarr_sources::provider::{MovieSource, RequestSource, SeriesSource};
use relayarr_sources::users::UserDirectory;
use tracing::{error, info};

/// The three upstream services. Either download source may be absent.
#[derive(Clone)]
pub struct Sources {
    pub requests: Arc<dyn RequestSource>,
    pub series: Option<Arc<dyn SeriesSource>>,
    pub movies: Option<Arc<dyn MovieSource>>,
    /// Public base URL of the request manager, for item links.
    pub public_url: String,
}

/// One item (or collection) that could not be turned into a record.
#[derive(Debug)]
pub struct AggregateFailure {
    pub subject: String,
    pub error: SourceError,
}

impl std::fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

#[derive(Debug, Default)]
pub struct Aggregated {
    pub records: Vec<MediaRecord>,
    pub failures: Vec<AggregateFailure>,
}

/// Fetch and normalize every managed item. Each item runs its own pipeline;
/// a failure is recorded and never affects its siblings.
pub async fn aggregate(sources: &Sources, users: &UserDirectory) -> Aggregated {
    let ctx = NormalizeContext {
        public_url: &sources.public_url,
        users,
    };
    let mut out = Aggregated::default();

    let (series, movies) = tokio::join!(list_series(sources), list_movies(sources));
    let series = series.unwrap_or_else(|e| {
        out.failures.push(collection_failure("series collection", e));
        Vec::new()
    });
    let movies = movies.unwrap_or_else(|e| {
        out.failures.push(collection_failure("movie collection", e));
        Vec::new()
    });

    let requests = sources.requests.as_ref();
    let tv = async {
        match sources.series.as_deref() {
            Some(listing) => {
                join_all(series.iter().map(|s| tv_item(requests, listing, s, ctx))).await
            }
            None => Vec::new(),
        }
    };
    let (tv_results, movie_results) = tokio::join!(
        tv,
        join_all(movies.iter().map(|m| movie_item(requests, m, ctx))),
    );

    for result in tv_results.into_iter().chain(movie_results) {
        match result {
            Ok(record) => out.records.push(record),
            Err(failure) => {
                error!(subject = %failure.subject, error = %failure.error, "item excluded from run");
                out.failures.push(failure);
            }
        }
    }

    info!(
        series = series.len(),
        movies = movies.len(),
        records = out.records.len(),
        failures = out.failures.len(),
        "aggregation finished"
    );
    out
}

async fn list_series(sources: &Sources) -> Result<Vec<SeriesResource>, SourceError> {
    match &sources.series {
        Some(source) => source.series().await,
        None => Ok(Vec::new()),
    }
}

async fn list_movies(sources: &Sources) -> Result<Vec<MovieResource>, SourceError> {
    match &sources.movies {
        Some(source) => source.movies().await,
        None => Ok(Vec::new()),
    }
}

async fn tv_item(
    requests: &dyn RequestSource,
    listing: &dyn SeriesSource,
    series: &SeriesResource,
    ctx: NormalizeContext<'_>,
) -> Result<MediaRecord, AggregateFailure> {
    let subject = format!(
        "series {} ({})",
        series.id,
        series.title.as_deref().unwrap_or("untitled")
    );
    let fail = |error: SourceError| AggregateFailure {
        subject: subject.clone(),
        error,
    };

    let tmdb_id = tmdb_id(series.tmdb_id).map_err(fail)?;
    let (details, episodes) =
        tokio::join!(requests.tv_details(tmdb_id), listing.episodes(series.id));

    normalize::tv_record(&details.map_err(fail)?, &episodes.map_err(fail)?, ctx).map_err(fail)
}

async fn movie_item(
    requests: &dyn RequestSource,
    movie: &MovieResource,
    ctx: NormalizeContext<'_>,
) -> Result<MediaRecord, AggregateFailure> {
    let subject = format!(
        "movie {} ({})",
        movie.id,
        movie.title.as_deref().unwrap_or("untitled")
    );
    let fail = |error: SourceError| AggregateFailure {
        subject: subject.clone(),
        error,
    };

    let tmdb_id = tmdb_id(movie.tmdb_id).map_err(fail)?;
    let details = requests.movie_details(tmdb_id).await.map_err(fail)?;
    normalize::movie_record(&details, ctx).map_err(fail)
}

fn tmdb_id(id: Option<i64>) -> Result<i64, SourceError> {
    id.filter(|id| *id > 0)
        .ok_or_else(|| SourceError::Mapping("managed item has no tmdb id".into()))
}

fn collection_failure(subject: &str, error: SourceError) -> AggregateFailure {
    error!(subject, error = %error, "could not list collection");
    AggregateFailure {
        subject: subject.to_string(),
        error,
    }
}
