use std::sync::Arc;

use anyhow::Context;
use relayarr_discord::client::DiscordClient;
use relayarr_discord::platform::{MessagingPlatform, wait_ready};
use relayarr_server::config::{Config, ServiceConfig};
use relayarr_sources::SourceError;
use relayarr_sources::jellyseerr::JellyseerrClient;
use relayarr_sources::payload::ServiceSettings;
use relayarr_sources::provider::{MovieSource, SeriesSource};
use relayarr_sources::radarr::RadarrClient;
use relayarr_sources::sonarr::SonarrClient;
use relayarr_sync::aggregate::Sources;
use relayarr_sync::orchestrator::Orchestrator;
use relayarr_sync::reconcile::Reconciler;
use relayarr_sync::sink::SinkAdapter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(?config, "configuration loaded");

    let pool = relayarr_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;
    relayarr_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!(db_path = %config.db_path, "migrations complete");

    // The sink must be usable before anything is reconciled
    let discord = Arc::new(DiscordClient::new(&config.discord_token));
    wait_ready(
        &*discord,
        &config.discord_guild_id,
        &config.discord_channel_id,
    )
    .await
    .context("messaging platform not ready")?;

    let jellyseerr = JellyseerrClient::new(&config.jellyseerr_url, config.jellyseerr_api_key.clone());
    let sonarr = resolve_service("sonarr", config.sonarr.clone(), jellyseerr.sonarr_settings())
        .await
        .map(|s| SonarrClient::new(&s.url, s.api_key));
    let radarr = resolve_service("radarr", config.radarr.clone(), jellyseerr.radarr_settings())
        .await
        .map(|s| RadarrClient::new(&s.url, s.api_key));

    if let Some(client) = &sonarr {
        probe("sonarr", client.url(), client.system_status()).await;
    }
    if let Some(client) = &radarr {
        probe("radarr", client.url(), client.system_status()).await;
    }

    let sources = Sources {
        requests: Arc::new(jellyseerr),
        series: sonarr.map(|c| Arc::new(c) as Arc<dyn SeriesSource>),
        movies: radarr.map(|c| Arc::new(c) as Arc<dyn MovieSource>),
        public_url: config.jellyseerr_public_url.clone(),
    };

    let platform: Arc<dyn MessagingPlatform> = discord;
    let sink = SinkAdapter::new(platform, config.discord_channel_id.clone());
    let orchestrator = Arc::new(Orchestrator::new(
        pool.clone(),
        sources,
        Reconciler::new(pool.clone(), sink),
        config.reconcile_concurrency,
    ));

    relayarr_server::scheduler::spawn(orchestrator.clone(), config.sync_interval);

    let app = relayarr_server::routes::build_router(relayarr_server::state::AppState {
        db: pool,
        orchestrator,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Explicit configuration wins; otherwise the first instance registered in
/// the request manager. `None` disables the source.
async fn resolve_service(
    name: &str,
    explicit: Option<ServiceConfig>,
    discovered: impl Future<Output = Result<Vec<ServiceSettings>, SourceError>>,
) -> Option<ServiceConfig> {
    if explicit.is_some() {
        return explicit;
    }

    match discovered.await {
        Ok(settings) => match settings.into_iter().next() {
            Some(first) => {
                info!(service = name, url = %first.url(), "discovered download source");
                Some(ServiceConfig {
                    url: first.url(),
                    api_key: first.api_key,
                })
            }
            None => {
                warn!(service = name, "no instance configured, source disabled");
                None
            }
        },
        Err(e) => {
            warn!(service = name, error = %e, "discovery failed, source disabled");
            None
        }
    }
}

async fn probe<T>(name: &str, url: &str, status: impl Future<Output = Result<T, SourceError>>) {
    match status.await {
        Ok(_) => info!(service = name, url, "download source reachable"),
        Err(e) => warn!(service = name, url, error = %e, "download source not reachable"),
    }
}
