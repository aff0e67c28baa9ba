use std::time::Duration;

use thiserror::Error;

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;
const DEFAULT_DB_PATH: &str = "relayarr.db";
const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// URL and API key of a download-automation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub discord_guild_id: String,
    pub discord_channel_id: String,
    pub jellyseerr_url: String,
    pub jellyseerr_api_key: String,
    /// Base for item links shown to users.
    pub jellyseerr_public_url: String,
    /// `None` means discover from the request manager.
    pub sonarr: Option<ServiceConfig>,
    pub radarr: Option<ServiceConfig>,
    pub sync_interval: Duration,
    pub reconcile_concurrency: usize,
    pub db_path: String,
    pub bind: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_guild_id", &self.discord_guild_id)
            .field("discord_channel_id", &self.discord_channel_id)
            .field("jellyseerr_url", &self.jellyseerr_url)
            .field("jellyseerr_public_url", &self.jellyseerr_public_url)
            .field("sync_interval", &self.sync_interval)
            .field("reconcile_concurrency", &self.reconcile_concurrency)
            .field("db_path", &self.db_path)
            .field("bind", &self.bind)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let jellyseerr_url = strip_slash(require("JELLYSEERR_URL")?);
        let jellyseerr_public_url = get("JELLYSEERR_PUBLIC_URL")
            .map(strip_slash)
            .unwrap_or_else(|| jellyseerr_url.clone());

        Ok(Self {
            discord_token: require("DISCORD_TOKEN")?,
            discord_guild_id: require("DISCORD_GUILD_ID")?,
            discord_channel_id: require("DISCORD_CHANNEL_ID")?,
            jellyseerr_api_key: require("JELLYSEERR_API_KEY")?,
            jellyseerr_url,
            jellyseerr_public_url,
            sonarr: service(&get, "SONARR_URL", "SONARR_API_KEY")?,
            radarr: service(&get, "RADARR_URL", "RADARR_API_KEY")?,
            sync_interval: Duration::from_secs(positive(
                &get,
                "RELAYARR_SYNC_INTERVAL_SECS",
                DEFAULT_SYNC_INTERVAL_SECS,
            )?),
            reconcile_concurrency: positive(&get, "RELAYARR_RECONCILE_CONCURRENCY", 1)? as usize,
            db_path: get("RELAYARR_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            bind: get("RELAYARR_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        })
    }
}

fn strip_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn service(
    get: &impl Fn(&str) -> Option<String>,
    url_var: &'static str,
    key_var: &'static str,
) -> Result<Option<ServiceConfig>, ConfigError> {
    match (get(url_var), get(key_var)) {
        (Some(url), Some(api_key)) => Ok(Some(ServiceConfig {
            url: strip_slash(url),
            api_key,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing(key_var)),
        (None, Some(_)) => Err(ConfigError::Missing(url_var)),
    }
}

fn positive(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = get(var) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".into(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
