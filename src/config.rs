//! Application-level configuration loading: game server location, resync
//! cadence, ingest credentials.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREBOARD_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured game server URL.
const UPSTREAM_URL_ENV: &str = "UPSTREAM_URL";
/// Environment variable that overrides the configured ingest token.
const INGEST_TOKEN_ENV: &str = "INGEST_TOKEN";

const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 5;
const DEFAULT_SSE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    upstream_url: Option<String>,
    resync_interval: Duration,
    ingest_token: Option<String>,
    round_time: Option<u64>,
    sse_capacity: usize,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to
    /// built-in defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        Self::load_from(&path).with_overrides(|key| env::var(key).ok())
    }

    /// Read the JSON file at `path`, without environment overrides.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        upstream = app_config.upstream_url.as_deref().unwrap_or("<none>"),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Apply `UPSTREAM_URL` / `INGEST_TOKEN` style overrides from `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(UPSTREAM_URL_ENV).filter(|value| !value.is_empty()) {
            self.upstream_url = Some(url);
        }
        if let Some(token) = lookup(INGEST_TOKEN_ENV).filter(|value| !value.is_empty()) {
            self.ingest_token = Some(token);
        }
        self
    }

    /// Game server origin to resync from, if any.
    pub fn upstream_url(&self) -> Option<&str> {
        self.upstream_url.as_deref()
    }

    /// Fixed interval between two full scoreboard re-fetches.
    pub fn resync_interval(&self) -> Duration {
        self.resync_interval
    }

    /// Shared secret expected in the `x-ingest-token` header, if ingest is protected.
    pub fn ingest_token(&self) -> Option<&str> {
        self.ingest_token.as_deref()
    }

    /// Round duration configured locally; the game server value wins once fetched.
    pub fn round_time(&self) -> Option<u64> {
        self.round_time
    }

    /// Capacity of each SSE broadcast channel.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    upstream_url: Option<String>,
    resync_interval_secs: Option<u64>,
    ingest_token: Option<String>,
    round_time: Option<u64>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let resync_secs = value
            .resync_interval_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_RESYNC_INTERVAL_SECS);

        Self {
            upstream_url: value.upstream_url.filter(|url| !url.is_empty()),
            resync_interval: Duration::from_secs(resync_secs),
            ingest_token: value.ingest_token.filter(|token| !token.is_empty()),
            round_time: value.round_time,
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_SSE_CAPACITY),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
