//! Application-level configuration loading for scoring-flow policies.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FAIRWAY_LIVE_CONFIG_PATH";

/// Consecutive stat-collection skips after which prompting goes quiet.
const DEFAULT_STAT_SKIP_THRESHOLD: u8 = 3;
/// Lifetime of an unanswered marker-transfer request.
const DEFAULT_TRANSFER_TTL_SECS: u64 = 120;
/// Broadcast channel capacity for each round's event stream.
const DEFAULT_STREAM_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    stat_skip_threshold: u8,
    transfer_request_ttl: Duration,
    stream_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in
    /// defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        skip_threshold = config.stat_skip_threshold,
                        transfer_ttl_secs = config.transfer_request_ttl.as_secs(),
                        "loaded scoring-flow policies from config"
                    );
                    config
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

    /// Skip streak length that suppresses stat prompting for the round.
    pub fn stat_skip_threshold(&self) -> u8 {
        self.stat_skip_threshold
    }

    /// How long a transfer request stays pending before lapsing.
    pub fn transfer_request_ttl(&self) -> Duration {
        self.transfer_request_ttl
    }

    /// Per-round broadcast channel capacity.
    pub fn stream_capacity(&self) -> usize {
        self.stream_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stat_skip_threshold: DEFAULT_STAT_SKIP_THRESHOLD,
            transfer_request_ttl: Duration::from_secs(DEFAULT_TRANSFER_TTL_SECS),
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    stat_skip_threshold: Option<u8>,
    transfer_request_ttl_secs: Option<u64>,
    stream_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            stat_skip_threshold: value
                .stat_skip_threshold
                .unwrap_or(defaults.stat_skip_threshold),
            transfer_request_ttl: value
                .transfer_request_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.transfer_request_ttl),
            stream_capacity: value.stream_capacity.unwrap_or(defaults.stream_capacity),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_missing_fields() {
        let raw = RawConfig {
            stat_skip_threshold: Some(5),
            transfer_request_ttl_secs: None,
            stream_capacity: None,
        };
        let config: AppConfig = raw.into();
        assert_eq!(config.stat_skip_threshold(), 5);
        assert_eq!(
            config.transfer_request_ttl(),
            Duration::from_secs(DEFAULT_TRANSFER_TTL_SECS)
        );
        assert_eq!(config.stream_capacity(), DEFAULT_STREAM_CAPACITY);
    }
}
