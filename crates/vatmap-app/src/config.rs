//! Runtime configuration from the environment.

use std::time::Duration;

use vatmap_core::ClusterConfig;

const DEFAULT_FEED_URL: &str = "http://localhost:8000";
const DEFAULT_POLL_SECS: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the data proxy.
    pub feed_url: String,
    pub entity_poll: Duration,
    pub fir_poll: Duration,
    pub weather_poll: Duration,
    pub cluster: ClusterConfig,
}

impl Config {
    /// Read configuration from `VATMAP_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = ClusterConfig::default();
        Self {
            feed_url: std::env::var("VATMAP_FEED_URL")
                .unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            entity_poll: poll_from_env("VATMAP_ENTITY_POLL_SECS"),
            fir_poll: poll_from_env("VATMAP_FIR_POLL_SECS"),
            weather_poll: poll_from_env("VATMAP_WEATHER_POLL_SECS"),
            cluster: ClusterConfig {
                radius_px: env_parse("VATMAP_CLUSTER_RADIUS_PX").unwrap_or(defaults.radius_px),
                max_zoom: env_parse("VATMAP_CLUSTER_MAX_ZOOM").unwrap_or(defaults.max_zoom),
                ..defaults
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            entity_poll: Duration::from_secs_f64(DEFAULT_POLL_SECS),
            fir_poll: Duration::from_secs_f64(DEFAULT_POLL_SECS),
            weather_poll: Duration::from_secs_f64(DEFAULT_POLL_SECS),
            cluster: ClusterConfig::default(),
        }
    }
}

fn poll_from_env(key: &str) -> Duration {
    let secs: f64 = env_parse(key).unwrap_or(DEFAULT_POLL_SECS);
    if secs > 0.0 && secs.is_finite() {
        Duration::from_secs_f64(secs)
    } else {
        Duration::from_secs_f64(DEFAULT_POLL_SECS)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
