use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_ZONES_PATH: &str = "Dataset/zones.geojson";

pub const ENV_API_URL: &str = "ZONECAST_API_URL";
pub const ENV_ZONES: &str = "ZONECAST_ZONES";
pub const ENV_TIMEOUT_SECS: &str = "ZONECAST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub api_base_url: String,
    pub zones_path: PathBuf,
    /// `None` keeps the HTTP client's own default.
    pub request_timeout: Option<Duration>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            zones_path: PathBuf::from(DEFAULT_ZONES_PATH),
            request_timeout: None,
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_base_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.api_base_url);
        let zones_path = lookup(ENV_ZONES)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.zones_path);
        let request_timeout = lookup(ENV_TIMEOUT_SECS).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => {
                warn!("ignoring {ENV_TIMEOUT_SECS}={raw:?}, expected a positive integer");
                None
            }
        });

        Self {
            api_base_url,
            zones_path,
            request_timeout,
        }
    }
}
