//! Client configuration
//!
//! Native builds read overrides from the environment; the browser build
//! passes the page-provided API root to [`ClientConfig::with_api_url`].

use std::time::Duration;
use tracing::warn;

use super::incident::IncidentId;

/// Default API root (override with PULSE_API)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Incidents requested by the snapshot fetch
pub const SNAPSHOT_LIMIT: usize = 200;
/// Largest limit the incidents endpoint accepts
pub const MAX_SNAPSHOT_LIMIT: usize = 500;
/// Rows kept in the table view
pub const TABLE_ROW_CAP: usize = 300;
/// Fraction of the marker bounding box added on each side when fitting the viewport
pub const VIEWPORT_PADDING: f64 = 0.2;
/// Host used for "Open in Maps" deep links
pub const DEFAULT_MAPS_HOST: &str = "www.google.com";
/// EventSource default reconnection delay
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// Screen-space radius within which markers are aggregated into one cluster
pub const CLUSTER_RADIUS_PX: f64 = 40.0;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API root without trailing slash; empty means same origin
    pub api_url: String,
    pub snapshot_limit: usize,
    pub table_cap: usize,
    pub maps_host: String,
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            snapshot_limit: SNAPSHOT_LIMIT,
            table_cap: TABLE_ROW_CAP,
            maps_host: DEFAULT_MAPS_HOST.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by PULSE_API, PULSE_SNAPSHOT_LIMIT and PULSE_MAPS_HOST
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PULSE_API") {
            config = config.with_api_url(&url);
        }
        if let Ok(raw) = std::env::var("PULSE_SNAPSHOT_LIMIT") {
            match raw.parse::<usize>() {
                Ok(limit) => config = config.with_snapshot_limit(limit),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid PULSE_SNAPSHOT_LIMIT"),
            }
        }
        if let Ok(host) = std::env::var("PULSE_MAPS_HOST") {
            if !host.trim().is_empty() {
                config.maps_host = host.trim().to_string();
            }
        }

        config
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Clamped to what the incidents endpoint accepts
    pub fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit.clamp(1, MAX_SNAPSHOT_LIMIT);
        self
    }

    /// `GET /api/incidents?limit=N`
    pub fn snapshot_url(&self) -> String {
        format!("{}/api/incidents?limit={}", self.api_url, self.snapshot_limit)
    }

    /// `GET /stream?last_id=N`
    pub fn stream_url(&self, cursor: IncidentId) -> String {
        format!("{}/stream?last_id={}", self.api_url, cursor)
    }
}
