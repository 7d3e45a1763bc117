//! Incident record and payload decoding
//!
//! Only `id` and `severity` are required. Everything else the API sends is
//! optional, and unknown fields (`created_at`, `h3`, ...) are ignored.

use serde::Deserialize;
use std::fmt;
use tracing::{debug, trace};

use super::error::MalformedIncident;

/// Server-assigned incident identifier; doubles as the stream resume cursor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub u64);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic position in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A single reported event. Never mutated after decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct Incident {
    pub id: IncidentId,
    pub source: String,
    pub title: Option<String>,
    pub magnitude: Option<f64>,
    /// Normalized to [0, 1]
    pub severity: f64,
    /// Unix seconds
    pub occurred_ts: Option<i64>,
    /// Present only when both lat and lon were sent
    pub position: Option<LatLon>,
    pub location_text: Option<String>,
}

/// Wire shape as served by `/api/incidents` and the `incident` stream event
#[derive(Deserialize)]
struct RawIncident {
    id: IncidentId,
    severity: f64,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    magnitude: Option<f64>,
    #[serde(default)]
    occurred_ts: Option<f64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    location_text: Option<String>,
}

impl TryFrom<RawIncident> for Incident {
    type Error = MalformedIncident;

    fn try_from(raw: RawIncident) -> Result<Self, Self::Error> {
        if !raw.severity.is_finite() {
            return Err(MalformedIncident::NonFiniteSeverity(raw.severity));
        }
        let severity = raw.severity.clamp(0.0, 1.0);
        if severity != raw.severity {
            debug!(id = raw.id.0, severity = raw.severity, "Severity clamped into [0, 1]");
        }

        let position = match (raw.lat, raw.lon) {
            (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
            (None, None) => None,
            _ => {
                trace!(id = raw.id.0, "Incident has only one coordinate, treating as unlocated");
                None
            }
        };

        Ok(Incident {
            id: raw.id,
            source: raw.source.unwrap_or_default(),
            title: raw.title,
            magnitude: raw.magnitude,
            severity,
            occurred_ts: raw
                .occurred_ts
                .filter(|ts| ts.is_finite())
                .map(|ts| ts.floor() as i64),
            position,
            location_text: raw.location_text,
        })
    }
}

/// Decode a single incident payload (one stream message)
pub fn decode_incident(payload: &str) -> Result<Incident, MalformedIncident> {
    let raw: RawIncident = serde_json::from_str(payload)?;
    Incident::try_from(raw)
}

/// Decode the snapshot array. One bad element fails the whole batch.
pub fn decode_snapshot(payload: &str) -> Result<Vec<Incident>, MalformedIncident> {
    let raw: Vec<RawIncident> = serde_json::from_str(payload)?;
    raw.into_iter().map(Incident::try_from).collect()
}

#[cfg(test)]
pub(crate) fn sample(id: u64, severity: f64, position: Option<(f64, f64)>) -> Incident {
    Incident {
        id: IncidentId(id),
        source: "usgs".to_string(),
        title: Some(format!("incident {id}")),
        magnitude: Some(4.5),
        severity,
        occurred_ts: Some(1_700_000_000),
        position: position.map(|(lat, lon)| LatLon::new(lat, lon)),
        location_text: None,
    }
}
