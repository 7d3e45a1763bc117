//! Table, map and status renderers
//!
//! Renderers turn store insertions into draw commands on a [`RenderSink`].
//! They hold only counters and layout state, so the whole pipeline can be
//! exercised without a rendering surface.

use tracing::{debug, info};

use super::incident::{Incident, IncidentId, LatLon};
use super::visual::{marker_style, severity_color, severity_percent, MarkerStyle, SeverityColor};
use crate::time::format_local;

/// Narrow drawing interface implemented by the UI (or a test recorder)
pub trait RenderSink {
    /// Add a row above all existing rows
    fn insert_row(&mut self, row: TableRow);
    /// Drop the bottom (oldest) row
    fn evict_oldest_row(&mut self);
    /// Add a marker to the clustering layer
    fn place_marker(&mut self, marker: MarkerSpec);
    /// Move the map view so `bounds` is visible
    fn fit_viewport(&mut self, bounds: GeoBounds);
    /// Add a severity sample at the incident's occurrence time
    fn plot_severity(&mut self, _occurred_ts: i64, _id: IncidentId, _severity: f64) {}
}

/// Pre-formatted table cells
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub id: IncidentId,
    pub source: String,
    pub title: String,
    pub magnitude: String,
    pub severity: String,
    pub occurred: String,
    /// Same encoding as the marker fill
    pub color: SeverityColor,
}

impl TableRow {
    pub fn from_incident(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            source: incident.source.clone(),
            title: incident.title.clone().unwrap_or_default(),
            magnitude: format_magnitude(incident.magnitude),
            severity: format!("{}%", severity_percent(incident.severity)),
            occurred: incident.occurred_ts.map(format_local).unwrap_or_default(),
            color: severity_color(incident.severity),
        }
    }
}

fn format_magnitude(magnitude: Option<f64>) -> String {
    magnitude.map(|m| m.to_string()).unwrap_or_default()
}

/// Detail popup attached to a marker
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerPopup {
    pub source: String,
    pub title: String,
    pub magnitude: String,
    pub severity_pct: i64,
    pub location_text: Option<String>,
    pub maps_link: String,
}

/// A single map marker, styled by severity
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub id: IncidentId,
    pub position: LatLon,
    pub severity: f64,
    pub style: MarkerStyle,
    pub popup: MarkerPopup,
}

impl MarkerSpec {
    pub fn new(incident: &Incident, position: LatLon, maps_host: &str) -> Self {
        Self {
            id: incident.id,
            position,
            severity: incident.severity,
            style: marker_style(incident.severity),
            popup: MarkerPopup {
                source: incident.source.clone(),
                title: incident.title.clone().unwrap_or_default(),
                magnitude: format_magnitude(incident.magnitude),
                severity_pct: severity_percent(incident.severity),
                location_text: incident.location_text.clone(),
                maps_link: maps_link(maps_host, position),
            },
        }
    }
}

/// External map-service deep link for a position
pub fn maps_link(host: &str, position: LatLon) -> String {
    format!("https://{}/maps?q={},{}", host, position.lat, position.lon)
}

/// Latitude/longitude bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn from_point(p: LatLon) -> Self {
        Self {
            south: p.lat,
            west: p.lon,
            north: p.lat,
            east: p.lon,
        }
    }

    pub fn extend(&mut self, p: LatLon) {
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
        self.west = self.west.min(p.lon);
        self.east = self.east.max(p.lon);
    }

    /// Grow by `ratio` of the height/width on every side
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = (self.north - self.south).abs() * ratio;
        let lon_buffer = (self.east - self.west).abs() * ratio;
        Self {
            south: self.south - lat_buffer,
            west: self.west - lon_buffer,
            north: self.north + lat_buffer,
            east: self.east + lon_buffer,
        }
    }

    /// Widen degenerate boxes (a single marker) around their center
    pub fn with_min_span(&self, min_degrees: f64) -> Self {
        let center = self.center();
        let half_lat = ((self.north - self.south) / 2.0).max(min_degrees / 2.0);
        let half_lon = ((self.east - self.west) / 2.0).max(min_degrees / 2.0);
        Self {
            south: center.lat - half_lat,
            west: center.lon - half_lon,
            north: center.lat + half_lat,
            east: center.lon + half_lon,
        }
    }

    pub fn center(&self) -> LatLon {
        LatLon::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}

/// Maintains the capped newest-first table
pub struct TableRenderer {
    cap: usize,
    rows: usize,
}

impl TableRenderer {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1), rows: 0 }
    }

    pub fn on_insert<S: RenderSink + ?Sized>(&mut self, incident: &Incident, sink: &mut S) {
        sink.insert_row(TableRow::from_incident(incident));
        self.rows += 1;
        while self.rows > self.cap {
            sink.evict_oldest_row();
            self.rows -= 1;
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }
}

/// Places markers and fits the viewport once after the snapshot
pub struct MapRenderer {
    maps_host: String,
    padding: f64,
    markers: usize,
    bounds: Option<GeoBounds>,
    viewport_fitted: bool,
}

impl MapRenderer {
    pub fn new(maps_host: &str, padding: f64) -> Self {
        Self {
            maps_host: maps_host.to_string(),
            padding,
            markers: 0,
            bounds: None,
            viewport_fitted: false,
        }
    }

    /// Returns true when a marker was placed.
    ///
    /// Invalid coordinates suppress the marker only; the row is unaffected.
    pub fn on_insert<S: RenderSink + ?Sized>(&mut self, incident: &Incident, sink: &mut S) -> bool {
        let Some(position) = incident.position else {
            return false;
        };
        if !position.is_valid() {
            debug!(id = incident.id.0, lat = position.lat, lon = position.lon, "Skipping marker with invalid coordinates");
            return false;
        }

        sink.place_marker(MarkerSpec::new(incident, position, &self.maps_host));
        self.markers += 1;
        match self.bounds.as_mut() {
            Some(bounds) => bounds.extend(position),
            None => self.bounds = Some(GeoBounds::from_point(position)),
        }
        true
    }

    /// Fit the view to every current marker, padded, at most once per session.
    ///
    /// Later calls are no-ops even when the first one found no markers.
    pub fn fit_initial_viewport<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> Option<GeoBounds> {
        if self.viewport_fitted {
            return None;
        }
        self.viewport_fitted = true;

        let padded = self.bounds?.pad(self.padding);
        info!(
            south = padded.south,
            west = padded.west,
            north = padded.north,
            east = padded.east,
            markers = self.markers,
            "Fitting viewport to snapshot markers"
        );
        sink.fit_viewport(padded);
        Some(padded)
    }

    pub fn marker_count(&self) -> usize {
        self.markers
    }

    /// Bounding box of every placed marker
    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }
}

/// Summary line derived from render-side counters
#[derive(Default)]
pub struct StatusReporter {
    line: String,
}

impl StatusReporter {
    pub fn update(&mut self, rows: usize, markers: usize) {
        self.line = format_status(rows, markers);
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

pub fn format_status(rows: usize, markers: usize) -> String {
    format!("Rows: {}  \u{2022}  Markers: {}", rows, markers)
}
