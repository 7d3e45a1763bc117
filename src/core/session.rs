//! Dashboard session: the store plus every renderer, wired to one sink
//!
//! All mutable session state lives here and is passed explicitly; nothing
//! is reached through globals.

use tracing::{debug, info, warn};

use super::config::{ClientConfig, VIEWPORT_PADDING};
use super::error::MalformedIncident;
use super::incident::{Incident, IncidentId};
use super::render::{GeoBounds, MapRenderer, RenderSink, StatusReporter, TableRenderer};
use super::store::IncidentStore;

/// Ingestion counters for diagnostics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub ingested: u64,
    pub duplicates: u64,
    pub malformed: u64,
}

/// What happened to one incident handed to [`Session::ingest`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Added { marker: bool },
    Duplicate,
}

pub struct Session<S: RenderSink> {
    store: IncidentStore,
    table: TableRenderer,
    map: MapRenderer,
    status: StatusReporter,
    sink: S,
    counters: SessionCounters,
}

impl<S: RenderSink> Session<S> {
    pub fn new(sink: S, config: &ClientConfig) -> Self {
        let mut status = StatusReporter::default();
        status.update(0, 0);
        Self {
            store: IncidentStore::new(config.table_cap),
            table: TableRenderer::new(config.table_cap),
            map: MapRenderer::new(&config.maps_host, VIEWPORT_PADDING),
            status,
            sink,
            counters: SessionCounters::default(),
        }
    }

    /// Route one incident through the store to the table, map and status line
    pub fn ingest(&mut self, incident: Incident) -> IngestOutcome {
        let Some(receipt) = self.store.ingest(incident) else {
            self.counters.duplicates += 1;
            return IngestOutcome::Duplicate;
        };

        self.table.on_insert(receipt.incident, &mut self.sink);
        if let Some(ts) = receipt.incident.occurred_ts {
            self.sink.plot_severity(ts, receipt.incident.id, receipt.incident.severity);
        }
        let marker = receipt.marked && self.map.on_insert(receipt.incident, &mut self.sink);
        debug!(id = receipt.incident.id.0, marker, "Incident rendered");

        self.counters.ingested += 1;
        self.status.update(self.table.row_count(), self.map.marker_count());
        IngestOutcome::Added { marker }
    }

    /// Replay a newest-first snapshot in chronological order and fit the
    /// map once. Returns the cursor the stream must resume from.
    pub fn load_snapshot(&mut self, newest_first: Vec<Incident>) -> IncidentId {
        let total = newest_first.len();
        for incident in newest_first.into_iter().rev() {
            self.ingest(incident);
        }
        self.map.fit_initial_viewport(&mut self.sink);

        let cursor = self.store.snapshot_cursor();
        info!(
            incidents = total,
            rows = self.table.row_count(),
            markers = self.map.marker_count(),
            cursor = cursor.0,
            "Snapshot loaded"
        );
        cursor
    }

    /// Count a stream payload that failed to decode; the stream keeps going
    pub fn record_malformed(&mut self, error: &MalformedIncident) {
        self.counters.malformed += 1;
        warn!(error = %error, total = self.counters.malformed, "Dropping malformed incident");
    }

    pub fn cursor(&self) -> IncidentId {
        self.store.snapshot_cursor()
    }

    pub fn status_line(&self) -> &str {
        self.status.line()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn marker_count(&self) -> usize {
        self.map.marker_count()
    }

    pub fn marker_bounds(&self) -> Option<GeoBounds> {
        self.map.bounds()
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::incident::sample;
    use crate::core::render::tests::RecordingSink;

    fn session() -> Session<RecordingSink> {
        Session::new(RecordingSink::default(), &ClientConfig::default())
    }

    #[test]
    fn test_snapshot_replayed_oldest_first() {
        let mut s = session();
        let cursor = s.load_snapshot(vec![
            sample(5, 0.9, Some((1.0, 1.0))),
            sample(3, 0.5, Some((2.0, 2.0))),
            sample(1, 0.1, None),
        ]);

        assert_eq!(cursor, IncidentId(5));
        let inserted: Vec<u64> = s.sink().rows.iter().map(|r| r.id.0).collect();
        assert_eq!(inserted, vec![1, 3, 5]);
        assert_eq!(s.sink().viewports.len(), 1);
        assert_eq!(s.status_line(), "Rows: 3  •  Markers: 2");
    }

    #[test]
    fn test_stream_event_after_snapshot() {
        let mut s = session();
        s.load_snapshot(vec![sample(5, 0.9, Some((1.0, 1.0))), sample(3, 0.5, None)]);

        assert_eq!(s.ingest(sample(6, 0.3, Some((3.0, 3.0)))), IngestOutcome::Added { marker: true });
        assert_eq!(s.cursor(), IncidentId(6));
        assert_eq!(s.status_line(), "Rows: 3  •  Markers: 2");
        // Stream-driven markers never refit the view
        assert_eq!(s.sink().viewports.len(), 1);
    }

    #[test]
    fn test_duplicates_counted_not_rendered() {
        let mut s = session();
        s.ingest(sample(2, 0.5, Some((1.0, 1.0))));
        assert_eq!(s.ingest(sample(2, 0.5, Some((1.0, 1.0)))), IngestOutcome::Duplicate);
        assert_eq!(s.sink().rows.len(), 1);
        assert_eq!(s.sink().markers.len(), 1);
        assert_eq!(s.counters(), SessionCounters { ingested: 1, duplicates: 1, malformed: 0 });
    }

    #[test]
    fn test_bad_coordinates_keep_row() {
        let mut s = session();
        assert_eq!(
            s.ingest(sample(1, 0.5, Some((120.0, 0.0)))),
            IngestOutcome::Added { marker: false }
        );
        assert_eq!(s.row_count(), 1);
        assert_eq!(s.marker_count(), 0);
        // The store still records the located incident
        assert_eq!(s.store().marker_count(), 1);
    }

    #[test]
    fn test_status_before_anything() {
        assert_eq!(session().status_line(), "Rows: 0  •  Markers: 0");
    }

    #[test]
    fn test_malformed_counted() {
        let mut s = session();
        let err = crate::core::incident::decode_incident("{}").unwrap_err();
        s.record_malformed(&err);
        assert_eq!(s.counters().malformed, 1);
    }
}
