//! In-memory render sink backing the dashboard UI and the CLI summary

use std::collections::VecDeque;

use super::incident::IncidentId;
use super::render::{GeoBounds, MarkerSpec, RenderSink, TableRow};
use super::timeline::SeverityTimeline;

#[derive(Default)]
pub struct DashboardView {
    /// Newest at the front
    rows: VecDeque<TableRow>,
    markers: Vec<MarkerSpec>,
    /// Set by the one-shot fit, consumed by the map widget
    pending_viewport: Option<GeoBounds>,
    timeline: SeverityTimeline,
}

impl DashboardView {
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn markers(&self) -> &[MarkerSpec] {
        &self.markers
    }

    pub fn marker(&self, id: IncidentId) -> Option<&MarkerSpec> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Severity over time for every timestamped incident
    pub fn timeline(&self) -> &SeverityTimeline {
        &self.timeline
    }

    /// Hand the fitted viewport to the map widget exactly once
    pub fn take_viewport(&mut self) -> Option<GeoBounds> {
        self.pending_viewport.take()
    }
}

impl RenderSink for DashboardView {
    fn insert_row(&mut self, row: TableRow) {
        self.rows.push_front(row);
    }

    fn evict_oldest_row(&mut self) {
        self.rows.pop_back();
    }

    fn place_marker(&mut self, marker: MarkerSpec) {
        self.markers.push(marker);
    }

    fn fit_viewport(&mut self, bounds: GeoBounds) {
        self.pending_viewport = Some(bounds);
    }

    fn plot_severity(&mut self, occurred_ts: i64, id: IncidentId, severity: f64) {
        self.timeline.push(occurred_ts, id, severity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ClientConfig;
    use crate::core::incident::sample;
    use crate::core::session::Session;

    #[test]
    fn test_rows_newest_first_and_capped() {
        let config = ClientConfig { table_cap: 3, ..ClientConfig::default() };
        let mut session = Session::new(DashboardView::default(), &config);
        for id in 1..=5 {
            session.ingest(sample(id, 0.5, Some((id as f64, id as f64))));
        }
        let ids: Vec<u64> = session.sink().rows().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(session.sink().markers().len(), 5);
        assert!(session.sink().marker(IncidentId(1)).is_some());
    }

    #[test]
    fn test_timeline_outlives_table_eviction() {
        let config = ClientConfig { table_cap: 2, ..ClientConfig::default() };
        let mut session = Session::new(DashboardView::default(), &config);
        for id in 1..=4 {
            let mut inc = sample(id, id as f64 / 10.0, None);
            inc.occurred_ts = Some(1_700_000_000 + 60 * (5 - id as i64));
            session.ingest(inc);
        }
        let mut untimed = sample(5, 0.9, None);
        untimed.occurred_ts = None;
        session.ingest(untimed);

        let timeline = session.sink().timeline();
        assert_eq!(session.sink().row_count(), 2);
        assert_eq!(timeline.len(), 4);
        // Ordered by occurrence, not arrival
        let severities: Vec<f64> = timeline.points().map(|p| p[1]).collect();
        assert_eq!(severities, vec![0.4, 0.3, 0.2, 0.1]);
    }

    #[test]
    fn test_viewport_taken_once() {
        let mut session = Session::new(DashboardView::default(), &ClientConfig::default());
        session.load_snapshot(vec![sample(1, 0.5, Some((10.0, 10.0)))]);
        assert!(session.sink_mut().take_viewport().is_some());
        assert!(session.sink_mut().take_viewport().is_none());
    }
}
