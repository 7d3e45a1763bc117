//! Incident store - cursor, bounded display log and marker set
//!
//! Single place where duplicate suppression and ordering are enforced.
//! Renderers downstream trust every insertion they are handed.

use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::trace;

use super::incident::{Incident, IncidentId, LatLon};

/// Display log capacity (newest-first)
pub const DISPLAY_LOG_CAP: usize = 300;

/// Receipt for an accepted insertion
#[derive(Debug)]
pub struct Ingested<'a> {
    pub incident: &'a Incident,
    /// Whether the incident entered the marker set
    pub marked: bool,
}

pub struct IncidentStore {
    /// Highest id seen (0 before anything arrives)
    cursor: IncidentId,
    /// Newest at the front
    display_log: VecDeque<Incident>,
    display_cap: usize,
    /// Unbounded: markers are never evicted
    marker_set: BTreeMap<IncidentId, LatLon>,
    /// Every id ever accepted, so duplicates stay suppressed after table eviction
    seen: HashSet<IncidentId>,
}

impl IncidentStore {
    pub fn new(display_cap: usize) -> Self {
        let display_cap = display_cap.max(1);
        Self {
            cursor: IncidentId::default(),
            display_log: VecDeque::with_capacity(display_cap.min(1024)),
            display_cap,
            marker_set: BTreeMap::new(),
            seen: HashSet::new(),
        }
    }

    /// Accept an incident unless its id was already ingested.
    ///
    /// Returns None for duplicates, which leave every piece of state untouched.
    pub fn ingest(&mut self, incident: Incident) -> Option<Ingested<'_>> {
        if !self.seen.insert(incident.id) {
            trace!(id = incident.id.0, "Duplicate incident absorbed");
            return None;
        }

        self.cursor = self.cursor.max(incident.id);

        let marked = match incident.position {
            Some(pos) => {
                self.marker_set.insert(incident.id, pos);
                true
            }
            None => false,
        };

        self.display_log.push_front(incident);
        self.display_log.truncate(self.display_cap);

        trace!(
            cursor = self.cursor.0,
            log_len = self.display_log.len(),
            markers = self.marker_set.len(),
            "Incident ingested"
        );

        self.display_log.front().map(|incident| Ingested { incident, marked })
    }

    /// Resume point for the push stream
    pub fn snapshot_cursor(&self) -> IncidentId {
        self.cursor
    }

    /// Newest-first view of the retained incidents
    pub fn display_log(&self) -> impl Iterator<Item = &Incident> {
        self.display_log.iter()
    }

    pub fn display_len(&self) -> usize {
        self.display_log.len()
    }

    pub fn marker_count(&self) -> usize {
        self.marker_set.len()
    }

    pub fn has_marker(&self, id: IncidentId) -> bool {
        self.marker_set.contains_key(&id)
    }

    /// Number of distinct ids accepted over the session
    pub fn distinct_count(&self) -> usize {
        self.seen.len()
    }
}

impl Default for IncidentStore {
    fn default() -> Self {
        Self::new(DISPLAY_LOG_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::incident::sample;

    #[test]
    fn test_cursor_tracks_max() {
        let mut store = IncidentStore::default();
        assert_eq!(store.snapshot_cursor(), IncidentId(0));
        store.ingest(sample(3, 0.1, None));
        store.ingest(sample(9, 0.1, None));
        store.ingest(sample(5, 0.1, None));
        assert_eq!(store.snapshot_cursor(), IncidentId(9));
    }

    #[test]
    fn test_duplicate_is_noop() {
        let mut store = IncidentStore::default();
        assert!(store.ingest(sample(4, 0.5, Some((1.0, 2.0)))).is_some());
        let before = (store.display_len(), store.marker_count(), store.snapshot_cursor());

        assert!(store.ingest(sample(4, 0.5, Some((1.0, 2.0)))).is_none());
        assert!(store.ingest(sample(4, 0.9, None)).is_none());

        assert_eq!(before, (store.display_len(), store.marker_count(), store.snapshot_cursor()));
    }

    #[test]
    fn test_one_marker_per_located_id() {
        let mut store = IncidentStore::default();
        for _ in 0..3 {
            store.ingest(sample(1, 0.5, Some((10.0, 20.0))));
            store.ingest(sample(2, 0.5, None));
        }
        assert_eq!(store.marker_count(), 1);
        assert!(store.has_marker(IncidentId(1)));
        assert!(!store.has_marker(IncidentId(2)));
    }

    #[test]
    fn test_display_log_capped_newest_first() {
        let mut store = IncidentStore::new(3);
        for id in 1..=5 {
            store.ingest(sample(id, 0.2, Some((0.0, 0.0))));
        }
        let ids: Vec<u64> = store.display_log().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        // Markers outlive table eviction
        assert_eq!(store.marker_count(), 5);
    }

    #[test]
    fn test_evicted_ids_stay_suppressed() {
        let mut store = IncidentStore::new(2);
        for id in 1..=4 {
            store.ingest(sample(id, 0.2, None));
        }
        assert!(store.ingest(sample(1, 0.2, None)).is_none());
        assert_eq!(store.distinct_count(), 4);
    }

    #[test]
    fn test_log_len_is_min_of_distinct_and_cap() {
        let mut store = IncidentStore::default();
        for id in 1..=350u64 {
            store.ingest(sample(id, 0.2, None));
            store.ingest(sample(id / 2, 0.2, None));
            assert_eq!(store.display_len(), store.distinct_count().min(DISPLAY_LOG_CAP));
        }
        assert_eq!(store.display_len(), DISPLAY_LOG_CAP);
    }

    #[test]
    fn test_receipt_reports_marker() {
        let mut store = IncidentStore::default();
        let receipt = store.ingest(sample(11, 0.2, Some((5.0, 5.0)))).unwrap();
        assert!(receipt.marked);
        assert_eq!(receipt.incident.id, IncidentId(11));
        let receipt = store.ingest(sample(12, 0.2, None)).unwrap();
        assert!(!receipt.marked);
    }
}
