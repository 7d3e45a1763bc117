//! Snapshot-then-stream flow through the public API, without a network

use std::time::Duration;

use incident_pulse::core::{
    decode_snapshot, ClientConfig, DashboardView, IncidentId, Session, SseDecoder,
    StreamState, StreamTracker,
};

fn incident_json(id: u64, severity: f64, position: Option<(f64, f64)>) -> String {
    match position {
        Some((lat, lon)) => format!(
            r#"{{"id":{id},"source":"usgs","title":"M4 quake {id}","magnitude":4.1,"severity":{severity},"occurred_ts":1700000000.5,"lat":{lat},"lon":{lon}}}"#
        ),
        None => format!(r#"{{"id":{id},"source":"gdacs","severity":{severity}}}"#),
    }
}

fn snapshot_json(ids_newest_first: &[u64]) -> String {
    let items: Vec<String> = ids_newest_first
        .iter()
        .map(|&id| incident_json(id, 0.5, Some((id as f64, -(id as f64)))))
        .collect();
    format!("[{}]", items.join(","))
}

/// Feed raw stream bytes through decoder and tracker into the session
fn feed_stream(
    bytes: &[u8],
    decoder: &mut SseDecoder,
    tracker: &mut StreamTracker,
    session: &mut Session<DashboardView>,
) {
    for frame in decoder.feed(bytes) {
        match tracker.on_frame(frame) {
            Some(Ok(incident)) => {
                session.ingest(incident);
            }
            Some(Err(e)) => session.record_malformed(&e),
            None => {}
        }
    }
}

#[test]
fn test_snapshot_replays_oldest_first_and_sets_cursor() {
    let config = ClientConfig::default();
    let mut session = Session::new(DashboardView::default(), &config);

    let snapshot = decode_snapshot(&snapshot_json(&[5, 3, 1])).unwrap();
    let cursor = session.load_snapshot(snapshot);

    assert_eq!(cursor, IncidentId(5));
    assert_eq!(config.stream_url(cursor), "http://127.0.0.1:8000/stream?last_id=5");

    // Top row is the newest
    let ids: Vec<u64> = session.sink().rows().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![5, 3, 1]);
    assert_eq!(session.status_line(), "Rows: 3  •  Markers: 3");

    let viewport = session.sink_mut().take_viewport().expect("viewport fitted");
    assert!(viewport.south < 1.0 && viewport.north > 5.0);
    assert!(viewport.west < -5.0 && viewport.east > -1.0);
}

#[test]
fn test_stream_event_after_snapshot_lands_on_top() {
    let mut session = Session::new(DashboardView::default(), &ClientConfig::default());
    session.load_snapshot(decode_snapshot(&snapshot_json(&[5, 3, 1])).unwrap());
    session.sink_mut().take_viewport();

    let mut decoder = SseDecoder::new();
    let mut tracker = StreamTracker::new(Duration::from_secs(3));
    tracker.on_open();

    let wire = format!(
        "retry: 1500\n\nid: 6\nevent: incident\ndata: {}\n\n",
        incident_json(6, 0.9, Some((35.0, 139.0)))
    );
    feed_stream(wire.as_bytes(), &mut decoder, &mut tracker, &mut session);

    assert_eq!(tracker.retry_delay(), Duration::from_millis(1500));
    assert_eq!(tracker.last_event_id(), Some("6"));
    assert_eq!(session.sink().rows().next().map(|r| r.id), Some(IncidentId(6)));
    assert_eq!(session.status_line(), "Rows: 4  •  Markers: 4");

    let marker = session.sink().marker(IncidentId(6)).expect("marker placed");
    assert_eq!(marker.style.color.hex(), "#cc0000");
    assert!(marker.popup.maps_link.ends_with("/maps?q=35,139"));

    // Streamed incidents never refit the view
    assert!(session.sink_mut().take_viewport().is_none());
}

#[test]
fn test_replayed_events_after_reconnect_are_absorbed() {
    let mut session = Session::new(DashboardView::default(), &ClientConfig::default());
    session.load_snapshot(decode_snapshot(&snapshot_json(&[2, 1])).unwrap());

    let mut decoder = SseDecoder::new();
    let mut tracker = StreamTracker::new(Duration::from_secs(3));
    tracker.on_open();
    let first = format!("id: 3\nevent: incident\ndata: {}\n\n", incident_json(3, 0.2, None));
    feed_stream(first.as_bytes(), &mut decoder, &mut tracker, &mut session);

    tracker.on_error("connection reset");
    assert!(tracker.begin_reconnect().is_some());
    tracker.on_open();

    // Server replays from the initial cursor
    let mut decoder = SseDecoder::new();
    let replay: String = [2, 3, 4]
        .iter()
        .map(|&id| format!("id: {id}\nevent: incident\ndata: {}\n\n", incident_json(id, 0.3, None)))
        .collect();
    feed_stream(replay.as_bytes(), &mut decoder, &mut tracker, &mut session);

    let ids: Vec<u64> = session.sink().rows().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
    assert_eq!(session.counters().duplicates, 2);
    assert_eq!(tracker.state(), &StreamState::Open);
    assert_eq!(tracker.reconnects(), 1);
}

#[test]
fn test_malformed_stream_message_is_skipped() {
    let mut session = Session::new(DashboardView::default(), &ClientConfig::default());
    session.load_snapshot(Vec::new());

    let mut decoder = SseDecoder::new();
    let mut tracker = StreamTracker::new(Duration::from_secs(3));
    let wire = format!(
        "event: incident\ndata: {{not json\n\n: keepalive\n\nevent: incident\ndata: {}\n\n",
        incident_json(7, 0.5, None)
    );
    feed_stream(wire.as_bytes(), &mut decoder, &mut tracker, &mut session);

    assert_eq!(session.counters().malformed, 1);
    assert_eq!(session.row_count(), 1);
    // No coordinates: table row only
    assert_eq!(session.marker_count(), 0);
}

#[test]
fn test_table_caps_at_300_while_markers_keep_growing() {
    let mut session = Session::new(DashboardView::default(), &ClientConfig::default());
    session.load_snapshot(Vec::new());

    let mut decoder = SseDecoder::new();
    let mut tracker = StreamTracker::new(Duration::from_secs(3));
    let wire: String = (1..=350u64)
        .map(|id| {
            let lat = (id % 80) as f64;
            format!("event: incident\ndata: {}\n\n", incident_json(id, 0.5, Some((lat, 10.0))))
        })
        .collect();

    // Split mid-event to exercise chunk reassembly
    let (head, tail) = wire.as_bytes().split_at(wire.len() / 2 + 3);
    feed_stream(head, &mut decoder, &mut tracker, &mut session);
    feed_stream(tail, &mut decoder, &mut tracker, &mut session);

    assert_eq!(session.row_count(), 300);
    assert_eq!(session.sink().row_count(), 300);
    assert_eq!(session.marker_count(), 350);
    assert_eq!(session.sink().rows().last().map(|r| r.id), Some(IncidentId(51)));
    assert_eq!(session.status_line(), "Rows: 300  •  Markers: 350");
}

#[test]
fn test_bad_snapshot_element_fails_whole_snapshot() {
    let payload = r#"[{"id":2,"severity":0.5},{"id":1}]"#;
    assert!(decode_snapshot(payload).is_err());
}
