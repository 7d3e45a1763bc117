//! Native client against a scripted HTTP server on localhost

#![cfg(feature = "cli")]

use std::collections::VecDeque;
use std::time::Duration;

use incident_pulse::client_native::{fetch_snapshot, StreamSubscriber};
use incident_pulse::core::{ClientConfig, DashboardView, IncidentId, PulseError, Session, StreamState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

const SNAPSHOT: &str = r#"[
    {"id":5,"source":"usgs","title":"M5.1","magnitude":5.1,"severity":0.8,"occurred_ts":1700000300,"lat":38.2,"lon":142.4},
    {"id":3,"source":"gdacs","severity":0.3},
    {"id":1,"source":"usgs","severity":0.5,"lat":-6.1,"lon":105.4}
]"#;

const WAIT: Duration = Duration::from_secs(5);

fn event_stream(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n{body}"
    )
}

fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

const NO_CONTENT: &str = "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n";

async fn read_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).to_lowercase()
}

/// Answers the snapshot endpoint with `snapshot`, and each stream
/// connection with the next scripted response. Every request head is
/// reported on `seen`.
async fn serve(
    listener: TcpListener,
    snapshot: String,
    mut stream_script: VecDeque<String>,
    seen: mpsc::UnboundedSender<String>,
) {
    while let Ok((mut socket, _)) = listener.accept().await {
        let head = read_head(&mut socket).await;
        let response = if head.starts_with("get /api/incidents") {
            snapshot.clone()
        } else {
            stream_script.pop_front().unwrap_or_else(|| NO_CONTENT.to_string())
        };
        let _ = seen.send(head);
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }
}

async fn start(snapshot: String, script: Vec<String>) -> (ClientConfig, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    tokio::spawn(serve(listener, snapshot, script.into(), seen_tx));
    let config = ClientConfig::default().with_api_url(&format!("http://{addr}"));
    (config, seen_rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut heads = Vec::new();
    while let Ok(head) = rx.try_recv() {
        heads.push(head);
    }
    heads
}

#[tokio::test]
async fn test_snapshot_then_stream_with_resume() {
    let first_stream = event_stream(
        "retry: 10\n\n\
         : connected\n\n\
         id: 6\nevent: incident\ndata: {\"id\":6,\"source\":\"usgs\",\"severity\":0.95,\"lat\":35.6,\"lon\":139.7}\n\n",
    );
    let (config, mut seen) = start(json_response("200 OK", SNAPSHOT), vec![first_stream]).await;
    let http = reqwest::Client::new();

    let snapshot = fetch_snapshot(&http, &config).await.unwrap();
    let mut session = Session::new(DashboardView::default(), &config);
    let cursor = session.load_snapshot(snapshot);
    assert_eq!(cursor, IncidentId(5));
    assert_eq!(session.status_line(), "Rows: 3  •  Markers: 2");

    let mut subscriber = StreamSubscriber::open(http, config.stream_url(cursor), config.reconnect_delay);

    let incident = timeout(WAIT, subscriber.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(incident.id, IncidentId(6));
    session.ingest(incident);
    assert_eq!(session.sink().rows().next().map(|r| r.id), Some(IncidentId(6)));

    // Body ends, the client reconnects after the server-set 10ms and the
    // scripted 204 ends the subscription
    let end = timeout(WAIT, subscriber.recv()).await.unwrap();
    assert!(end.is_none());
    assert!(matches!(subscriber.state(), StreamState::Failed(_)));
    assert_eq!(subscriber.reconnects(), 1);

    let heads = drain(&mut seen);
    assert_eq!(heads.len(), 3);
    assert!(heads[0].starts_with("get /api/incidents?limit=200 "));
    assert!(heads[1].starts_with("get /stream?last_id=5 "));
    assert!(heads[1].contains("accept: text/event-stream"));
    assert!(!heads[1].contains("last-event-id"));
    // Same URL on reconnect, position carried by the header
    assert!(heads[2].starts_with("get /stream?last_id=5 "));
    assert!(heads[2].contains("last-event-id: 6"));
}

#[tokio::test]
async fn test_wrong_content_type_is_fatal() {
    let html = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html></html>".to_string();
    let (config, mut seen) = start(json_response("200 OK", "[]"), vec![html]).await;

    let mut subscriber = StreamSubscriber::open(
        reqwest::Client::new(),
        config.stream_url(IncidentId(0)),
        Duration::from_millis(10),
    );
    let end = timeout(WAIT, subscriber.recv()).await.unwrap();
    assert!(end.is_none());
    assert!(matches!(subscriber.state(), StreamState::Failed(_)));
    assert_eq!(subscriber.reconnects(), 0);
    assert_eq!(drain(&mut seen).len(), 1);
}

#[tokio::test]
async fn test_malformed_stream_payload_is_reported() {
    let stream = event_stream(
        "event: incident\ndata: {\"id\":\"seven\"}\n\n\
         event: incident\ndata: {\"id\":8,\"severity\":0.1}\n\n",
    );
    let (config, _seen) = start(json_response("200 OK", "[]"), vec![stream]).await;

    let mut subscriber = StreamSubscriber::open(
        reqwest::Client::new(),
        config.stream_url(IncidentId(0)),
        Duration::from_millis(10),
    );
    let first = timeout(WAIT, subscriber.recv()).await.unwrap().unwrap();
    assert!(first.is_err());
    let second = timeout(WAIT, subscriber.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(second.id, IncidentId(8));
    subscriber.close();
}

#[tokio::test]
async fn test_snapshot_http_error() {
    let (config, _seen) = start(json_response("500 Internal Server Error", "{}"), Vec::new()).await;
    let err = fetch_snapshot(&reqwest::Client::new(), &config).await.unwrap_err();
    assert!(matches!(err, PulseError::Transport(_)));
}

#[tokio::test]
async fn test_snapshot_malformed_body() {
    let (config, _seen) = start(json_response("200 OK", r#"[{"id":1}]"#), Vec::new()).await;
    let err = fetch_snapshot(&reqwest::Client::new(), &config).await.unwrap_err();
    assert!(matches!(err, PulseError::Malformed(_)));
}
