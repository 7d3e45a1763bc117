//! Native client for the incident API
//!
//! Snapshot fetch over reqwest, and a server-sent-events subscriber running
//! as a tokio task with channel-based message passing.

use crate::core::{
    decode_snapshot, ClientConfig, Incident, MalformedIncident, PulseError, SseDecoder,
    StreamState, StreamTracker,
};
use futures_util::StreamExt;
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

/// One decoded `incident` event, or the reason it could not be decoded
pub type StreamItem = Result<Incident, MalformedIncident>;

/// Fetch the newest-first snapshot. Not retried: failure aborts bootstrap.
pub async fn fetch_snapshot(
    http: &reqwest::Client,
    config: &ClientConfig,
) -> Result<Vec<Incident>, PulseError> {
    let url = config.snapshot_url();
    info!(url = %url, "Fetching snapshot");

    let resp = http
        .get(&url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(PulseError::transport)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(PulseError::Transport(format!("snapshot request returned HTTP {status}")));
    }

    let body = resp.text().await.map_err(PulseError::transport)?;
    let incidents = decode_snapshot(&body)?;
    debug!(count = incidents.len(), bytes = body.len(), "Snapshot decoded");
    Ok(incidents)
}

/// Live incident subscription.
///
/// Reconnects like a browser EventSource: same URL, `Last-Event-ID` header,
/// server-adjustable delay. Incidents arrive through [`StreamSubscriber::recv`].
pub struct StreamSubscriber {
    rx: mpsc::UnboundedReceiver<StreamItem>,
    tracker: Arc<Mutex<StreamTracker>>,
    task: JoinHandle<()>,
}

impl StreamSubscriber {
    /// Spawn the transport task. Must be called within a tokio runtime.
    pub fn open(http: reqwest::Client, url: String, reconnect_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = Arc::new(Mutex::new(StreamTracker::new(reconnect_delay)));
        let task = tokio::spawn(run_stream(http, url, tx, tracker.clone()));
        Self { rx, tracker, task }
    }

    /// Next incident; None once the subscription has finished for good
    pub async fn recv(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }

    pub fn state(&self) -> StreamState {
        self.tracker.lock().state().clone()
    }

    pub fn reconnects(&self) -> u32 {
        self.tracker.lock().reconnects()
    }

    /// Stop the transport; buffered incidents can still be drained
    pub fn close(&mut self) {
        self.tracker.lock().close();
        self.task.abort();
        self.rx.close();
    }
}

impl Drop for StreamSubscriber {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_stream(
    http: reqwest::Client,
    url: String,
    tx: mpsc::UnboundedSender<StreamItem>,
    tracker: Arc<Mutex<StreamTracker>>,
) {
    loop {
        let last_event_id = tracker.lock().last_event_id().map(str::to_owned);
        info!(url = %url, last_event_id = ?last_event_id, "Connecting to stream");

        let mut request = http
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = &last_event_id {
            request = request.header("Last-Event-ID", id.as_str());
        }

        match request.send().await {
            Ok(resp) => {
                if let Err(reason) = check_response(&resp) {
                    error!(reason = %reason, "Stream rejected");
                    tracker.lock().on_failed(reason);
                    return;
                }
                tracker.lock().on_open();
                if !pump(resp, &tx, &tracker).await {
                    return;
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to connect");
                tracker.lock().on_error(e.to_string());
            }
        }

        if tx.is_closed() {
            return;
        }
        let delay = tracker.lock().begin_reconnect();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => return,
        }
    }
}

/// EventSource semantics: anything but 200 + text/event-stream is fatal
fn check_response(resp: &reqwest::Response) -> Result<(), String> {
    if resp.status() != StatusCode::OK {
        return Err(format!("HTTP {}", resp.status()));
    }
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("text/event-stream") {
        return Err(format!("unexpected content type {content_type:?}"));
    }
    Ok(())
}

/// Forward decoded incidents until the body ends.
///
/// Returns false when the consumer is gone and the task should exit.
async fn pump(
    resp: reqwest::Response,
    tx: &mpsc::UnboundedSender<StreamItem>,
    tracker: &Mutex<StreamTracker>,
) -> bool {
    let resume_id = tracker.lock().last_event_id().unwrap_or_default().to_owned();
    let mut decoder = SseDecoder::resume(&resume_id);
    let mut body = resp.bytes_stream();

    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                tracker.lock().on_error(e.to_string());
                return true;
            }
        };
        trace!(len = bytes.len(), "Stream chunk");

        for frame in decoder.feed(&bytes) {
            let item = tracker.lock().on_frame(frame);
            if let Some(item) = item {
                if tx.send(item).is_err() {
                    debug!("Stream consumer dropped");
                    return false;
                }
            }
        }
    }

    debug!(last_event_id = decoder.last_event_id(), "Stream body ended");
    tracker.lock().on_closed();
    true
}
