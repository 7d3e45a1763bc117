//! Stream subscription state shared by the native and browser transports
//!
//! `Connecting → Open → {Closed, Error} → Reconnecting → Open …`, with
//! `Failed` as the terminal state when the transport gives up and `Closed`
//! becoming terminal once the client closes the subscription itself.

use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::error::MalformedIncident;
use super::incident::{decode_incident, Incident};
use super::sse::SseFrame;

/// SSE event name carrying incident payloads
pub const INCIDENT_EVENT: &str = "incident";

/// Push-stream connection state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Open,
    Closed,
    Error(String),
    Reconnecting,
    /// The transport will not retry (bad status or content type)
    Failed(String),
}

impl StreamState {
    pub fn is_open(&self) -> bool {
        matches!(self, StreamState::Open)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamState::Connecting => "Connecting...",
            StreamState::Open => "Live",
            StreamState::Closed => "Closed",
            StreamState::Error(_) => "Error",
            StreamState::Reconnecting => "Reconnecting...",
            StreamState::Failed(_) => "Failed",
        }
    }
}

/// Tracks one subscription across reconnects
pub struct StreamTracker {
    state: StreamState,
    retry: Duration,
    last_event_id: Option<String>,
    reconnects: u32,
    closed_by_client: bool,
}

impl StreamTracker {
    pub fn new(retry: Duration) -> Self {
        Self {
            state: StreamState::Connecting,
            retry,
            last_event_id: None,
            reconnects: 0,
            closed_by_client: false,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Delay before the next reconnection attempt
    pub fn retry_delay(&self) -> Duration {
        self.retry
    }

    /// Value for the `Last-Event-ID` request header on reconnect
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    /// Terminal: client closed or transport failed
    pub fn is_finished(&self) -> bool {
        self.closed_by_client || matches!(self.state, StreamState::Failed(_))
    }

    pub fn on_open(&mut self) {
        if self.is_finished() {
            return;
        }
        info!(reconnects = self.reconnects, "Stream open");
        self.state = StreamState::Open;
    }

    /// The server ended the response body
    pub fn on_closed(&mut self) {
        if self.is_finished() {
            return;
        }
        warn!("Stream closed by server");
        self.state = StreamState::Closed;
    }

    pub fn on_error(&mut self, error: impl Into<String>) {
        if self.is_finished() {
            return;
        }
        let error = error.into();
        warn!(error = %error, "Stream error");
        self.state = StreamState::Error(error);
    }

    /// The transport gave up; no further reconnects
    pub fn on_failed(&mut self, reason: impl Into<String>) {
        if self.closed_by_client {
            return;
        }
        let reason = reason.into();
        warn!(reason = %reason, "Stream failed permanently");
        self.state = StreamState::Failed(reason);
    }

    /// Enter `Reconnecting`, returning the delay to wait first.
    ///
    /// None once the subscription is finished.
    pub fn begin_reconnect(&mut self) -> Option<Duration> {
        if self.is_finished() {
            return None;
        }
        self.reconnects += 1;
        self.state = StreamState::Reconnecting;
        debug!(attempt = self.reconnects, delay_ms = self.retry.as_millis() as u64, "Reconnecting stream");
        Some(self.retry)
    }

    /// Explicit client-side close
    pub fn close(&mut self) {
        if !self.closed_by_client {
            info!("Stream closed by client");
        }
        self.closed_by_client = true;
        self.state = StreamState::Closed;
    }

    /// Apply a decoded SSE frame; incident events come back decoded
    pub fn on_frame(&mut self, frame: SseFrame) -> Option<Result<Incident, MalformedIncident>> {
        match frame {
            SseFrame::Retry(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "Server set reconnection delay");
                self.retry = delay;
                None
            }
            SseFrame::Event(event) => {
                // A bare `id` line clears it; no header is sent after that
                self.last_event_id =
                    Some(event.last_event_id).filter(|id| !id.is_empty());
                if event.event == INCIDENT_EVENT {
                    Some(decode_incident(&event.data))
                } else {
                    trace!(event = %event.event, "Ignoring non-incident stream event");
                    None
                }
            }
        }
    }
}
