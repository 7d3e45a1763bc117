//! Browser client for the incident API
//!
//! Snapshot via `fetch`; live incidents via the browser's EventSource, which
//! owns reconnection (same URL, `Last-Event-ID`, server `retry:`).

use crate::core::{decode_snapshot, ClientConfig, Incident, PulseError, StreamTracker, INCIDENT_EVENT};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{EventSource, MessageEvent, Response};

/// Shared payload buffer: EventSource callback pushes, app drains in update()
pub type MessageBuffer = Rc<RefCell<VecDeque<String>>>;

/// `EventSource.CLOSED`: the browser gave up reconnecting
const READY_STATE_CLOSED: u16 = 2;

fn js_transport(err: JsValue) -> PulseError {
    PulseError::Transport(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Fetch the newest-first snapshot. Not retried: failure aborts bootstrap.
pub async fn fetch_snapshot(config: &ClientConfig) -> Result<Vec<Incident>, PulseError> {
    let url = config.snapshot_url();
    info!(url = %url, "Fetching snapshot");

    let window = web_sys::window().ok_or_else(|| PulseError::Transport("no window".into()))?;
    let resp: Response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(js_transport)?
        .dyn_into()
        .map_err(js_transport)?;
    if !resp.ok() {
        return Err(PulseError::Transport(format!(
            "snapshot request returned HTTP {}",
            resp.status()
        )));
    }

    let body = JsFuture::from(resp.text().map_err(js_transport)?)
        .await
        .map_err(js_transport)?
        .as_string()
        .ok_or_else(|| PulseError::Transport("snapshot body is not text".into()))?;
    let incidents = decode_snapshot(&body)?;
    debug!(count = incidents.len(), "Snapshot decoded");
    Ok(incidents)
}

/// EventSource subscription. Callbacks are dropped together with the client.
pub struct EventSourceClient {
    source: EventSource,
    tracker: Rc<RefCell<StreamTracker>>,
    _on_open: Closure<dyn FnMut(web_sys::Event)>,
    _on_incident: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(web_sys::Event)>,
}

impl EventSourceClient {
    /// Open the stream; `incident` payloads are buffered into `msg_buffer`
    pub fn connect(
        url: &str,
        msg_buffer: MessageBuffer,
        tracker: Rc<RefCell<StreamTracker>>,
    ) -> Result<Self, JsValue> {
        info!(url, "Opening EventSource");
        let source = EventSource::new(url)?;

        let tracker_clone = tracker.clone();
        let on_open = Closure::wrap(Box::new(move |_: web_sys::Event| {
            tracker_clone.borrow_mut().on_open();
        }) as Box<dyn FnMut(web_sys::Event)>);
        source.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_incident = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Some(data) = e.data().as_string() {
                msg_buffer.borrow_mut().push_back(data);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        source.add_event_listener_with_callback(
            INCIDENT_EVENT,
            on_incident.as_ref().unchecked_ref(),
        )?;

        let tracker_clone = tracker.clone();
        let source_clone = source.clone();
        let on_error = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let mut tracker = tracker_clone.borrow_mut();
            if source_clone.ready_state() == READY_STATE_CLOSED {
                tracker.on_failed("EventSource closed by browser");
            } else {
                // Browser is already scheduling the reconnect
                tracker.on_error("connection lost");
                tracker.begin_reconnect();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Self {
            source,
            tracker,
            _on_open: on_open,
            _on_incident: on_incident,
            _on_error: on_error,
        })
    }

    pub fn close(&self) {
        self.source.close();
        self.tracker.borrow_mut().close();
    }
}

impl Drop for EventSourceClient {
    fn drop(&mut self) {
        self.source.set_onopen(None);
        self.source.set_onerror(None);
        self.close();
    }
}
