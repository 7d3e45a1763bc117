//! Incident dashboard app (browser)
//!
//! Incident table on the left, clustered severity map in the center, severity
//! timeline along the bottom, status line and stream state in the header.

mod diagnostics;
mod header;
mod map;
mod table;
mod timeline;

use eframe::egui;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{error, info};

use crate::client_wasm::{fetch_snapshot, EventSourceClient, MessageBuffer};
use crate::core::{
    decode_incident, ClientConfig, DashboardView, IncidentId, IngestOutcome, Session,
    StreamTracker,
};
use crate::theme::dashboard_visuals;

/// Page-provided API root (empty: same origin)
const API_URL_GLOBAL: &str = "__pulse_api";

/// Snapshot bootstrap progress
#[derive(Clone, Debug)]
pub(crate) enum BootState {
    Loading,
    Ready,
    Failed(String),
}

pub struct PulseApp {
    pub(crate) session: Rc<RefCell<Session<DashboardView>>>,
    pub(crate) tracker: Rc<RefCell<StreamTracker>>,
    pub(crate) boot: Rc<RefCell<BootState>>,
    /// Raw `incident` payloads buffered by the EventSource callback
    msg_buffer: MessageBuffer,
    /// EventSource client (kept alive), set once the snapshot is in
    #[allow(dead_code)]
    stream: Rc<RefCell<Option<EventSourceClient>>>,
    pub(crate) map_view: map::MapViewState,
    /// Incident whose popup is open
    pub(crate) selected: Option<IncidentId>,
    pub(crate) show_diagnostics: bool,
    pub(crate) rates: diagnostics::RateCounter,
}

impl PulseApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(dashboard_visuals());

        let config = match page_api_url() {
            Some(url) => ClientConfig::default().with_api_url(&url),
            None => ClientConfig::default().with_api_url(""),
        };
        info!(api = %config.api_url, "Dashboard starting");

        let session = Rc::new(RefCell::new(Session::new(DashboardView::default(), &config)));
        let tracker = Rc::new(RefCell::new(StreamTracker::new(config.reconnect_delay)));
        let boot = Rc::new(RefCell::new(BootState::Loading));
        let msg_buffer: MessageBuffer = Rc::new(RefCell::new(VecDeque::new()));
        let stream = Rc::new(RefCell::new(None));

        wasm_bindgen_futures::spawn_local(bootstrap(
            config,
            session.clone(),
            tracker.clone(),
            boot.clone(),
            msg_buffer.clone(),
            stream.clone(),
            cc.egui_ctx.clone(),
        ));

        Self {
            session,
            tracker,
            boot,
            msg_buffer,
            stream,
            map_view: map::MapViewState::default(),
            selected: None,
            show_diagnostics: false,
            rates: diagnostics::RateCounter::default(),
        }
    }

    /// Drain buffered stream payloads within a frame budget
    fn process_messages(&mut self) {
        const BUDGET_MS: f64 = 12.0;
        let deadline = js_sys::Date::now() + BUDGET_MS;

        let mut buf = self.msg_buffer.borrow_mut();
        let mut session = self.session.borrow_mut();
        while let Some(payload) = buf.pop_front() {
            match decode_incident(&payload) {
                Ok(incident) => {
                    if let IngestOutcome::Added { .. } = session.ingest(incident) {
                        self.rates.record();
                    }
                }
                Err(e) => session.record_malformed(&e),
            }
            if js_sys::Date::now() >= deadline {
                break;
            }
        }
    }
}

fn page_api_url() -> Option<String> {
    let window = web_sys::window()?;
    js_sys::Reflect::get(&window, &API_URL_GLOBAL.into())
        .ok()
        .and_then(|v| v.as_string())
}

/// Snapshot first; the stream opens only once the cursor is fixed
async fn bootstrap(
    config: ClientConfig,
    session: Rc<RefCell<Session<DashboardView>>>,
    tracker: Rc<RefCell<StreamTracker>>,
    boot: Rc<RefCell<BootState>>,
    msg_buffer: MessageBuffer,
    stream: Rc<RefCell<Option<EventSourceClient>>>,
    ctx: egui::Context,
) {
    match fetch_snapshot(&config).await {
        Ok(snapshot) => {
            let cursor = session.borrow_mut().load_snapshot(snapshot);
            let url = config.stream_url(cursor);
            match EventSourceClient::connect(&url, msg_buffer, tracker.clone()) {
                Ok(client) => {
                    *stream.borrow_mut() = Some(client);
                    *boot.borrow_mut() = BootState::Ready;
                }
                Err(e) => {
                    let reason = format!("{e:?}");
                    error!(reason = %reason, "Failed to open EventSource");
                    tracker.borrow_mut().on_failed(reason.clone());
                    *boot.borrow_mut() = BootState::Failed(reason);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Bootstrap failed");
            *boot.borrow_mut() = BootState::Failed(e.to_string());
        }
    }
    ctx.request_repaint();
}

impl eframe::App for PulseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Stream callbacks don't wake egui, so keep polling
        ctx.request_repaint_after(std::time::Duration::from_millis(250));

        self.process_messages();
        self.rates.tick();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.render_header(ui);
        });

        egui::SidePanel::left("incident_table")
            .resizable(true)
            .default_width(560.0)
            .show(ctx, |ui| {
                self.render_table(ui);
            });

        egui::TopBottomPanel::bottom("severity_timeline")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                self.render_timeline(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_map(ui);
        });

        self.draw_popup(ctx);
        if self.show_diagnostics {
            self.draw_diagnostics(ctx);
        }
    }
}
