//! Diagnostics panel: stream health, counters, and ingest rate

use eframe::egui;
use std::collections::VecDeque;

use crate::theme::{colors, stream_state_color};
use crate::time::now_seconds;
use super::PulseApp;

/// Window over which the ingest rate is averaged (seconds)
const RATE_WINDOW_SECS: f64 = 10.0;

/// Format a count with human-readable suffix (1234 → "1234", 12345 → "12.3k")
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn format_rate(r: f64) -> String {
    if r >= 100.0 {
        format!("{:.0}", r)
    } else if r >= 1.0 {
        format!("{:.1}", r)
    } else {
        format!("{:.2}", r)
    }
}

/// Sliding-window rate of accepted incidents
#[derive(Default)]
pub(crate) struct RateCounter {
    stamps: VecDeque<f64>,
}

impl RateCounter {
    pub fn record(&mut self) {
        self.stamps.push_back(now_seconds());
    }

    /// Drop stamps that fell out of the window
    pub fn tick(&mut self) {
        let cutoff = now_seconds() - RATE_WINDOW_SECS;
        while self.stamps.front().is_some_and(|&t| t < cutoff) {
            self.stamps.pop_front();
        }
    }

    pub fn per_second(&self) -> f64 {
        self.stamps.len() as f64 / RATE_WINDOW_SECS
    }
}

impl PulseApp {
    pub(crate) fn draw_diagnostics(&self, ctx: &egui::Context) {
        let (state, reconnects, last_event_id) = {
            let tracker = self.tracker.borrow();
            (
                tracker.state().clone(),
                tracker.reconnects(),
                tracker.last_event_id().map(str::to_string),
            )
        };
        let (counters, cursor, distinct) = {
            let session = self.session.borrow();
            (session.counters(), session.cursor(), session.store().distinct_count())
        };

        let title = egui::RichText::new(format!("● {}", state.label()))
            .color(stream_state_color(&state));

        egui::Area::new(egui::Id::new("diagnostics_area"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-8.0, 36.0))
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 200))
                    .corner_radius(4.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.set_min_width(260.0);
                        egui::CollapsingHeader::new(title)
                            .default_open(true)
                            .show(ui, |ui| {
                                let muted = |text: String| egui::RichText::new(text).color(colors::TEXT_MUTED);

                                ui.label(
                                    egui::RichText::new(format!("{}/s incidents", format_rate(self.rates.per_second())))
                                        .color(colors::TEXT_SECONDARY),
                                );
                                ui.label(muted(format!("{} ingested", format_count(counters.ingested))));
                                ui.label(muted(format!("{} duplicates", format_count(counters.duplicates))));

                                let malformed_color = if counters.malformed > 0 {
                                    colors::STATE_BAD
                                } else {
                                    colors::TEXT_MUTED
                                };
                                ui.label(
                                    egui::RichText::new(format!("{} malformed", format_count(counters.malformed)))
                                        .color(malformed_color),
                                );

                                ui.label(muted(format!("{} distinct ids", format_count(distinct as u64))));
                                ui.label(muted(format!("cursor {}", cursor)));
                                if let Some(id) = last_event_id {
                                    ui.label(muted(format!("last event id {}", id)));
                                }
                                ui.label(muted(format!("{} reconnects", reconnects)));
                            });
                    });
            });
    }
}
