//! Header bar with status line and stream state

use eframe::egui;
use crate::theme::{colors, stream_state_color};
use super::{BootState, PulseApp};

impl PulseApp {
    pub(crate) fn render_header(&mut self, ui: &mut egui::Ui) {
        let status = self.session.borrow().status_line().to_string();
        let state = self.tracker.borrow().state().clone();
        let boot = self.boot.borrow().clone();

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Incident Pulse").strong());
            ui.add_space(12.0);
            ui.label(egui::RichText::new(status).color(colors::TEXT_SECONDARY));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let diag_text = if self.show_diagnostics { "Diagnostics <<<" } else { "Diagnostics >>>" };
                if ui.button(diag_text).clicked() {
                    self.show_diagnostics = !self.show_diagnostics;
                }

                ui.add_space(10.0);

                match &boot {
                    BootState::Loading => {
                        ui.colored_label(colors::STATE_PENDING, "Loading snapshot...");
                    }
                    BootState::Failed(reason) => {
                        ui.colored_label(colors::STATE_BAD, "Snapshot failed")
                            .on_hover_text(reason.as_str());
                    }
                    BootState::Ready => {
                        let label = ui.colored_label(stream_state_color(&state), state.label());
                        if let crate::core::StreamState::Error(e) | crate::core::StreamState::Failed(e) = &state {
                            label.on_hover_text(e.as_str());
                        }
                    }
                }
            });
        });
    }
}
