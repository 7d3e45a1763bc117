//! Newest-first incident table

use eframe::egui;
use crate::theme::{colors, severity_text};
use super::PulseApp;

const HEADERS: [&str; 7] = ["", "ID", "Source", "Title", "Mag", "Severity", "Occurred"];

impl PulseApp {
    pub(crate) fn render_table(&mut self, ui: &mut egui::Ui) {
        let session = self.session.borrow();
        let mut clicked = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("incident_rows")
                    .striped(true)
                    .num_columns(HEADERS.len())
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in HEADERS {
                            ui.label(egui::RichText::new(header).color(colors::TEXT_MUTED).strong());
                        }
                        ui.end_row();

                        for row in session.sink().rows() {
                            // Dot marks rows that carry coordinates
                            if session.store().has_marker(row.id) {
                                ui.label(egui::RichText::new("●").color(severity_text(row.color)));
                            } else {
                                ui.label("");
                            }
                            let is_selected = self.selected == Some(row.id);
                            if ui.selectable_label(is_selected, row.id.to_string()).clicked() {
                                clicked = Some(row.id);
                            }
                            ui.label(&row.source);
                            ui.label(egui::RichText::new(&row.title).color(colors::TEXT_SECONDARY));
                            ui.label(&row.magnitude);
                            ui.label(egui::RichText::new(&row.severity).color(severity_text(row.color)));
                            ui.label(egui::RichText::new(&row.occurred).color(colors::TEXT_MUTED));
                            ui.end_row();
                        }
                    });
            });

        drop(session);
        if clicked.is_some() {
            self.selected = clicked;
        }
    }
}
