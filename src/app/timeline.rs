//! Severity over time chart

use eframe::egui;
use crate::core::visual::severity_color;
use crate::theme::{colors, severity_fill};
use crate::time::format_local;
use super::PulseApp;

impl PulseApp {
    pub(crate) fn render_timeline(&self, ui: &mut egui::Ui) {
        use egui_plot::{Line, Plot, PlotPoints, Points};

        ui.label(
            egui::RichText::new("Severity Over Time")
                .color(colors::TEXT_MUTED)
                .size(14.0),
        );

        let (points, range) = {
            let session = self.session.borrow();
            let timeline = session.sink().timeline();
            (timeline.points().collect::<Vec<[f64; 2]>>(), timeline.time_range())
        };

        let (x_min, x_max) = match range {
            Some((first, last)) if last > first => (first as f64, last as f64),
            Some((at, _)) => (at as f64 - 60.0, at as f64 + 60.0),
            None => (0.0, 1.0),
        };

        Plot::new("severity_timeline")
            .show_axes([false, true])
            .show_grid(false)
            .allow_scroll(false)
            .show_background(false)
            .include_x(x_min)
            .include_x(x_max)
            .include_y(0.0)
            .include_y(1.0)
            .label_formatter(|_name, value| {
                format!("{}  sev={:.0}%", format_local(value.x as i64), value.y * 100.0)
            })
            .show(ui, |plot_ui| {
                if points.len() >= 2 {
                    let line = egui::Color32::from_rgba_unmultiplied(255, 255, 255, 90);
                    plot_ui.line(Line::new(PlotPoints::from(points.clone())).color(line).width(1.0));
                }

                // Dots share the marker palette
                for color in [
                    crate::core::SeverityColor::Green,
                    crate::core::SeverityColor::Yellow,
                    crate::core::SeverityColor::Red,
                ] {
                    let dots: Vec<[f64; 2]> = points
                        .iter()
                        .copied()
                        .filter(|p| severity_color(p[1]) == color)
                        .collect();
                    if dots.is_empty() {
                        continue;
                    }
                    plot_ui.points(
                        Points::new(PlotPoints::from(dots))
                            .color(severity_fill(color))
                            .radius(2.5)
                            .filled(true),
                    );
                }
            });
    }
}
