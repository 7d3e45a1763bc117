//! Clustered severity map and marker popup

use eframe::egui;
use egui_plot::{Plot, PlotBounds, PlotPoint, PlotPoints, Points, Text};
use std::collections::HashMap;

use super::PulseApp;
use crate::core::cluster::{cluster_markers, radius_in_degrees, Cluster};
use crate::core::config::{CLUSTER_RADIUS_PX, VIEWPORT_PADDING};
use crate::core::render::GeoBounds;
use crate::core::visual::SeverityColor;
use crate::theme::{cluster_badge, colors, severity_fill};

/// Smallest view span (degrees), so a lone marker isn't zoomed to a point
const MIN_VIEW_SPAN_DEG: f64 = 2.0;

/// Initial view before any fit
const WORLD: GeoBounds = GeoBounds {
    south: -60.0,
    west: -180.0,
    north: 75.0,
    east: 180.0,
};

/// View requests the plot hasn't applied yet
pub(crate) struct MapViewState {
    pending: Option<GeoBounds>,
}

impl Default for MapViewState {
    fn default() -> Self {
        Self { pending: Some(WORLD) }
    }
}

/// What a click on the map resolved to
enum MapClick {
    Marker(usize),
    Cluster(GeoBounds),
}

impl PulseApp {
    pub(crate) fn render_map(&mut self, ui: &mut egui::Ui) {
        if let Some(fit) = self.session.borrow_mut().sink_mut().take_viewport() {
            self.map_view.pending = Some(fit.with_min_span(MIN_VIEW_SPAN_DEG));
        }
        let pending = self.map_view.pending.take();

        let session = self.session.borrow();
        let markers = session.sink().markers();

        let response = Plot::new("incident_map")
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_grid(false)
            .show_background(false)
            .label_formatter(|_name, value| format!("{:.3}, {:.3}", value.y, value.x))
            .show(ui, |plot_ui| {
                if let Some(b) = pending {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [b.west, b.south],
                        [b.east, b.north],
                    ));
                }

                let view = plot_ui.plot_bounds();
                let width_px = plot_ui.response().rect.width() as f64;
                let radius = radius_in_degrees(CLUSTER_RADIUS_PX, view.width(), width_px);
                let clusters = cluster_markers(markers, radius);

                // One Points item per (color, radius) instead of one per marker
                let mut singles: HashMap<(SeverityColor, u32), Vec<[f64; 2]>> = HashMap::new();
                for cluster in clusters.iter().filter(|c| c.is_single()) {
                    let marker = &markers[cluster.members[0]];
                    let key = (marker.style.color, marker.style.radius.round() as u32);
                    singles
                        .entry(key)
                        .or_default()
                        .push([marker.position.lon, marker.position.lat]);
                }
                for ((color, radius), points) in singles {
                    plot_ui.points(
                        Points::new(PlotPoints::from(points))
                            .color(severity_fill(color))
                            .radius(radius as f32)
                            .filled(true),
                    );
                }

                for cluster in clusters.iter().filter(|c| !c.is_single()) {
                    let (badge_radius, fill) = cluster_badge(cluster.tier());
                    let at = [cluster.center.lon, cluster.center.lat];
                    plot_ui.points(
                        Points::new(PlotPoints::from(vec![at]))
                            .color(fill)
                            .radius(badge_radius)
                            .filled(true),
                    );
                    plot_ui.text(Text::new(
                        PlotPoint::new(at[0], at[1]),
                        egui::RichText::new(cluster.count().to_string())
                            .color(colors::BG_PRIMARY)
                            .strong(),
                    ));
                }

                if !plot_ui.response().clicked() {
                    return None;
                }
                let pointer = plot_ui.pointer_coordinate()?;
                resolve_click(&clusters, markers, [pointer.x, pointer.y], radius)
            });

        let click = response.inner;
        let selected = match click {
            Some(MapClick::Marker(index)) => markers.get(index).map(|m| m.id),
            _ => None,
        };
        drop(session);

        match click {
            Some(MapClick::Marker(_)) => self.selected = selected,
            Some(MapClick::Cluster(bounds)) => {
                self.map_view.pending = Some(bounds.pad(VIEWPORT_PADDING).with_min_span(MIN_VIEW_SPAN_DEG / 4.0));
            }
            None => {}
        }
    }

    pub(crate) fn draw_popup(&mut self, ctx: &egui::Context) {
        let Some(id) = self.selected else {
            return;
        };
        let popup = self.session.borrow().sink().marker(id).map(|m| m.popup.clone());
        let Some(popup) = popup else {
            // Row without a usable position
            self.selected = None;
            return;
        };

        let mut open = true;
        egui::Window::new(format!("Incident {id}"))
            .id(egui::Id::new("incident_popup"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(&popup.source).strong());
                if !popup.title.is_empty() {
                    ui.label(&popup.title);
                }
                ui.label(format!("mag: {}", popup.magnitude));
                ui.label(format!("sev: {}%", popup.severity_pct));
                if let Some(location) = &popup.location_text {
                    ui.label(egui::RichText::new(location).color(colors::TEXT_SECONDARY));
                }
                ui.hyperlink_to("Open in Maps", &popup.maps_link);
            });
        if !open {
            self.selected = None;
        }
    }
}

/// Nearest cluster within the click radius; singles select, groups zoom in
fn resolve_click(
    clusters: &[Cluster],
    markers: &[crate::core::MarkerSpec],
    at: [f64; 2],
    radius: f64,
) -> Option<MapClick> {
    let hit_radius_sq = (radius / 2.0).powi(2);
    let nearest = clusters
        .iter()
        .map(|c| {
            let dx = c.center.lon - at[0];
            let dy = c.center.lat - at[1];
            (c, dx * dx + dy * dy)
        })
        .filter(|(_, d)| *d <= hit_radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)?;

    if nearest.is_single() {
        return Some(MapClick::Marker(nearest.members[0]));
    }
    let mut members = nearest.members.iter().filter_map(|&i| markers.get(i));
    let first = members.next()?;
    let mut bounds = GeoBounds::from_point(first.position);
    for marker in members {
        bounds.extend(marker.position);
    }
    Some(MapClick::Cluster(bounds))
}
