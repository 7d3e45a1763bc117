//! Dark dashboard theme with the severity palette

use egui::Color32;

use crate::core::cluster::ClusterTier;
use crate::core::visual::{SeverityColor, FILL_OPACITY};
use crate::core::StreamState;

pub mod colors {
    use super::Color32;

    // Backgrounds
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(14, 16, 20);
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(24, 27, 33);
    pub const BG_HOVER: Color32 = Color32::from_rgb(36, 40, 48);

    // Text
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 236);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 156, 168);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(90, 96, 108);

    pub const BORDER: Color32 = Color32::from_rgb(44, 48, 56);

    // Connection state
    pub const STATE_GOOD: Color32 = Color32::from_rgb(100, 200, 100);
    pub const STATE_PENDING: Color32 = Color32::from_rgb(200, 200, 100);
    pub const STATE_BAD: Color32 = Color32::from_rgb(200, 100, 100);
}

/// Marker fill at the shared opacity
pub fn severity_fill(color: SeverityColor) -> Color32 {
    let [r, g, b] = color.rgb();
    Color32::from_rgba_unmultiplied(r, g, b, (FILL_OPACITY * 255.0) as u8)
}

/// Opaque variant for text (table severity column)
pub fn severity_text(color: SeverityColor) -> Color32 {
    let [r, g, b] = color.rgb();
    Color32::from_rgb(r, g, b)
}

/// Cluster badge radius (px) and fill, by size tier
pub fn cluster_badge(tier: ClusterTier) -> (f32, Color32) {
    match tier {
        ClusterTier::Small => (14.0, Color32::from_rgba_unmultiplied(110, 204, 57, 200)),
        ClusterTier::Medium => (18.0, Color32::from_rgba_unmultiplied(240, 194, 12, 200)),
        ClusterTier::Large => (22.0, Color32::from_rgba_unmultiplied(241, 128, 23, 200)),
    }
}

pub fn stream_state_color(state: &StreamState) -> Color32 {
    match state {
        StreamState::Open => colors::STATE_GOOD,
        StreamState::Connecting | StreamState::Reconnecting => colors::STATE_PENDING,
        StreamState::Closed | StreamState::Error(_) | StreamState::Failed(_) => colors::STATE_BAD,
    }
}

pub fn dashboard_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_ELEVATED;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.faint_bg_color = BG_ELEVATED;
    visuals.override_text_color = Some(TEXT_PRIMARY);

    for widget in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
    ] {
        widget.bg_fill = BG_PRIMARY;
        widget.weak_bg_fill = BG_PRIMARY;
        widget.bg_stroke = egui::Stroke::new(1.0, BORDER);
    }
    visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);

    visuals.widgets.hovered.bg_fill = BG_HOVER;
    visuals.widgets.hovered.weak_bg_fill = BG_HOVER;
    visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);

    visuals.selection.bg_fill = BG_HOVER;
    visuals.selection.stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.hyperlink_color = Color32::from_rgb(120, 170, 255);

    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;

    visuals
}
