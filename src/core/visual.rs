//! Severity → marker radius/color encoding
//!
//! Thresholds are strict greater-than: 0.4 is still green, 0.7 still yellow.

/// Base marker radius in pixels at severity 0
pub const BASE_RADIUS: f64 = 4.0;
/// Extra radius added at severity 1
pub const RADIUS_SPAN: f64 = 8.0;
/// Fill opacity shared by every marker
pub const FILL_OPACITY: f32 = 0.8;

const YELLOW_ABOVE: f64 = 0.4;
const RED_ABOVE: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeverityColor {
    Green,
    Yellow,
    Red,
}

impl SeverityColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            SeverityColor::Green => [0x00, 0xcc, 0x44],
            SeverityColor::Yellow => [0xff, 0xcc, 0x00],
            SeverityColor::Red => [0xcc, 0x00, 0x00],
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            SeverityColor::Green => "#00cc44",
            SeverityColor::Yellow => "#ffcc00",
            SeverityColor::Red => "#cc0000",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub color: SeverityColor,
}

pub fn marker_radius(severity: f64) -> f64 {
    BASE_RADIUS + RADIUS_SPAN * severity
}

pub fn severity_color(severity: f64) -> SeverityColor {
    if severity > RED_ABOVE {
        SeverityColor::Red
    } else if severity > YELLOW_ABOVE {
        SeverityColor::Yellow
    } else {
        SeverityColor::Green
    }
}

pub fn marker_style(severity: f64) -> MarkerStyle {
    MarkerStyle {
        radius: marker_radius(severity),
        color: severity_color(severity),
    }
}

/// Severity as a whole percentage (0.456 → 46)
pub fn severity_percent(severity: f64) -> i64 {
    (severity * 100.0).round() as i64
}
