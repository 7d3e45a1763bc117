//! Platform-agnostic core module - shared between WASM dashboard and CLI

pub mod cluster;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod incident;
pub mod render;
pub mod session;
pub mod sse;
pub mod store;
pub mod stream;
pub mod timeline;
pub mod visual;

pub use config::ClientConfig;
pub use dashboard::DashboardView;
pub use error::{MalformedIncident, PulseError};
pub use incident::{decode_incident, decode_snapshot, Incident, IncidentId, LatLon};
pub use render::{GeoBounds, MarkerSpec, RenderSink, TableRow};
pub use session::{IngestOutcome, Session, SessionCounters};
pub use sse::{SseDecoder, SseEvent, SseFrame};
pub use store::IncidentStore;
pub use stream::{StreamState, StreamTracker, INCIDENT_EVENT};
pub use timeline::SeverityTimeline;
pub use visual::{marker_style, severity_color, MarkerStyle, SeverityColor};
