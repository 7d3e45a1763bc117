//! Error taxonomy for the ingestion pipeline
//!
//! Duplicate deliveries are not errors: the store absorbs them silently.

use thiserror::Error;

/// A payload that failed JSON decoding or required-field validation
#[derive(Debug, Error)]
pub enum MalformedIncident {
    #[error("invalid incident JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("severity {0} is not a finite number")]
    NonFiniteSeverity(f64),
}

/// Failures surfaced by the snapshot loader and the stream transports
#[derive(Debug, Error)]
pub enum PulseError {
    /// Snapshot fetch or stream channel could not be established/maintained
    #[error("transport failure: {0}")]
    Transport(String),
    #[error(transparent)]
    Malformed(#[from] MalformedIncident),
}

impl PulseError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        PulseError::Transport(err.to_string())
    }
}
