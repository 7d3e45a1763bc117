//! Severity-over-time series for the timeline chart
//!
//! Points are kept ordered by `occurred_ts` (ties broken by id), so late or
//! out-of-order arrivals land in the right place on the chart.

use std::collections::BTreeMap;
use tracing::trace;

use super::incident::IncidentId;

/// Points retained for the chart; the earliest are dropped first
pub const TIMELINE_CAP: usize = 2000;

pub struct SeverityTimeline {
    points: BTreeMap<(i64, IncidentId), f64>,
    cap: usize,
}

impl SeverityTimeline {
    pub fn new(cap: usize) -> Self {
        Self {
            points: BTreeMap::new(),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, occurred_ts: i64, id: IncidentId, severity: f64) {
        self.points.insert((occurred_ts, id), severity);
        while self.points.len() > self.cap {
            if let Some(((ts, evicted), _)) = self.points.pop_first() {
                trace!(id = evicted.0, ts, "Timeline point evicted");
            }
        }
    }

    /// `[unix_seconds, severity]` pairs in time order
    pub fn points(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.points
            .iter()
            .map(|(&(ts, _), &severity)| [ts as f64, severity])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest and latest timestamps on the chart
    pub fn time_range(&self) -> Option<(i64, i64)> {
        let (&(first, _), _) = self.points.first_key_value()?;
        let (&(last, _), _) = self.points.last_key_value()?;
        Some((first, last))
    }
}

impl Default for SeverityTimeline {
    fn default() -> Self {
        Self::new(TIMELINE_CAP)
    }
}
