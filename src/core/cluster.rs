//! Greedy grid clustering of map markers
//!
//! Markers closer than the cluster radius (given in map units for the current
//! zoom) collapse into one cluster. Each marker only checks the 3x3 grid cells
//! around it, so a pass is linear in the marker count.

use std::collections::HashMap;

use super::incident::LatLon;
use super::render::MarkerSpec;

/// Badge size tier, by member count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterTier {
    Small,
    Medium,
    Large,
}

impl ClusterTier {
    pub fn for_count(count: usize) -> Self {
        if count < 10 {
            ClusterTier::Small
        } else if count < 100 {
            ClusterTier::Medium
        } else {
            ClusterTier::Large
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cluster {
    /// Running centroid of the member positions
    pub center: LatLon,
    /// Indices into the marker slice that was clustered
    pub members: Vec<usize>,
    pub max_severity: f64,
}

impl Cluster {
    fn new(index: usize, marker: &MarkerSpec) -> Self {
        Self {
            center: marker.position,
            members: vec![index],
            max_severity: marker.severity,
        }
    }

    fn absorb(&mut self, index: usize, marker: &MarkerSpec) {
        let n = self.members.len() as f64;
        self.center = LatLon::new(
            (self.center.lat * n + marker.position.lat) / (n + 1.0),
            (self.center.lon * n + marker.position.lon) / (n + 1.0),
        );
        self.members.push(index);
        self.max_severity = self.max_severity.max(marker.severity);
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    pub fn tier(&self) -> ClusterTier {
        ClusterTier::for_count(self.members.len())
    }
}

/// Convert a pixel radius into map units for a view `span_degrees` wide
/// drawn across `width_px` pixels
pub fn radius_in_degrees(radius_px: f64, span_degrees: f64, width_px: f64) -> f64 {
    if width_px <= 0.0 {
        return 0.0;
    }
    radius_px * span_degrees / width_px
}

/// Cluster markers; a non-positive radius leaves every marker on its own
pub fn cluster_markers(markers: &[MarkerSpec], radius: f64) -> Vec<Cluster> {
    if radius.is_nan() || radius <= 0.0 {
        return markers
            .iter()
            .enumerate()
            .map(|(i, m)| Cluster::new(i, m))
            .collect();
    }

    let cell_of = |p: LatLon| ((p.lon / radius).floor() as i64, (p.lat / radius).floor() as i64);
    let mut clusters: Vec<Cluster> = Vec::new();
    // Grid cell of each cluster's centroid → cluster indices
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut cells: Vec<(i64, i64)> = Vec::new();
    let radius_sq = radius * radius;

    for (index, marker) in markers.iter().enumerate() {
        let (cx, cy) = cell_of(marker.position);

        let mut nearest: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &ci in candidates {
                    let c = clusters[ci].center;
                    let d_lat = c.lat - marker.position.lat;
                    let d_lon = c.lon - marker.position.lon;
                    let dist_sq = d_lat * d_lat + d_lon * d_lon;
                    if dist_sq <= radius_sq && nearest.map_or(true, |(_, best)| dist_sq < best) {
                        nearest = Some((ci, dist_sq));
                    }
                }
            }
        }

        match nearest {
            Some((ci, _)) => {
                clusters[ci].absorb(index, marker);
                // Keep the cluster filed under the cell its centroid is in now
                let moved_to = cell_of(clusters[ci].center);
                if moved_to != cells[ci] {
                    if let Some(bucket) = grid.get_mut(&cells[ci]) {
                        bucket.retain(|&other| other != ci);
                    }
                    grid.entry(moved_to).or_default().push(ci);
                    cells[ci] = moved_to;
                }
            }
            None => {
                grid.entry((cx, cy)).or_default().push(clusters.len());
                cells.push((cx, cy));
                clusters.push(Cluster::new(index, marker));
            }
        }
    }

    clusters
}
