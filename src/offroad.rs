//! Removal of points that do not lie on a road.
//!
//! Each point is checked against the geometry of its nearest edge only.
//! Edge geometries are gathered once for the whole graph and looked up by
//! edge identity, avoiding a scan over every edge per point.

use std::collections::HashMap;

use geo::{Closest, ClosestPoint, LineString, Point};
use log::{info, warn};

use crate::road::{EdgeId, RoadGraph, RoadGraphAdapter};
use crate::{RefineError, Result, TrajectoryPoint};

/// Drops points farther than `tolerance` (degrees, planar) from their
/// nearest road edge.
#[derive(Debug, Clone)]
pub struct OffRoadFilter {
    tolerance: f64,
    geometries: HashMap<EdgeId, LineString<f64>>,
}

impl OffRoadFilter {
    /// Precompute the edge geometry table for `graph`.
    ///
    /// # Errors
    /// [`RefineError::InvalidConfig`] for a negative or non-finite tolerance.
    pub fn new(graph: &RoadGraph, tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(RefineError::InvalidConfig(format!(
                "off-road tolerance must be a non-negative number, got {tolerance}"
            )));
        }
        Ok(Self {
            tolerance,
            geometries: graph.edge_geometries(),
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Planar distance from `point` to the geometry of `edge`.
    ///
    /// `None` when the edge is not in the precomputed table.
    pub fn distance_to_edge(&self, point: &TrajectoryPoint, edge: &EdgeId) -> Option<f64> {
        let geometry = self.geometries.get(edge)?;
        let p = point.to_geo();
        match geometry.closest_point(&p) {
            Closest::Intersection(_) => Some(0.0),
            Closest::SinglePoint(c) => Some(planar_distance(p, c)),
            Closest::Indeterminate => None,
        }
    }

    /// Whether `point` lies within tolerance of `edge`.
    ///
    /// Unknown edges count as off-road.
    pub fn is_on_road(&self, point: &TrajectoryPoint, edge: &EdgeId) -> bool {
        match self.distance_to_edge(point, edge) {
            Some(distance) => distance <= self.tolerance,
            None => {
                warn!("[OffRoad] Nearest edge {edge:?} has no geometry; dropping point");
                false
            }
        }
    }

    /// Keep only the points on a road, preserving order.
    pub fn filter<A: RoadGraphAdapter + ?Sized>(
        &self,
        adapter: &A,
        graph: &RoadGraph,
        points: &[TrajectoryPoint],
    ) -> Result<Vec<TrajectoryPoint>> {
        let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.longitude, p.latitude)).collect();
        let edges = adapter.nearest_edges(graph, &coords)?;
        let mask = self.on_road_mask(points, &edges);

        let kept: Vec<TrajectoryPoint> = points
            .iter()
            .zip(mask)
            .filter_map(|(p, on_road)| on_road.then_some(*p))
            .collect();

        info!(
            "[OffRoad] Kept {} of {} points (tolerance {})",
            kept.len(),
            points.len(),
            self.tolerance
        );
        Ok(kept)
    }

    #[cfg(not(feature = "parallel"))]
    fn on_road_mask(&self, points: &[TrajectoryPoint], edges: &[EdgeId]) -> Vec<bool> {
        points
            .iter()
            .zip(edges)
            .map(|(p, e)| self.is_on_road(p, e))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn on_road_mask(&self, points: &[TrajectoryPoint], edges: &[EdgeId]) -> Vec<bool> {
        use rayon::prelude::*;

        points
            .par_iter()
            .zip(edges.par_iter())
            .map(|(p, e)| self.is_on_road(p, e))
            .collect()
    }
}

fn planar_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}
