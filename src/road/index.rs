//! R-tree over edge segments for nearest-edge queries.
//!
//! Distances are planar, in degrees (x = longitude, y = latitude), which is
//! the metric the in-memory adapter uses to pick a point's nearest edge.

use geo::{Coord, Line, LineString};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::EdgeId;

/// One straight piece of an edge geometry.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSegment {
    pub edge: EdgeId,
    pub line: Line<f64>,
}

impl RTreeObject for EdgeSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let (a, b) = (self.line.start, self.line.end);
        AABB::from_corners([a.x.min(b.x), a.y.min(b.y)], [a.x.max(b.x), a.y.max(b.y)])
    }
}

impl PointDistance for EdgeSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        segment_distance_2(&self.line, Coord { x: point[0], y: point[1] })
    }
}

/// Squared planar distance from `p` to the segment `line`.
pub fn segment_distance_2(line: &Line<f64>, p: Coord<f64>) -> f64 {
    let d = line.delta();
    let len_2 = d.x * d.x + d.y * d.y;
    let t = if len_2 == 0.0 {
        0.0
    } else {
        (((p.x - line.start.x) * d.x + (p.y - line.start.y) * d.y) / len_2).clamp(0.0, 1.0)
    };
    let dx = line.start.x + t * d.x - p.x;
    let dy = line.start.y + t * d.y - p.y;
    dx * dx + dy * dy
}

/// Spatial index of every segment of every edge.
#[derive(Debug)]
pub struct EdgeIndex {
    tree: RTree<EdgeSegment>,
}

impl EdgeIndex {
    /// Build the index from `(edge, geometry)` pairs.
    pub fn build<'a>(geometries: impl IntoIterator<Item = (EdgeId, &'a LineString<f64>)>) -> Self {
        let segments: Vec<EdgeSegment> = geometries
            .into_iter()
            .flat_map(|(edge, geom)| geom.lines().map(move |line| EdgeSegment { edge, line }))
            .collect();
        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    /// Edge whose geometry passes closest to `(longitude, latitude)`.
    pub fn nearest(&self, longitude: f64, latitude: f64) -> Option<EdgeId> {
        self.tree
            .nearest_neighbor(&[longitude, latitude])
            .map(|segment| segment.edge)
    }

    /// Number of indexed segments.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
