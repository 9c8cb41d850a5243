//! Corner interpolation at road transitions.
//!
//! When two consecutive map-matched points sit on different ways, the
//! transition between the two road geometries is synthesised as one or
//! more corner points. Geometry work is planar in degrees; corner
//! timestamps are interpolated by geodesic distance from the first point
//! of the pair.

use chrono::NaiveDateTime;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Closest, ClosestPoint, Coord, LineString, Point};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geodesic::GeodesicEngine;
use crate::road::geometry::{EdgeGeometryResolver, WayGeometry};
use crate::trajectory::lerp_time;
use crate::{RefineError, Result, TrajectoryPoint};

/// What to do with corner points of a pair whose two points coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateSegmentPolicy {
    /// Emit no corner points; the pair passes through unchanged.
    #[default]
    Skip,
    /// Stamp corner points with the first point's time.
    EarlierTime,
    /// Stamp corner points with the second point's time.
    LaterTime,
}

/// Intersection of two road lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Crossing {
    Empty,
    Point(Coord<f64>),
    /// Distinct crossing points in segment scan order of the first line.
    MultiPoint(Vec<Coord<f64>>),
    /// The lines overlap along a stretch; no corner can be placed.
    Other,
}

/// Intersect two lines.
pub fn intersect_lines(a: &LineString<f64>, b: &LineString<f64>) -> Crossing {
    let mut points: Vec<Coord<f64>> = Vec::new();
    let mut push_unique = |c: Coord<f64>| {
        if !points.contains(&c) {
            points.push(c);
        }
    };
    let mut overlaps = false;

    for sa in a.lines() {
        for sb in b.lines() {
            match line_intersection(sa, sb) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    push_unique(intersection)
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    if intersection.start == intersection.end {
                        push_unique(intersection.start);
                    } else {
                        overlaps = true;
                    }
                }
                None => {}
            }
        }
    }

    if overlaps {
        return Crossing::Other;
    }
    match points.len() {
        0 => Crossing::Empty,
        1 => Crossing::Point(points[0]),
        _ => Crossing::MultiPoint(points),
    }
}

/// Closest pair of points between two lines, `(on a, on b)`.
///
/// Exact for lines that do not cross: the minimum distance between two
/// polylines is always attained at a vertex of one of them.
pub fn nearest_points(
    a: &LineString<f64>,
    b: &LineString<f64>,
) -> Option<(Coord<f64>, Coord<f64>)> {
    let mut best: Option<(f64, Coord<f64>, Coord<f64>)> = None;
    let mut consider = |d: f64, pa: Coord<f64>, pb: Coord<f64>| {
        if best.map_or(true, |(bd, _, _)| d < bd) {
            best = Some((d, pa, pb));
        }
    };

    for &va in &a.0 {
        if let Some(pb) = closest_on(b, va) {
            consider(planar_distance(va, pb), va, pb);
        }
    }
    for &vb in &b.0 {
        if let Some(pa) = closest_on(a, vb) {
            consider(planar_distance(pa, vb), pa, vb);
        }
    }

    best.map(|(_, pa, pb)| (pa, pb))
}

/// Planar distance between two lines; zero when they touch.
pub fn line_distance(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    if !matches!(intersect_lines(a, b), Crossing::Empty) {
        return 0.0;
    }
    nearest_points(a, b).map_or(f64::INFINITY, |(pa, pb)| planar_distance(pa, pb))
}

/// Reduce `geometry` to the component closest to `other`.
///
/// A single line is returned as is. For a multi-line, the first component
/// reaching the minimum distance wins, and a touching component ends the
/// search early.
pub fn nearest_component<'a>(
    geometry: &'a WayGeometry,
    other: &WayGeometry,
) -> Option<&'a LineString<f64>> {
    let components = geometry.components();
    if !geometry.is_multi() {
        return components.first();
    }

    let mut min_distance = f64::INFINITY;
    let mut nearest = None;
    for line in components {
        let distance = other
            .components()
            .iter()
            .map(|o| line_distance(line, o))
            .fold(f64::INFINITY, f64::min);
        if distance < min_distance {
            min_distance = distance;
            nearest = Some(line);
            if distance == 0.0 {
                break;
            }
        }
    }
    nearest
}

/// Corner points for the transition between two way geometries.
///
/// - no crossing: midpoint of the closest pair of points
/// - one crossing: that point
/// - several crossings: all of them
/// - overlapping lines: nothing
pub fn corner_points(from: &WayGeometry, to: &WayGeometry) -> Vec<Coord<f64>> {
    let (Some(line1), Some(line2)) = (nearest_component(from, to), nearest_component(to, from))
    else {
        return Vec::new();
    };

    match intersect_lines(line1, line2) {
        Crossing::Empty => nearest_points(line1, line2)
            .map(|(a, b)| {
                vec![Coord {
                    x: (a.x + b.x) / 2.0,
                    y: (a.y + b.y) / 2.0,
                }]
            })
            .unwrap_or_default(),
        Crossing::Point(p) => vec![p],
        Crossing::MultiPoint(points) => points,
        Crossing::Other => Vec::new(),
    }
}

/// Timestamp of a corner point between `from` and `to`.
///
/// The ratio of the geodesic distance `from -> corner` to `from -> to` is
/// clamped to `[0, 1]`, so the corner always sorts between the pair.
///
/// # Errors
/// [`RefineError::DegenerateSegment`] when `from` and `to` coincide, tagged
/// with `index` (the position of `from`).
pub fn interpolate_corner_time(
    index: usize,
    from: &TrajectoryPoint,
    to: &TrajectoryPoint,
    corner: Point<f64>,
) -> Result<NaiveDateTime> {
    let engine = GeodesicEngine::WGS84;
    let total = engine.distance(from.to_geo(), to.to_geo())?;
    if total == 0.0 {
        return Err(RefineError::DegenerateSegment { index });
    }
    let partial = engine.distance(from.to_geo(), corner)?;
    let ratio = (partial / total).clamp(0.0, 1.0);
    Ok(lerp_time(from.time, to.time, ratio))
}

/// Walks a map-matched trajectory and emits corner points at way changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CornerInterpolator {
    pub policy: DegenerateSegmentPolicy,
}

impl CornerInterpolator {
    pub fn new(policy: DegenerateSegmentPolicy) -> Self {
        Self { policy }
    }

    /// Corner points (with timestamps) for the pair starting at `index`.
    ///
    /// Empty when `index` is the last point, when both points share a way,
    /// when a geometry is missing, or when the lines overlap.
    pub fn corners_for_pair(
        &self,
        points: &[TrajectoryPoint],
        index: usize,
        resolver: &mut EdgeGeometryResolver<'_>,
    ) -> Result<Vec<TrajectoryPoint>> {
        let (Some(p), Some(p_next)) = (points.get(index), points.get(index + 1)) else {
            return Ok(Vec::new());
        };
        if resolver.way(index) == resolver.way(index + 1) {
            return Ok(Vec::new());
        }

        let from = resolver.geometry_at(index).cloned();
        let to = resolver.geometry_at(index + 1).cloned();
        let (Some(from), Some(to)) = (from, to) else {
            return Ok(Vec::new());
        };

        let mut corners = Vec::new();
        for coord in corner_points(&from, &to) {
            let corner = Point::from(coord);
            let time = match interpolate_corner_time(index, p, p_next, corner) {
                Ok(time) => time,
                Err(RefineError::DegenerateSegment { index }) => match self.policy {
                    DegenerateSegmentPolicy::Skip => {
                        debug!("[Corners] Zero-length pair at {index}; skipping corners");
                        return Ok(Vec::new());
                    }
                    DegenerateSegmentPolicy::EarlierTime => p.time,
                    DegenerateSegmentPolicy::LaterTime => p_next.time,
                },
                Err(e) => return Err(e),
            };
            corners.push(TrajectoryPoint::new(coord.y, coord.x, time));
        }
        Ok(corners)
    }

    /// Refined point sequence for a whole trajectory.
    ///
    /// Pairs on the same way, and pairs that yield no corner, pass through
    /// unchanged; other pairs contribute only their corner points. The last
    /// point is always appended. Points are never reordered.
    pub fn interpolate(
        &self,
        points: &[TrajectoryPoint],
        resolver: &mut EdgeGeometryResolver<'_>,
    ) -> Result<Vec<TrajectoryPoint>> {
        let Some(last) = points.last() else {
            return Ok(Vec::new());
        };

        let mut refined = Vec::with_capacity(points.len() * 2);
        let mut corner_count = 0;

        for i in 0..points.len() - 1 {
            let corners = self.corners_for_pair(points, i, resolver)?;
            if corners.is_empty() {
                refined.push(points[i]);
                refined.push(points[i + 1]);
            } else {
                corner_count += corners.len();
                refined.extend(corners);
            }
        }
        refined.push(*last);

        debug!(
            "[Corners] {} corner points over {} pairs ({} ways cached)",
            corner_count,
            points.len() - 1,
            resolver.cached_ways()
        );
        Ok(refined)
    }
}

fn closest_on(line: &LineString<f64>, c: Coord<f64>) -> Option<Coord<f64>> {
    match line.closest_point(&Point::from(c)) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p.0),
        Closest::Indeterminate => None,
    }
}

fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
