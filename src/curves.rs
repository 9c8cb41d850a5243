//! Bearing-based curve detection and densification.
//!
//! For every point except the last, the forward geodesic bearing to the
//! next point is computed. The bearing change at point `i` is the absolute
//! difference `|bearing(i) - bearing(i-1)|`, with no wrap-around at north.
//! Points whose change exceeds the threshold are curve points, and the
//! segment leaving each curve point is densified with evenly spaced
//! geodesic points.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::geodesic::GeodesicEngine;
use crate::trajectory::{dedup_coordinates, lerp_time};
use crate::{RefineError, Result, TrajectoryPoint};

/// Configuration for curve detection and densification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Bearing change (degrees) above which a point counts as a curve.
    /// Default: 0.5
    pub threshold: f64,

    /// Number of points generated per densified segment, endpoints included.
    /// Must be at least 2. Default: 5
    pub granularity: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            granularity: 5,
        }
    }
}

impl CurveConfig {
    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RefineError::InvalidConfig(format!(
                "curve threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.granularity < 2 {
            return Err(RefineError::InvalidConfig(format!(
                "curve granularity must be at least 2, got {}",
                self.granularity
            )));
        }
        Ok(())
    }
}

/// Forward bearing from each point to its successor.
///
/// The result has `len - 1` entries (none for fewer than two points).
pub fn forward_bearings(points: &[TrajectoryPoint]) -> Result<Vec<f64>> {
    let engine = GeodesicEngine::WGS84;
    points
        .windows(2)
        .map(|w| engine.bearing(w[0].to_geo(), w[1].to_geo()))
        .collect()
}

/// Bearing change magnitude for every point.
///
/// Entry `i` is `|bearing(i) - bearing(i-1)|`. The first point and the
/// last point (which has no forward bearing) are `None`.
pub fn bearing_changes(points: &[TrajectoryPoint]) -> Result<Vec<Option<f64>>> {
    let bearings = forward_bearings(points)?;
    let mut changes = vec![None; points.len()];
    for i in 1..bearings.len() {
        changes[i] = Some((bearings[i] - bearings[i - 1]).abs());
    }
    Ok(changes)
}

/// Indices of points whose bearing change exceeds `threshold` degrees.
///
/// Every returned index has a successor, since the last point never has a
/// defined bearing change.
pub fn detect_curve_points(points: &[TrajectoryPoint], threshold: f64) -> Result<Vec<usize>> {
    Ok(bearing_changes(points)?
        .into_iter()
        .enumerate()
        .filter_map(|(i, change)| match change {
            Some(c) if c > threshold => Some(i),
            _ => None,
        })
        .collect())
}

/// Densify the path around detected curve points.
///
/// For each curve point `i`, `granularity` points are generated along the
/// geodesic from `i` to `i + 1` (both included) and paired with timestamps
/// spaced uniformly by index between the two original times. All generated
/// points form the output; repeated coordinates keep their first
/// occurrence.
///
/// The output replaces the input rather than extending it. When no curve
/// is found the input is returned unchanged; use
/// [`merge_by_time`](crate::merge_by_time) to fold the result back into
/// the original trajectory.
///
/// # Errors
/// [`RefineError::InvalidConfig`] for an out-of-range config and
/// [`RefineError::InvalidCoordinate`] for points outside WGS84.
pub fn densify_curves(
    points: &[TrajectoryPoint],
    config: &CurveConfig,
) -> Result<Vec<TrajectoryPoint>> {
    config.validate()?;

    let curve_points = detect_curve_points(points, config.threshold)?;
    if curve_points.is_empty() {
        debug!("[Curves] No bearing change above {}°", config.threshold);
        return Ok(points.to_vec());
    }

    let engine = GeodesicEngine::WGS84;
    let steps = (config.granularity - 1) as f64;
    let mut generated = Vec::with_capacity(curve_points.len() * config.granularity);

    for &i in &curve_points {
        let (start, end) = (&points[i], &points[i + 1]);
        let coords = engine.points_between(start.to_geo(), end.to_geo(), config.granularity)?;

        for (k, coord) in coords.into_iter().enumerate() {
            let time = lerp_time(start.time, end.time, k as f64 / steps);
            generated.push(TrajectoryPoint::new(coord.y(), coord.x(), time));
        }
    }

    if generated.is_empty() {
        return Ok(points.to_vec());
    }

    let densified = dedup_coordinates(&generated);
    info!(
        "[Curves] {} curve points -> {} densified points ({} before dedup)",
        curve_points.len(),
        densified.len(),
        generated.len()
    );
    Ok(densified)
}
