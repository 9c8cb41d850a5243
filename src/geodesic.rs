//! Geodesic primitives on the WGS84 ellipsoid.
//!
//! All functions are pure: the engine is a zero-sized value that can be
//! copied freely and shared between threads. Points use the `geo`
//! convention of `x = longitude`, `y = latitude`, in degrees.

use geo::{Bearing, Distance, Geodesic, InterpolatePoint, Point};

use crate::{is_valid_coordinate, Positioned, RefineError, Result};

/// Result of an inverse geodesic problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inverse {
    /// Forward azimuth in degrees, `[0, 360)`, clockwise from north.
    pub azimuth: f64,
    /// Ellipsoidal distance in meters.
    pub distance: f64,
}

/// Distance, azimuth and interpolation on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicEngine;

impl GeodesicEngine {
    /// The engine configured for WGS84.
    pub const WGS84: Self = Self;

    /// Solve the inverse problem between two points.
    ///
    /// # Example
    /// ```
    /// use geo::Point;
    /// use tracerefine::GeodesicEngine;
    ///
    /// let inv = GeodesicEngine::WGS84
    ///     .inverse(Point::new(0.0, 0.0), Point::new(0.0, 1.0))
    ///     .unwrap();
    /// assert!(inv.azimuth.abs() < 1e-9);
    /// assert!((inv.distance - 110_574.0).abs() < 1.0);
    /// ```
    pub fn inverse(&self, from: Point<f64>, to: Point<f64>) -> Result<Inverse> {
        validate(from)?;
        validate(to)?;
        Ok(Inverse {
            azimuth: normalize_azimuth(Geodesic.bearing(from, to)),
            distance: Geodesic.distance(from, to),
        })
    }

    /// Ellipsoidal distance in meters.
    pub fn distance(&self, from: Point<f64>, to: Point<f64>) -> Result<f64> {
        validate(from)?;
        validate(to)?;
        Ok(Geodesic.distance(from, to))
    }

    /// Forward azimuth in degrees, `[0, 360)`.
    pub fn bearing(&self, from: Point<f64>, to: Point<f64>) -> Result<f64> {
        validate(from)?;
        validate(to)?;
        Ok(normalize_azimuth(Geodesic.bearing(from, to)))
    }

    /// Distance in meters between two positioned values.
    pub fn distance_between<P: Positioned>(&self, a: &P, b: &P) -> Result<f64> {
        self.distance(to_point(a), to_point(b))
    }

    /// `count` interior points evenly spaced along the geodesic.
    ///
    /// Endpoints are excluded; callers append them when needed.
    pub fn intermediate_points(
        &self,
        from: Point<f64>,
        to: Point<f64>,
        count: usize,
    ) -> Result<Vec<Point<f64>>> {
        validate(from)?;
        validate(to)?;
        let steps = (count + 1) as f64;
        Ok((1..=count)
            .map(|i| Geodesic.point_at_ratio_between(from, to, i as f64 / steps))
            .collect())
    }

    /// `count` points evenly spaced along the geodesic, both endpoints included.
    ///
    /// The endpoints are returned exactly as given. A `count` below two
    /// yields just the start point (or nothing for zero).
    pub fn points_between(
        &self,
        from: Point<f64>,
        to: Point<f64>,
        count: usize,
    ) -> Result<Vec<Point<f64>>> {
        match count {
            0 => {
                validate(from)?;
                validate(to)?;
                Ok(Vec::new())
            }
            1 => {
                validate(from)?;
                validate(to)?;
                Ok(vec![from])
            }
            _ => {
                let mut points = Vec::with_capacity(count);
                points.push(from);
                points.extend(self.intermediate_points(from, to, count - 2)?);
                points.push(to);
                Ok(points)
            }
        }
    }
}

/// Distance without domain checks, for callers that validated up front.
pub(crate) fn distance_unchecked(from: Point<f64>, to: Point<f64>) -> f64 {
    Geodesic.distance(from, to)
}

/// Convert a positioned value to a `geo` point.
pub(crate) fn to_point<P: Positioned>(p: &P) -> Point<f64> {
    Point::new(p.longitude(), p.latitude())
}

/// Reject points outside the WGS84 domain.
pub(crate) fn validate(p: Point<f64>) -> Result<()> {
    if is_valid_coordinate(p.y(), p.x()) {
        Ok(())
    } else {
        Err(RefineError::InvalidCoordinate {
            latitude: p.y(),
            longitude: p.x(),
        })
    }
}

fn normalize_azimuth(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}
