//! # Trace Refine
//!
//! Batch post-processing for noisy GPS trajectories.
//!
//! This library provides:
//! - WGS84 geodesic distance, bearing and interpolation primitives
//! - Greedy nearest-neighbour sequencing of several partial traces into one
//! - Bearing-based curve detection and densification
//! - Road-network corner interpolation for map-matched trajectories
//! - Optional removal of points that fall off every road
//!
//! ## Features
//!
//! - **`parallel`** - Data-parallel nearest-edge lookups with rayon
//! - **`synthetic`** - Synthetic road grids and traces for benchmarks
//! - **`cli`** - The `tracerefine-cli` debug tool (enabled by default)
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tracerefine::{CurveConfig, TrajectoryPoint, densify_curves, sequence_trajectories};
//!
//! let t0 = NaiveDate::from_ymd_opt(2024, 3, 1)
//!     .unwrap()
//!     .and_hms_opt(8, 0, 0)
//!     .unwrap();
//! let secs = |s| t0 + chrono::TimeDelta::seconds(s);
//!
//! let first = vec![
//!     TrajectoryPoint::new(51.5000, -0.1200, secs(0)),
//!     TrajectoryPoint::new(51.5010, -0.1200, secs(10)),
//! ];
//! let second = vec![TrajectoryPoint::new(51.5010, -0.1185, secs(20))];
//!
//! let merged = sequence_trajectories(&[first, second]).unwrap();
//! assert_eq!(merged.len(), 3);
//!
//! let dense = densify_curves(&merged, &CurveConfig::default()).unwrap();
//! assert!(!dense.is_empty());
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, RefineError, Result};

// WGS84 geodesic primitives
pub mod geodesic;
pub use geodesic::{GeodesicEngine, Inverse};

// Shared trajectory helpers (coordinate keys, dedup, merging)
pub mod trajectory;
pub use trajectory::{dedup_coordinates, merge_by_time, CoordKey};

// Greedy nearest-neighbour sequencing
pub mod sequencer;
pub use sequencer::{sequence_order, sequence_trajectories};

// Curve detection and densification
pub mod curves;
pub use curves::{
    bearing_changes, densify_curves, detect_curve_points, forward_bearings, CurveConfig,
};

// Road network model and adapter boundary
pub mod road;
pub use road::{
    geometry::{EdgeGeometryResolver, WayGeometry},
    EdgeId, InMemoryRoadNetwork, Node, RoadEdge, RoadGraph, RoadGraphAdapter, WayId,
};

// Corner interpolation at way transitions
pub mod corners;
pub use corners::{interpolate_corner_time, CornerInterpolator, Crossing, DegenerateSegmentPolicy};

// Off-road point removal
pub mod offroad;
pub use offroad::OffRoadFilter;

// Refinement orchestration
pub mod refine;
pub use refine::{RefineConfig, TrajectoryRefiner};

// Tabular input/output
pub mod io;
pub use io::{Table, TableConfig};

// Aggregate configuration
pub mod config;
pub use config::PipelineConfig;

// Synthetic data for benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A single GPS observation.
///
/// Equality for deduplication is by `(latitude, longitude)` only, see
/// [`TrajectoryPoint::key`]. The derived `PartialEq` compares all fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub time: NaiveDateTime,
}

impl TrajectoryPoint {
    /// Create a new trajectory point.
    pub fn new(latitude: f64, longitude: f64, time: NaiveDateTime) -> Self {
        Self {
            latitude,
            longitude,
            time,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Coordinate key used for deduplication and caching.
    pub fn key(&self) -> CoordKey {
        CoordKey::new(self.latitude, self.longitude)
    }

    /// The point as a planar `geo` point (x = longitude, y = latitude).
    pub fn to_geo(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// Anything carrying a latitude and longitude.
///
/// The sequencer works on any row type implementing this, so metadata
/// columns travel with their coordinates.
pub trait Positioned {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

impl Positioned for TrajectoryPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Check a latitude/longitude pair against the WGS84 domain.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Create a bounding box from its four edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Smallest box containing every point.
    ///
    /// Returns `None` for an empty input.
    pub fn from_points<P: Positioned>(points: &[P]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut north = f64::MIN;
        let mut south = f64::MAX;
        let mut east = f64::MIN;
        let mut west = f64::MAX;

        for p in points {
            north = north.max(p.latitude());
            south = south.min(p.latitude());
            east = east.max(p.longitude());
            west = west.min(p.longitude());
        }

        Some(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Check whether a planar rectangle (lon/lat) overlaps this box.
    pub fn intersects_rect(&self, rect: &geo::Rect<f64>) -> bool {
        let min = rect.min();
        let max = rect.max();
        min.x <= self.east && max.x >= self.west && min.y <= self.north && max.y >= self.south
    }

    /// Check whether a coordinate lies inside the box (edges inclusive).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude)
            && (self.west..=self.east).contains(&longitude)
    }
}
