//! Road-network refinement of a map-matched trajectory.
//!
//! ## Algorithm
//!
//! 1. Derive the bounding box of the trajectory and fetch the road graph
//! 2. Resolve every point to the way of its nearest edge
//! 3. Interpolate corner points wherever consecutive ways differ
//! 4. Merge with the input, sort by time, drop repeated coordinates
//! 5. Optionally drop points farther than `tolerance` from any road

use log::info;
use serde::{Deserialize, Serialize};

use crate::corners::{CornerInterpolator, DegenerateSegmentPolicy};
use crate::offroad::OffRoadFilter;
use crate::road::geometry::EdgeGeometryResolver;
use crate::road::RoadGraphAdapter;
use crate::trajectory::merge_by_time;
use crate::{BoundingBox, RefineError, Result, TrajectoryPoint};

/// Configuration for trajectory refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Drop points that are not within `tolerance` of their nearest road.
    /// Default: false
    pub delete_off_road_points: bool,

    /// Off-road tolerance in coordinate units (degrees).
    /// Default: 0.0001 (~11 meters)
    pub tolerance: f64,

    /// Handling of corner times for pairs whose points coincide.
    /// Default: skip
    pub degenerate_segment: DegenerateSegmentPolicy,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            delete_off_road_points: false,
            tolerance: 0.0001,
            degenerate_segment: DegenerateSegmentPolicy::Skip,
        }
    }
}

impl RefineConfig {
    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(RefineError::InvalidConfig(format!(
                "off-road tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Snaps a map-matched trajectory onto the road network.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryRefiner {
    config: RefineConfig,
}

impl TrajectoryRefiner {
    pub fn new(config: RefineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// Refine `matched` against the road graph supplied by `adapter`.
    ///
    /// The result is ordered by time, free of repeated coordinates, and
    /// contains every input point (unless off-road removal is enabled)
    /// plus the synthesised corner points.
    ///
    /// # Errors
    /// Adapter failures propagate unchanged; invalid configuration and
    /// coordinates are reported before any work is done.
    pub fn refine<A: RoadGraphAdapter + ?Sized>(
        &self,
        adapter: &A,
        matched: &[TrajectoryPoint],
    ) -> Result<Vec<TrajectoryPoint>> {
        self.config.validate()?;
        if let Some(bad) = matched.iter().find(|p| !p.is_valid()) {
            return Err(RefineError::InvalidCoordinate {
                latitude: bad.latitude,
                longitude: bad.longitude,
            });
        }

        let Some(bbox) = BoundingBox::from_points(matched) else {
            return Ok(Vec::new());
        };
        let graph = adapter.graph_for_bbox(&bbox)?;

        let mut resolver = EdgeGeometryResolver::new(&graph, adapter, matched)?;
        let interpolator = CornerInterpolator::new(self.config.degenerate_segment);
        let cornered = interpolator.interpolate(matched, &mut resolver)?;

        let assembled = merge_by_time(matched, &cornered);
        info!(
            "[Refiner] {} matched points -> {} after corner interpolation",
            matched.len(),
            assembled.len()
        );

        if !self.config.delete_off_road_points {
            return Ok(assembled);
        }

        let filter = OffRoadFilter::new(&graph, self.config.tolerance)?;
        filter.filter(adapter, &graph, &assembled)
    }
}
