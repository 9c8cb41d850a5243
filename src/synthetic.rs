//! Synthetic road grids and drives for benchmarking and stress testing.
//!
//! Generates a Manhattan-style street grid (one way identifier per street)
//! and a noisy, timestamped drive that zig-zags through it, so every
//! block produces a way transition for the refiner to work on.
//!
//! Feature-gated behind `synthetic`; not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use tracerefine::synthetic::GridScenario;
//!
//! let scenario = GridScenario {
//!     blocks: 4,
//!     ..GridScenario::default()
//! };
//! let run = scenario.generate().unwrap();
//! assert!(!run.trace.is_empty());
//! assert_eq!(run.partials.len(), scenario.partial_count);
//! ```

use std::f64::consts::PI;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::road::{InMemoryRoadNetwork, Node, RoadEdge, RoadGraph, WayId};
use crate::{Result, TrajectoryPoint};

// ============================================================================
// Coordinate Helpers
// ============================================================================

/// Meters per degree of latitude (approximately constant).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Convert meters to degrees of latitude.
fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

/// Convert meters to degrees of longitude at a given latitude.
fn meters_to_deg_lng(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lng
}

/// First way identifier used for east-west streets.
pub const EAST_WEST_WAY_BASE: i64 = 1_000;
/// First way identifier used for north-south streets.
pub const NORTH_SOUTH_WAY_BASE: i64 = 2_000;

// ============================================================================
// Types
// ============================================================================

/// Scenario configuration for a synthetic grid drive.
#[derive(Debug, Clone)]
pub struct GridScenario {
    /// South-west corner of the grid `(latitude, longitude)`.
    pub origin: (f64, f64),
    /// Number of blocks along each axis.
    pub blocks: usize,
    /// Side length of one block in meters.
    pub block_meters: f64,
    /// Distance between consecutive GPS fixes in meters.
    pub point_spacing_meters: f64,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_meters: f64,
    /// Driving speed in meters per second.
    pub speed_mps: f64,
    /// Number of partial traces the drive is cut into.
    pub partial_count: usize,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for GridScenario {
    fn default() -> Self {
        Self {
            origin: (47.37, 8.54),
            blocks: 8,
            block_meters: 120.0,
            point_spacing_meters: 15.0,
            gps_noise_sigma_meters: 2.0,
            speed_mps: 10.0,
            partial_count: 3,
            seed: 42,
        }
    }
}

/// A generated grid and drive.
pub struct SyntheticRun {
    /// Road network covering the grid.
    pub network: InMemoryRoadNetwork,
    /// The full drive in time order.
    pub trace: Vec<TrajectoryPoint>,
    /// The drive cut into contiguous pieces, supplied out of order
    /// (first piece first, the rest reversed).
    pub partials: Vec<Vec<TrajectoryPoint>>,
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl GridScenario {
    /// Generate the grid and the drive.
    pub fn generate(&self) -> Result<SyntheticRun> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let graph = self.build_grid()?;
        let route = self.staircase_route();
        let clean = sample_route(&route, self.point_spacing_meters);
        let noisy = add_gps_noise(&clean, self.gps_noise_sigma_meters, &mut rng);

        let start = start_time();
        let step_millis = self.point_spacing_meters / self.speed_mps * 1000.0;
        let step = TimeDelta::milliseconds(step_millis as i64);
        let trace: Vec<TrajectoryPoint> = noisy
            .into_iter()
            .enumerate()
            .map(|(i, (lat, lon))| TrajectoryPoint::new(lat, lon, start + step * i as i32))
            .collect();

        let partials = split_partials(&trace, self.partial_count);

        Ok(SyntheticRun {
            network: InMemoryRoadNetwork::new(graph),
            trace,
            partials,
        })
    }

    fn node_position(&self, row: usize, col: usize) -> (f64, f64) {
        let lat = self.origin.0 + meters_to_deg_lat(row as f64 * self.block_meters);
        let lon = self.origin.1 + meters_to_deg_lng(col as f64 * self.block_meters, self.origin.0);
        (lat, lon)
    }

    fn node_id(&self, row: usize, col: usize) -> u64 {
        (row * (self.blocks + 1) + col) as u64
    }

    /// Grid of two-way streets, one way identifier per street.
    fn build_grid(&self) -> Result<RoadGraph> {
        let n = self.blocks + 1;
        let mut nodes = Vec::with_capacity(n * n);
        let mut edges = Vec::new();

        for row in 0..n {
            for col in 0..n {
                let (lat, lon) = self.node_position(row, col);
                nodes.push(Node {
                    id: self.node_id(row, col),
                    x: lon,
                    y: lat,
                });
            }
        }

        let mut two_way = |a: u64, b: u64, way: i64| {
            for (u, v) in [(a, b), (b, a)] {
                edges.push(RoadEdge {
                    u,
                    v,
                    key: 0,
                    way_id: WayId(way),
                    drivable: true,
                    geometry: None,
                });
            }
        };

        for row in 0..n {
            for col in 0..self.blocks {
                two_way(
                    self.node_id(row, col),
                    self.node_id(row, col + 1),
                    EAST_WEST_WAY_BASE + row as i64,
                );
            }
        }
        for col in 0..n {
            for row in 0..self.blocks {
                two_way(
                    self.node_id(row, col),
                    self.node_id(row + 1, col),
                    NORTH_SOUTH_WAY_BASE + col as i64,
                );
            }
        }

        RoadGraph::new(nodes, edges)
    }

    /// Corner nodes of an east, north, east, north... route.
    fn staircase_route(&self) -> Vec<(f64, f64)> {
        let (mut row, mut col) = (0, 0);
        let mut corners = vec![self.node_position(row, col)];
        while row < self.blocks && col < self.blocks {
            col += 1;
            corners.push(self.node_position(row, col));
            row += 1;
            corners.push(self.node_position(row, col));
        }
        corners
    }
}

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap_or_default()
}

/// Points every `spacing` meters along a polyline of `(lat, lon)` corners.
fn sample_route(corners: &[(f64, f64)], spacing: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for w in corners.windows(2) {
        let (a, b) = (w[0], w[1]);
        let dlat = (b.0 - a.0) * METERS_PER_DEG_LAT;
        let dlng = (b.1 - a.1) * METERS_PER_DEG_LAT * a.0.to_radians().cos();
        let length = (dlat * dlat + dlng * dlng).sqrt();
        let steps = (length / spacing).ceil().max(1.0) as usize;
        for s in 0..steps {
            let t = s as f64 / steps as f64;
            points.push((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)));
        }
    }
    if let Some(&last) = corners.last() {
        points.push(last);
    }
    points
}

/// Add Gaussian GPS noise to a polyline.
fn add_gps_noise(points: &[(f64, f64)], sigma_meters: f64, rng: &mut StdRng) -> Vec<(f64, f64)> {
    if sigma_meters <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|&(lat, lon)| {
            // Box-Muller transform for Gaussian noise
            let u1: f64 = rng.gen_range(0.0001..1.0);
            let u2: f64 = rng.gen();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();

            (
                lat + meters_to_deg_lat(z0 * sigma_meters),
                lon + meters_to_deg_lng(z1 * sigma_meters, lat),
            )
        })
        .collect()
}

/// Cut a trace into `count` contiguous pieces, first piece first and the
/// rest in reverse order.
fn split_partials(trace: &[TrajectoryPoint], count: usize) -> Vec<Vec<TrajectoryPoint>> {
    if count == 0 || trace.is_empty() {
        return Vec::new();
    }
    let size = trace.len().div_ceil(count);
    let mut pieces: Vec<Vec<TrajectoryPoint>> = trace.chunks(size).map(<[_]>::to_vec).collect();
    if pieces.len() > 1 {
        pieces[1..].reverse();
    }
    pieces
}
