//! Greedy nearest-neighbour sequencing of partial trajectories.
//!
//! Several partial traces of the same journey are concatenated and then
//! re-ordered into a single path by repeatedly walking to the closest
//! unvisited point (geodesic distance), starting from the first point of
//! the first input. This is an O(n²) batch algorithm with no incremental
//! update support.

use log::{info, warn};

use crate::geodesic::{distance_unchecked, to_point, validate};
use crate::{Positioned, Result};

/// Merge several trajectories into one spatially ordered trajectory.
///
/// Rows keep all of their data (metadata columns included); only their
/// order changes. The output is a permutation of the concatenated input
/// whose first element is the first row of the first non-empty input.
///
/// # Errors
/// [`RefineError::InvalidCoordinate`](crate::RefineError::InvalidCoordinate)
/// if any row lies outside the WGS84 domain.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tracerefine::{sequence_trajectories, TrajectoryPoint};
///
/// let t = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let a = vec![TrajectoryPoint::new(0.0, 0.0, t), TrajectoryPoint::new(0.0, 0.002, t)];
/// let b = vec![TrajectoryPoint::new(0.0, 0.001, t)];
///
/// let merged = sequence_trajectories(&[a, b]).unwrap();
/// let lons: Vec<f64> = merged.iter().map(|p| p.longitude).collect();
/// assert_eq!(lons, vec![0.0, 0.001, 0.002]);
/// ```
pub fn sequence_trajectories<P: Positioned + Clone>(trajectories: &[Vec<P>]) -> Result<Vec<P>> {
    let combined: Vec<P> = trajectories.iter().flatten().cloned().collect();
    let order = sequence_order(&combined)?;

    info!(
        "[Sequencer] Ordered {} points from {} trajectories",
        order.len(),
        trajectories.len()
    );

    Ok(order.into_iter().map(|i| combined[i].clone()).collect())
}

/// Compute the greedy nearest-neighbour visiting order over `points`.
///
/// Index 0 is always visited first. At each step the unvisited point with
/// the strictly smallest distance to the current point is chosen; on ties
/// the lowest index wins, so the result is fully deterministic.
///
/// If no unvisited point can be reached (only possible when distances are
/// not comparable), the order built so far is returned.
pub fn sequence_order<P: Positioned>(points: &[P]) -> Result<Vec<usize>> {
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let coords: Vec<_> = points.iter().map(to_point).collect();
    for &c in &coords {
        validate(c)?;
    }

    let n = coords.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        let mut min_dist = f64::INFINITY;
        let mut nearest = None;

        for (i, &coord) in coords.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let dist = distance_unchecked(coords[current], coord);
            if dist < min_dist {
                min_dist = dist;
                nearest = Some(i);
            }
        }

        let Some(next) = nearest else {
            warn!(
                "[Sequencer] No reachable point left after {} of {}; stopping early",
                order.len(),
                n
            );
            break;
        };

        visited[next] = true;
        order.push(next);
        current = next;
    }

    Ok(order)
}
