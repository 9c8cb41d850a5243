//! Shared trajectory helpers.
//!
//! Caches and deduplication key on exact `(lat, lon)` bit patterns rather
//! than on point identity, so the same coordinate always maps to the same
//! entry.

use std::collections::HashSet;

use chrono::{NaiveDateTime, TimeDelta};

use crate::{Positioned, TrajectoryPoint};

/// Hashable, exact key for a `(lat, lon)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey(u64, u64);

impl CoordKey {
    /// Build a key from latitude and longitude.
    ///
    /// `-0.0` and `0.0` map to the same key.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(canonical_bits(latitude), canonical_bits(longitude))
    }

    /// Key for any positioned value.
    pub fn of<P: Positioned>(p: &P) -> Self {
        Self::new(p.latitude(), p.longitude())
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Drop every point whose coordinates repeat an earlier point.
///
/// The first occurrence wins and order is otherwise preserved.
pub fn dedup_coordinates<P: Positioned + Clone>(points: &[P]) -> Vec<P> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .filter(|p| seen.insert(CoordKey::of(*p)))
        .cloned()
        .collect()
}

/// Concatenate two trajectories, order by time and drop repeated coordinates.
///
/// The sort is stable, so for equal timestamps points from `primary` come
/// before points from `secondary`, and deduplication keeps the earliest
/// row after sorting.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tracerefine::{merge_by_time, TrajectoryPoint};
///
/// let t = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let a = vec![TrajectoryPoint::new(1.0, 1.0, t + chrono::TimeDelta::seconds(10))];
/// let b = vec![
///     TrajectoryPoint::new(0.0, 0.0, t),
///     TrajectoryPoint::new(1.0, 1.0, t + chrono::TimeDelta::seconds(10)),
/// ];
/// let merged = merge_by_time(&a, &b);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].latitude, 0.0);
/// ```
pub fn merge_by_time(
    primary: &[TrajectoryPoint],
    secondary: &[TrajectoryPoint],
) -> Vec<TrajectoryPoint> {
    let mut combined: Vec<TrajectoryPoint> = primary.iter().chain(secondary).copied().collect();
    combined.sort_by_key(|p| p.time);
    dedup_coordinates(&combined)
}

/// Check that timestamps never decrease.
pub fn is_time_ordered(points: &[TrajectoryPoint]) -> bool {
    points.windows(2).all(|w| w[0].time <= w[1].time)
}

/// Linearly interpolate between two instants.
///
/// `ratio` 0 yields `start`, 1 yields `end`. Sub-nanosecond remainders are
/// rounded. Spans too long for nanosecond precision (about 292 years)
/// interpolate in whole seconds.
pub fn lerp_time(start: NaiveDateTime, end: NaiveDateTime, ratio: f64) -> NaiveDateTime {
    let span = end - start;
    match span.num_nanoseconds() {
        Some(nanos) => start + TimeDelta::nanoseconds((nanos as f64 * ratio).round() as i64),
        None => start + TimeDelta::seconds((span.num_seconds() as f64 * ratio).round() as i64),
    }
}
