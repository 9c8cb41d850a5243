//! Tests for curves module

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracerefine::{
    bearing_changes, densify_curves, detect_curve_points, forward_bearings, CurveConfig,
    RefineError, Table, TableConfig, TrajectoryPoint,
};

fn t(millis: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        + TimeDelta::milliseconds(millis)
}

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// North, then east: one right-angle turn at index 1.
fn right_turn() -> Vec<TrajectoryPoint> {
    vec![
        TrajectoryPoint::new(0.0, 0.0, t(0)),
        TrajectoryPoint::new(0.001, 0.0, t(10_000)),
        TrajectoryPoint::new(0.001, 0.001, t(20_000)),
    ]
}

#[test]
fn test_forward_bearings() {
    let bearings = forward_bearings(&right_turn()).unwrap();
    assert_eq!(bearings.len(), 2);
    assert!(approx_eq(bearings[0], 0.0, 1e-9));
    assert!(approx_eq(bearings[1], 90.0, 0.01));
}

#[test]
fn test_bearing_changes_undefined_at_ends() {
    let changes = bearing_changes(&right_turn()).unwrap();
    assert_eq!(changes.len(), 3);
    assert!(changes[0].is_none());
    assert!(approx_eq(changes[1].unwrap(), 90.0, 0.01));
    assert!(changes[2].is_none());
}

#[test]
fn test_bearing_change_has_no_wraparound() {
    // Heading a little west of north, then a little east of north.
    let points = vec![
        TrajectoryPoint::new(0.0, 0.0001, t(0)),
        TrajectoryPoint::new(0.001, 0.0, t(1_000)),
        TrajectoryPoint::new(0.002, 0.0001, t(2_000)),
    ];
    let change = bearing_changes(&points).unwrap()[1].unwrap();
    assert!(change > 300.0, "expected literal difference, got {change}");
}

#[test]
fn test_detect_curve_points() {
    assert_eq!(detect_curve_points(&right_turn(), 0.5).unwrap(), vec![1]);
    let gentle = detect_curve_points(&right_turn(), 120.0).unwrap();
    assert!(gentle.is_empty());
}

#[test]
fn test_granularity_five_yields_five_points() {
    let points = right_turn();
    let dense = densify_curves(&points, &CurveConfig::default()).unwrap();

    assert_eq!(dense.len(), 5);
    assert_eq!(dense[0], points[1]);
    assert_eq!(dense[4], points[2]);

    // Timestamps are uniform in index between the segment's endpoints.
    let expected = [10_000, 12_500, 15_000, 17_500, 20_000];
    for (p, ms) in dense.iter().zip(expected) {
        assert_eq!(p.time, t(ms));
    }
    for p in &dense[1..4] {
        assert!(approx_eq(p.latitude, 0.001, 1e-7));
        assert!(p.longitude > 0.0 && p.longitude < 0.001);
    }
}

#[test]
fn test_shared_endpoints_deduplicated() {
    // Zig-zag with curves at 1 and 2; the segments share point 2.
    let points = vec![
        TrajectoryPoint::new(0.0, 0.0, t(0)),
        TrajectoryPoint::new(0.001, 0.0, t(10_000)),
        TrajectoryPoint::new(0.001, 0.001, t(20_000)),
        TrajectoryPoint::new(0.002, 0.001, t(30_000)),
    ];
    let dense = densify_curves(&points, &CurveConfig::default()).unwrap();
    assert_eq!(dense.len(), 9);
    assert_eq!(dense.iter().filter(|p| **p == points[2]).count(), 1);
}

#[test]
fn test_no_curves_returns_input_unchanged() {
    let straight = vec![
        TrajectoryPoint::new(0.0, 0.0, t(0)),
        TrajectoryPoint::new(0.001, 0.0, t(1_000)),
        TrajectoryPoint::new(0.002, 0.0, t(2_000)),
    ];
    let config = CurveConfig::default();
    assert_eq!(densify_curves(&straight, &config).unwrap(), straight);

    let two = &straight[..2];
    assert_eq!(densify_curves(two, &config).unwrap(), two);
    assert!(densify_curves(&[], &config).unwrap().is_empty());
}

#[test]
fn test_config_validation() {
    let bad_granularity = CurveConfig {
        granularity: 1,
        ..CurveConfig::default()
    };
    assert!(matches!(
        densify_curves(&right_turn(), &bad_granularity),
        Err(RefineError::InvalidConfig(_))
    ));

    let bad_threshold = CurveConfig {
        threshold: -1.0,
        ..CurveConfig::default()
    };
    assert!(bad_threshold.validate().is_err());
    assert!(CurveConfig::default().validate().is_ok());
}

#[test]
fn test_missing_time_column() {
    let csv = "lat,lon\n0.0,0.0\n0.001,0.0\n";
    let table = Table::from_reader(csv.as_bytes()).unwrap();
    let err = table.to_trajectory(&TableConfig::default()).unwrap_err();
    assert!(matches!(err, RefineError::MissingColumn { ref column } if column == "Time"));
}
