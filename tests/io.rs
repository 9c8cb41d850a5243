//! Tests for io module

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracerefine::{sequence_trajectories, RefineError, Table, TableConfig, TrajectoryPoint};

fn t(millis: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        + TimeDelta::milliseconds(millis)
}

#[test]
fn test_read_table() {
    let csv = "lat,lon,Time,speed\n\
               47.1,8.5,2024-01-01 08:00:00,12\n\
               47.2,8.6,2024-01-01 08:00:10,13\n";
    let table = Table::from_reader(csv.as_bytes()).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[1].latitude, 47.2);
    assert_eq!(table.rows()[1].longitude, 8.6);
    assert_eq!(table.column_index("speed"), Some(3));

    let points = table.to_trajectory(&TableConfig::default()).unwrap();
    assert_eq!(points[1], TrajectoryPoint::new(47.2, 8.6, t(10_000)));
}

#[test]
fn test_missing_coordinate_column() {
    let csv = "latitude,lon\n1.0,2.0\n";
    let err = Table::from_reader(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, RefineError::MissingColumn { ref column } if column == "lat"));
}

#[test]
fn test_invalid_number() {
    let csv = "lat,lon\n1.0,2.0\nabc,3.0\n";
    let err = Table::from_reader(csv.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        RefineError::InvalidField { row: 1, ref column, .. } if column == "lat"
    ));
}

#[test]
fn test_invalid_timestamp() {
    let csv = "lat,lon,Time\n1.0,2.0,yesterday\n";
    let table = Table::from_reader(csv.as_bytes()).unwrap();
    let err = table.to_trajectory(&TableConfig::default()).unwrap_err();
    assert!(matches!(err, RefineError::InvalidTimestamp { row: 0, .. }));
}

#[test]
fn test_parse_time_variants() {
    let config = TableConfig::default();
    assert_eq!(config.parse_time("2024-01-01 08:00:00", 0).unwrap(), t(0));
    assert_eq!(config.parse_time("2024-01-01 08:00:00.250", 0).unwrap(), t(250));
    assert_eq!(config.parse_time("2024-01-01T08:00:01Z", 0).unwrap(), t(1_000));

    let custom = TableConfig {
        time_format: "%d/%m/%Y %H:%M".to_string(),
    };
    assert_eq!(custom.parse_time("01/01/2024 08:00", 0).unwrap(), t(0));
}

#[test]
fn test_format_time_keeps_fraction() {
    let config = TableConfig::default();
    assert_eq!(config.format_time(&t(0)), "2024-01-01 08:00:00");
    assert_eq!(config.format_time(&t(250)), "2024-01-01 08:00:00.250");
}

#[test]
fn test_concat_unions_headers() {
    let a = Table::from_reader("lat,lon,Time,speed\n1.0,2.0,x,5\n".as_bytes()).unwrap();
    let b = Table::from_reader("lon,lat,heading\n4.0,3.0,90\n".as_bytes()).unwrap();
    let combined = Table::concat(&[a, b]);

    let headers: Vec<&str> = combined.headers().iter().collect();
    assert_eq!(headers, vec!["lat", "lon", "Time", "speed", "heading"]);
    assert_eq!(combined.len(), 2);

    let second: Vec<&str> = combined.rows()[1].record.iter().collect();
    assert_eq!(second, vec!["3.0", "4.0", "", "", "90"]);
    assert_eq!(combined.rows()[1].latitude, 3.0);
}

#[test]
fn test_sequencing_rows_keeps_metadata() {
    let csv = "lat,lon,id\n0.0,0.0,a\n0.0,0.002,b\n0.0,0.001,c\n";
    let table = Table::from_reader(csv.as_bytes()).unwrap();
    let ordered = table.with_rows(sequence_trajectories(&[table.rows().to_vec()]).unwrap());

    let ids: Vec<&str> = ordered.rows().iter().filter_map(|r| r.record.get(2)).collect();
    assert_eq!(ids, vec!["a", "c", "b"]);
}

#[test]
fn test_write_and_read_back_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let points = vec![
        TrajectoryPoint::new(47.37, 8.54, t(0)),
        TrajectoryPoint::new(47.38, 8.55, t(1_500)),
    ];
    let config = TableConfig::default();

    Table::from_trajectory(&points, &config).write_path(&path).unwrap();
    let reloaded = Table::from_path(&path).unwrap().to_trajectory(&config).unwrap();
    assert_eq!(reloaded, points);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Table::from_path(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, RefineError::Io(_)));
}
