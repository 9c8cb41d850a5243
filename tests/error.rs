//! Tests for error module

use tracerefine::error::{OptionExt, RefineError};

#[test]
fn test_error_display() {
    let err = RefineError::MissingColumn {
        column: "lat".to_string(),
    };
    assert!(err.to_string().contains("'lat'"));

    let err = RefineError::InvalidCoordinate {
        latitude: 95.0,
        longitude: 0.0,
    };
    assert!(err.to_string().contains("lat=95"));

    let err = RefineError::DegenerateSegment { index: 7 };
    assert!(err.to_string().contains("index 7"));
}

#[test]
fn test_option_ext_missing_column() {
    let none: Option<usize> = None;
    let result = none.ok_or_missing_column("Time");
    assert!(matches!(
        result,
        Err(RefineError::MissingColumn { ref column }) if column == "Time"
    ));
}

#[test]
fn test_option_ext_adapter_failure() {
    let none: Option<usize> = None;
    let result = none.ok_or_adapter_failure("no roads");
    match result {
        Err(RefineError::AdapterFailure(msg)) => assert_eq!(msg, "no roads"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_option_ext_some_passes_through() {
    assert_eq!(Some(3).ok_or_missing_column("lat").unwrap(), 3);
    assert_eq!(Some(4).ok_or_adapter_failure("x").unwrap(), 4);
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: RefineError = io.into();
    assert!(matches!(err, RefineError::Io(_)));
}
