//! Tabular input and output.
//!
//! Tables are CSV with one row per observation. `lat` and `lon` are always
//! required; `Time` is required wherever timestamps matter. Any other
//! columns are carried along untouched, so sequencing preserves per-row
//! metadata.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Timelike};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::OptionExt;
use crate::{Positioned, RefineError, Result, TrajectoryPoint};

pub const LAT_COLUMN: &str = "lat";
pub const LON_COLUMN: &str = "lon";
pub const TIME_COLUMN: &str = "Time";

/// Configuration for reading and writing tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// chrono format of the `Time` column.
    /// Default: "%Y-%m-%d %H:%M:%S"
    pub time_format: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl TableConfig {
    /// Parse a timestamp with the configured format.
    ///
    /// Fractional seconds after the configured format and RFC 3339 strings
    /// are accepted as well. `row` is only used for error reporting.
    pub fn parse_time(&self, value: &str, row: usize) -> Result<NaiveDateTime> {
        let value = value.trim();
        NaiveDateTime::parse_from_str(value, &self.time_format)
            .or_else(|_| NaiveDateTime::parse_from_str(value, &format!("{}%.f", self.time_format)))
            .or_else(|_| DateTime::parse_from_rfc3339(value).map(|t| t.naive_utc()))
            .map_err(|_| RefineError::InvalidTimestamp {
                row,
                value: value.to_string(),
            })
    }

    /// Format a timestamp, appending fractional seconds when present.
    pub fn format_time(&self, time: &NaiveDateTime) -> String {
        let mut out = time.format(&self.time_format).to_string();
        let has_fraction = self.time_format.contains("%f") || self.time_format.contains("%.");
        if time.nanosecond() != 0 && !has_fraction {
            out.push_str(&time.format("%.f").to_string());
        }
        out
    }
}

/// One table row with its coordinates parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub latitude: f64,
    pub longitude: f64,
    pub record: StringRecord,
}

impl Positioned for Row {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A CSV table with required coordinate columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: StringRecord,
    rows: Vec<Row>,
}

impl Table {
    /// Read a table from CSV.
    ///
    /// # Errors
    /// [`RefineError::MissingColumn`] if `lat` or `lon` is absent and
    /// [`RefineError::InvalidField`] for a non-numeric coordinate.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = csv.headers()?.clone();
        let records = csv.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_records(headers, records)
    }

    /// Read a table from a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Build a table from already split records.
    pub fn from_records(headers: StringRecord, records: Vec<StringRecord>) -> Result<Self> {
        let lat = column(&headers, LAT_COLUMN).ok_or_missing_column(LAT_COLUMN)?;
        let lon = column(&headers, LON_COLUMN).ok_or_missing_column(LON_COLUMN)?;

        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                Ok(Row {
                    latitude: parse_number(&record, lat, LAT_COLUMN, i)?,
                    longitude: parse_number(&record, lon, LON_COLUMN, i)?,
                    record,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { headers, rows })
    }

    /// A `lat, lon, Time` table from trajectory points.
    pub fn from_trajectory(points: &[TrajectoryPoint], config: &TableConfig) -> Self {
        let headers = StringRecord::from(vec![LAT_COLUMN, LON_COLUMN, TIME_COLUMN]);
        let rows = points
            .iter()
            .map(|p| Row {
                latitude: p.latitude,
                longitude: p.longitude,
                record: StringRecord::from(vec![
                    p.latitude.to_string(),
                    p.longitude.to_string(),
                    config.format_time(&p.time),
                ]),
            })
            .collect();
        Self { headers, rows }
    }

    /// Concatenate tables row-wise.
    ///
    /// Headers are unioned in order of first appearance; cells for columns a
    /// table lacks are left blank.
    pub fn concat(tables: &[Table]) -> Self {
        let mut names: Vec<String> = Vec::new();
        for table in tables {
            for h in &table.headers {
                if !names.iter().any(|n| n == h) {
                    names.push(h.to_string());
                }
            }
        }
        let position: HashMap<&str, usize> =
            names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

        let mut rows = Vec::with_capacity(tables.iter().map(Table::len).sum());
        for table in tables {
            let targets: Vec<usize> = table.headers.iter().map(|h| position[h]).collect();
            for row in &table.rows {
                let mut cells = vec![""; names.len()];
                for (cell, &target) in row.record.iter().zip(&targets) {
                    cells[target] = cell;
                }
                rows.push(Row {
                    latitude: row.latitude,
                    longitude: row.longitude,
                    record: StringRecord::from(cells),
                });
            }
        }

        Self {
            headers: StringRecord::from(names),
            rows,
        }
    }

    /// Same headers, rows replaced.
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            headers: self.headers.clone(),
            rows,
        }
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        column(&self.headers, name)
    }

    /// Interpret the table as a timed trajectory.
    ///
    /// # Errors
    /// [`RefineError::MissingColumn`] if `Time` is absent and
    /// [`RefineError::InvalidTimestamp`] for unparseable times.
    pub fn to_trajectory(&self, config: &TableConfig) -> Result<Vec<TrajectoryPoint>> {
        let time = self.column_index(TIME_COLUMN).ok_or_missing_column(TIME_COLUMN)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let raw = row.record.get(time).unwrap_or_default();
                Ok(TrajectoryPoint::new(
                    row.latitude,
                    row.longitude,
                    config.parse_time(raw, i)?,
                ))
            })
            .collect()
    }

    /// Write the table as CSV.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.headers)?;
        for row in &self.rows {
            csv.write_record(&row.record)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file.
    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write(File::create(path)?)
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn parse_number(record: &StringRecord, index: usize, column: &str, row: usize) -> Result<f64> {
    let raw = record.get(index).unwrap_or_default();
    raw.trim().parse().map_err(|_| RefineError::InvalidField {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}
