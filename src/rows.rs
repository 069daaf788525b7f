//! CSV row schemas and readers.
//!
//! Input CSVs are validated up front: required columns are looked up by
//! header name and missing ones are a terminal error, while per-row
//! problems (empty boundary, unparseable coordinates) only drop that row.

use csv::ReaderBuilder;
use std::io::Read;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RowsError {
    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV must contain '{0}' column")]
    MissingColumn(&'static str),
    #[error("No valid rows with Latitude and Longitude")]
    NoValidRows,
}

/// A CSV row carrying a polygon boundary string.
#[derive(Debug, Clone)]
pub struct BoundaryRow {
    /// Raw `[x1,y1],[x2,y2],...` text, `None` when the cell is empty.
    pub boundary: Option<String>,
    /// Source row identifier, carried through to output as `d`.
    pub number: String,
}

/// Read boundary rows. Requires a `Boundary` column; `Number` is optional
/// and defaults to the empty string.
pub fn read_boundary_rows<R: Read>(reader: R) -> Result<Vec<BoundaryRow>, RowsError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    info!("Input columns: {:?}", headers.iter().collect::<Vec<_>>());

    let boundary_idx = headers
        .iter()
        .position(|h| h == "Boundary")
        .ok_or(RowsError::MissingColumn("Boundary"))?;
    let number_idx = headers.iter().position(|h| h == "Number");

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let boundary = record
            .get(boundary_idx)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let number = number_idx
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .to_string();
        rows.push(BoundaryRow { boundary, number });
    }

    Ok(rows)
}

/// A CSV row with point coordinates for rendering.
#[derive(Debug, Clone, Copy)]
pub struct PointRow {
    pub latitude: f64,
    pub longitude: f64,
}

/// Read point rows. Requires `Latitude` and `Longitude` columns; rows with
/// empty or unparseable coordinates are dropped, and zero surviving rows is
/// an error.
pub fn read_point_rows<R: Read>(reader: R) -> Result<Vec<PointRow>, RowsError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let lat_idx = headers
        .iter()
        .position(|h| h == "Latitude")
        .ok_or(RowsError::MissingColumn("Latitude"))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == "Longitude")
        .ok_or(RowsError::MissingColumn("Longitude"))?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for result in csv_reader.records() {
        let record = result?;
        let latitude = record.get(lat_idx).and_then(|s| s.trim().parse::<f64>().ok());
        let longitude = record.get(lon_idx).and_then(|s| s.trim().parse::<f64>().ok());
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => rows.push(PointRow {
                latitude,
                longitude,
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {} rows without valid coordinates", dropped);
    }
    if rows.is_empty() {
        return Err(RowsError::NoValidRows);
    }

    Ok(rows)
}
