//! Glacier series JSON documents
//!
//! A document is `{ "snapshots": [ { "time", "terrain", "thickness",
//! "geometry" }, ... ] }` with grids in ndarray's serde layout
//! (`{ "v": 1, "dim": [rows, cols], "data": [...] }`).

use glacierviz_core::{Error, GlacierSeries, GlacierSnapshot, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Deserialize)]
struct SeriesDocument {
    snapshots: Vec<GlacierSnapshot>,
}

/// Read a series document from any reader
pub fn series_from_reader<R: Read>(reader: R) -> Result<GlacierSeries> {
    let document: SeriesDocument = serde_json::from_reader(reader)
        .map_err(|e| Error::InvalidData(format!("Invalid series document: {}", e)))?;
    GlacierSeries::new(document.snapshots)
}

/// Read a series document from a file
pub fn read_series<P: AsRef<Path>>(path: P) -> Result<GlacierSeries> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let series = series_from_reader(BufReader::new(file))?;
    tracing::info!("Loaded {} glacier snapshots from {}", series.len(), path.display());
    Ok(series)
}

/// Write a series document to a file
pub fn write_series<P: AsRef<Path>>(series: &GlacierSeries, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, series).map_err(|e| {
        if e.is_io() {
            Error::Io(e.into())
        } else {
            Error::InvalidData(e.to_string())
        }
    })?;
    writer.flush()?;
    Ok(())
}
