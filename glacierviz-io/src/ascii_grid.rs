//! ESRI ASCII grid (`.asc`) support
//!
//! Reads DEM and thickness rasters exported by GIS tooling:
//! - `ncols`, `nrows`, `cellsize` header keys (case-insensitive)
//! - lower-left reference as either `xllcorner/yllcorner` or `xllcenter/yllcenter`
//! - optional `NODATA_value`, mapped to `NaN`
//!
//! Data rows run north to south, so the resulting geometry has a negative
//! y spacing and row 0 is the northernmost row.

use crate::error::IoError;
use glacierviz_core::{GridGeometry, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A raster read from an ASCII grid file
#[derive(Debug, Clone)]
pub struct AsciiGrid {
    pub geometry: GridGeometry,
    pub values: Array2<f32>,
    pub nodata: Option<f32>,
}

impl AsciiGrid {
    /// Replace nodata cells (`NaN`) with a fill value
    pub fn fill_nodata(mut self, fill: f32) -> Self {
        self.values.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        self
    }

    /// Number of nodata cells
    pub fn nodata_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Header keys recognised before the first data row
const HEADER_KEYS: &[&str] = &[
    "ncols",
    "nrows",
    "xllcorner",
    "xllcenter",
    "yllcorner",
    "yllcenter",
    "cellsize",
    "nodata_value",
];

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    nodata: Option<f32>,
}

/// Read an ASCII grid file
pub fn read_ascii_grid<P: AsRef<Path>>(path: P) -> Result<AsciiGrid> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let grid = read_ascii_grid_from(BufReader::new(file), "")?;
    if grid.nodata_count() > 0 {
        tracing::warn!("{}: {} nodata cells", path.display(), grid.nodata_count());
    }
    Ok(grid)
}

/// Read an ASCII grid from any buffered reader, tagging the geometry with a CRS
pub fn read_ascii_grid_from<R: BufRead>(reader: R, crs: &str) -> Result<AsciiGrid> {
    let mut header = Header::default();
    let mut values = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let first = trimmed.split_whitespace().next().unwrap_or_default();
        if values.is_empty() && HEADER_KEYS.contains(&first.to_ascii_lowercase().as_str()) {
            parse_header_line(&mut header, trimmed, line_no)?;
            continue;
        }

        for token in trimmed.split_whitespace() {
            let value: f32 = token.parse().map_err(|_| IoError::ParseError {
                line: line_no,
                message: format!("'{}' is not a number", token),
            })?;
            values.push(match header.nodata {
                Some(nodata) if value == nodata => f32::NAN,
                _ => value,
            });
        }
    }

    let missing = |key: &str| IoError::InvalidFormat {
        format: format!("ASCII grid header is missing '{}'", key),
    };
    let ncols = header.ncols.ok_or_else(|| missing("ncols"))?;
    let nrows = header.nrows.ok_or_else(|| missing("nrows"))?;
    let (xll, x_is_center) = header.xll.ok_or_else(|| missing("xllcorner"))?;
    let (yll, y_is_center) = header.yll.ok_or_else(|| missing("yllcorner"))?;
    let cellsize = header.cellsize.ok_or_else(|| missing("cellsize"))?;

    let cells = nrows.checked_mul(ncols).ok_or_else(|| IoError::InvalidFormat {
        format: format!("ASCII grid size {}x{} is too large", nrows, ncols),
    })?;
    if values.len() != cells {
        return Err(IoError::InvalidFormat {
            format: format!(
                "ASCII grid declares {}x{} cells but contains {} values",
                nrows,
                ncols,
                values.len()
            ),
        }
        .into());
    }

    let half = cellsize / 2.0;
    let x0 = if x_is_center { xll } else { xll + half };
    let y_south = if y_is_center { yll } else { yll + half };
    let y0 = y_south + nrows.saturating_sub(1) as f64 * cellsize;

    let values = Array2::from_shape_vec((nrows, ncols), values).map_err(|e| IoError::InvalidFormat {
        format: e.to_string(),
    })?;

    Ok(AsciiGrid {
        geometry: GridGeometry::new((x0, y0), (cellsize, -cellsize), crs),
        values,
        nodata: header.nodata,
    })
}

fn parse_header_line(header: &mut Header, line: &str, line_no: usize) -> Result<()> {
    let mut parts = line.split_whitespace();
    let key = parts.next().unwrap_or_default().to_ascii_lowercase();
    let raw = parts.next().ok_or_else(|| IoError::ParseError {
        line: line_no,
        message: format!("header key '{}' has no value", key),
    })?;
    let count = |raw: &str| -> Result<usize> {
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(IoError::ParseError {
                line: line_no,
                message: format!("'{}' must be a positive integer", raw),
            }
            .into()),
        }
    };
    let number = |raw: &str| -> Result<f64> {
        raw.parse::<f64>().map_err(|_| {
            IoError::ParseError {
                line: line_no,
                message: format!("'{}' is not a number", raw),
            }
            .into()
        })
    };

    match key.as_str() {
        "ncols" => header.ncols = Some(count(raw)?),
        "nrows" => header.nrows = Some(count(raw)?),
        "xllcorner" => header.xll = Some((number(raw)?, false)),
        "xllcenter" => header.xll = Some((number(raw)?, true)),
        "yllcorner" => header.yll = Some((number(raw)?, false)),
        "yllcenter" => header.yll = Some((number(raw)?, true)),
        "cellsize" => header.cellsize = Some(number(raw)?),
        "nodata_value" => header.nodata = Some(number(raw)? as f32),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacierviz_core::Error;

    const GRID: &str = "ncols 3
nrows 2
xllcorner 1000.0
yllcorner 2000.0
cellsize 10.0
NODATA_value -9999
1.0 2.0 3.0
4.0 -9999 6.0
";

    #[test]
    fn test_read_grid_geometry_and_values() {
        let grid = read_ascii_grid_from(GRID.as_bytes(), "EPSG:21781").unwrap();

        assert_eq!(grid.values.dim(), (2, 3));
        assert_eq!(grid.values[[0, 2]], 3.0);
        assert!(grid.values[[1, 1]].is_nan());
        assert_eq!(grid.nodata_count(), 1);

        // Row 0 is the northern row, centered half a cell inside the corner
        assert_eq!(grid.geometry.origin, (1005.0, 2015.0));
        assert_eq!(grid.geometry.spacing, (10.0, -10.0));
        assert_eq!(grid.geometry.y(1), 2005.0);
        assert_eq!(grid.geometry.crs, "EPSG:21781");

        let filled = grid.fill_nodata(0.0);
        assert_eq!(filled.values[[1, 1]], 0.0);
    }

    #[test]
    fn test_cell_center_reference() {
        let text = "ncols 1\nnrows 2\nxllcenter 5\nyllcenter 5\ncellsize 10\n1\n2\n";
        let grid = read_ascii_grid_from(text.as_bytes(), "").unwrap();
        assert_eq!(grid.geometry.origin, (5.0, 15.0));
        assert!(grid.nodata.is_none());
    }

    #[test]
    fn test_value_count_mismatch() {
        let text = GRID.replace("6.0\n", "");
        let result = read_ascii_grid_from(text.as_bytes(), "");
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let text = GRID.replace("2.0", "two");
        match read_ascii_grid_from(text.as_bytes(), "") {
            Err(Error::InvalidData(message)) => assert!(message.contains("line 7")),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_grid_dimensions_must_be_positive_integers() {
        for bad in ["1e19", "-3", "2.5", "0"] {
            let text = GRID.replace("ncols 3", &format!("ncols {}", bad));
            match read_ascii_grid_from(text.as_bytes(), "") {
                Err(Error::InvalidData(message)) => assert!(message.contains("line 1"), "{}", message),
                other => panic!("Expected parse error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let text = GRID
            .replace("ncols 3", &format!("ncols {}", usize::MAX))
            .replace("nrows 2", "nrows 10");
        assert!(matches!(
            read_ascii_grid_from(text.as_bytes(), ""),
            Err(Error::InvalidData(message)) if message.contains("too large")
        ));
    }

    #[test]
    fn test_leading_nan_row_is_data() {
        let text = "ncols 3\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nnan 1 2\n";
        let grid = read_ascii_grid_from(text.as_bytes(), "").unwrap();
        assert!(grid.values[[0, 0]].is_nan());
        assert_eq!(grid.values[[0, 2]], 2.0);
    }

    #[test]
    fn test_missing_header_key() {
        let text = GRID.replace("cellsize 10.0\n", "");
        assert!(read_ascii_grid_from(text.as_bytes(), "").is_err());
    }
}
