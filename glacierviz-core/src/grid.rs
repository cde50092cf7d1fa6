//! Regular grid georeferencing

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Georeference of a regular 2D grid.
///
/// Cell `(row, col)` is centered at `x = origin.0 + col * spacing.0` and
/// `y = origin.1 + row * spacing.1`. Either spacing may be negative, which is
/// the usual case for north-up rasters (`dy < 0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Center of the first cell `(x0, y0)`
    pub origin: (f64, f64),
    /// Cell spacing `(dx, dy)`
    pub spacing: (f64, f64),
    /// Coordinate reference system, e.g. a PROJ string or `EPSG:32632`
    #[serde(default)]
    pub crs: String,
}

impl GridGeometry {
    /// Create a new grid geometry
    pub fn new(origin: (f64, f64), spacing: (f64, f64), crs: impl Into<String>) -> Self {
        Self {
            origin,
            spacing,
            crs: crs.into(),
        }
    }

    /// Unit-spaced grid starting at the origin, without a CRS
    pub fn unit() -> Self {
        Self::new((0.0, 0.0), (1.0, 1.0), "")
    }

    /// X coordinate of a column
    pub fn x(&self, col: usize) -> f64 {
        self.origin.0 + col as f64 * self.spacing.0
    }

    /// Y coordinate of a row
    pub fn y(&self, row: usize) -> f64 {
        self.origin.1 + row as f64 * self.spacing.1
    }

    /// Extent `((x_min, x_max), (y_min, y_max))` of a grid with the given shape
    pub fn extent(&self, shape: (usize, usize)) -> ((f64, f64), (f64, f64)) {
        let (rows, cols) = shape;
        let x_end = self.x(cols.saturating_sub(1));
        let y_end = self.y(rows.saturating_sub(1));
        (
            (self.origin.0.min(x_end), self.origin.0.max(x_end)),
            (self.origin.1.min(y_end), self.origin.1.max(y_end)),
        )
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::unit()
    }
}

/// Minimum and maximum of the finite values of a grid
pub fn finite_range(grid: &Array2<f32>) -> Option<(f32, f32)> {
    grid.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_coordinates_follow_spacing() {
        let geometry = GridGeometry::new((100.0, 500.0), (50.0, -50.0), "EPSG:32632");
        assert_eq!(geometry.x(0), 100.0);
        assert_eq!(geometry.x(3), 250.0);
        assert_eq!(geometry.y(2), 400.0);
    }

    #[test]
    fn test_extent_handles_negative_spacing() {
        let geometry = GridGeometry::new((0.0, 100.0), (10.0, -10.0), "");
        let ((x_min, x_max), (y_min, y_max)) = geometry.extent((5, 3));
        assert_eq!((x_min, x_max), (0.0, 20.0));
        assert_eq!((y_min, y_max), (60.0, 100.0));
    }

    #[test]
    fn test_finite_range_skips_nan() {
        let grid = array![[1.0, f32::NAN], [-2.0, 4.0]];
        assert_eq!(finite_range(&grid), Some((-2.0, 4.0)));

        let empty = Array2::<f32>::from_elem((2, 2), f32::NAN);
        assert_eq!(finite_range(&empty), None);
    }
}
