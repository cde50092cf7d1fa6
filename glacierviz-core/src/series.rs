//! Glacier snapshots and time series

use crate::error::{Error, Result};
use crate::grid::{finite_range, GridGeometry};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One time step of glacier state.
///
/// `terrain` holds the bedrock elevation and `thickness` the ice thickness,
/// both in meters and indexed `[row, col]` over the same grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlacierSnapshot {
    /// Timestamp as a (possibly fractional) calendar year
    pub time: f64,
    pub terrain: Array2<f32>,
    pub thickness: Array2<f32>,
    #[serde(default)]
    pub geometry: GridGeometry,
}

impl GlacierSnapshot {
    /// Create a new snapshot
    pub fn new(
        time: f64,
        terrain: Array2<f32>,
        thickness: Array2<f32>,
        geometry: GridGeometry,
    ) -> Self {
        Self {
            time,
            terrain,
            thickness,
            geometry,
        }
    }

    /// Grid shape `(rows, cols)` of the terrain grid
    pub fn shape(&self) -> (usize, usize) {
        self.terrain.dim()
    }

    /// Ice surface elevation, bedrock plus thickness.
    ///
    /// Non-finite thickness counts as ice-free, so the surface rests on the bedrock.
    pub fn surface_elevation(&self) -> Array2<f32> {
        &self.terrain + &self.thickness.mapv(|t| if t.is_finite() { t } else { 0.0 })
    }

    /// Total ice volume in cubic meters
    pub fn ice_volume(&self) -> f64 {
        let cell_area = (self.geometry.spacing.0 * self.geometry.spacing.1).abs();
        self.thickness
            .iter()
            .filter(|t| t.is_finite())
            .map(|&t| t.max(0.0) as f64 * cell_area)
            .sum()
    }
}

/// Ordered sequence of snapshots, ascending by timestamp
///
/// Only `Serialize` is derived; readers go through [`GlacierSeries::new`] so
/// the ordering is always checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlacierSeries {
    snapshots: Vec<GlacierSnapshot>,
}

impl GlacierSeries {
    /// Create a series; timestamps must be strictly ascending
    pub fn new(snapshots: Vec<GlacierSnapshot>) -> Result<Self> {
        if let Some(pos) = snapshots
            .windows(2)
            .position(|pair| !(pair[0].time < pair[1].time))
        {
            return Err(Error::InvalidData(format!(
                "Snapshot timestamps must be strictly ascending: {} is followed by {}",
                snapshots[pos].time,
                snapshots[pos + 1].time
            )));
        }
        Ok(Self { snapshots })
    }

    /// Build a series from one static bedrock and a thickness grid per timestamp
    pub fn from_static_terrain(
        terrain: Array2<f32>,
        geometry: GridGeometry,
        steps: impl IntoIterator<Item = (f64, Array2<f32>)>,
    ) -> Result<Self> {
        let snapshots = steps
            .into_iter()
            .map(|(time, thickness)| {
                GlacierSnapshot::new(time, terrain.clone(), thickness, geometry.clone())
            })
            .collect();
        Self::new(snapshots)
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if the series has no snapshots
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&GlacierSnapshot> {
        self.snapshots.get(index)
    }

    /// Iterate over the snapshots in time order
    pub fn iter(&self) -> std::slice::Iter<'_, GlacierSnapshot> {
        self.snapshots.iter()
    }

    /// All snapshots
    pub fn snapshots(&self) -> &[GlacierSnapshot] {
        &self.snapshots
    }

    /// Timestamps in order
    pub fn times(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.time).collect()
    }

    /// Check that every terrain and thickness grid shares one shape.
    ///
    /// Returns that shape, or `ShapeMismatch` naming the first offending
    /// snapshot. An empty series is rejected as `InvalidData`.
    pub fn validate_shapes(&self) -> Result<(usize, usize)> {
        let first = self
            .snapshots
            .first()
            .ok_or_else(|| Error::InvalidData("Glacier series is empty".to_string()))?;
        let expected = first.terrain.dim();

        for (snapshot, s) in self.snapshots.iter().enumerate() {
            for found in [s.terrain.dim(), s.thickness.dim()] {
                if found != expected {
                    return Err(Error::ShapeMismatch {
                        snapshot,
                        expected,
                        found,
                    });
                }
            }
        }
        Ok(expected)
    }

    /// Whether the bedrock differs between any two snapshots
    pub fn terrain_varies(&self) -> bool {
        match self.snapshots.split_first() {
            Some((first, rest)) => rest.iter().any(|s| s.terrain != first.terrain),
            None => false,
        }
    }

    /// Largest finite ice thickness over all snapshots
    pub fn max_thickness(&self) -> Option<f32> {
        self.snapshots
            .iter()
            .filter_map(|s| finite_range(&s.thickness))
            .map(|(_, hi)| hi)
            .reduce(f32::max)
    }

    /// Finite bedrock elevation range over all snapshots
    pub fn terrain_range(&self) -> Option<(f32, f32)> {
        self.snapshots
            .iter()
            .filter_map(|s| finite_range(&s.terrain))
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    }
}

impl<'a> IntoIterator for &'a GlacierSeries {
    type Item = &'a GlacierSnapshot;
    type IntoIter = std::slice::Iter<'a, GlacierSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

impl std::ops::Index<usize> for GlacierSeries {
    type Output = GlacierSnapshot;

    fn index(&self, index: usize) -> &Self::Output {
        &self.snapshots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(rows: usize, cols: usize, value: f32) -> Array2<f32> {
        Array2::from_elem((rows, cols), value)
    }

    #[test]
    fn test_series_rejects_unordered_times() {
        let geometry = GridGeometry::unit();
        let result = GlacierSeries::new(vec![
            GlacierSnapshot::new(2001.0, flat(2, 2, 0.0), flat(2, 2, 0.0), geometry.clone()),
            GlacierSnapshot::new(2000.0, flat(2, 2, 0.0), flat(2, 2, 0.0), geometry),
        ]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_validate_shapes_reports_offending_snapshot() {
        let geometry = GridGeometry::unit();
        let series = GlacierSeries::new(vec![
            GlacierSnapshot::new(0.0, flat(3, 4, 0.0), flat(3, 4, 1.0), geometry.clone()),
            GlacierSnapshot::new(1.0, flat(3, 4, 0.0), flat(4, 3, 1.0), geometry),
        ])
        .unwrap();

        match series.validate_shapes() {
            Err(Error::ShapeMismatch { snapshot, expected, found }) => {
                assert_eq!(snapshot, 1);
                assert_eq!(expected, (3, 4));
                assert_eq!(found, (4, 3));
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_shapes_empty_series() {
        let series = GlacierSeries::new(Vec::new()).unwrap();
        assert!(matches!(series.validate_shapes(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_static_terrain_series_statistics() {
        let series = GlacierSeries::from_static_terrain(
            flat(2, 3, 1000.0),
            GridGeometry::new((0.0, 0.0), (10.0, -10.0), ""),
            vec![(2000.0, flat(2, 3, 50.0)), (2010.0, flat(2, 3, 20.0))],
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.validate_shapes().unwrap(), (2, 3));
        assert!(!series.terrain_varies());
        assert_eq!(series.max_thickness(), Some(50.0));
        assert_eq!(series.terrain_range(), Some((1000.0, 1000.0)));
        assert_eq!(series.times(), vec![2000.0, 2010.0]);

        // 6 cells of 100 m^2 with 50 m of ice
        assert_relative_eq!(series[0].ice_volume(), 30_000.0);
        assert_eq!(series[1].surface_elevation()[[1, 2]], 1020.0);
    }

    #[test]
    fn test_surface_elevation_with_missing_thickness() {
        let mut thickness = flat(2, 2, 40.0);
        thickness[[0, 0]] = f32::NAN;
        thickness[[1, 1]] = f32::INFINITY;
        let snapshot = GlacierSnapshot::new(2000.0, flat(2, 2, 2000.0), thickness, GridGeometry::unit());

        let surface = snapshot.surface_elevation();
        assert_eq!(surface[[0, 0]], 2000.0);
        assert_eq!(surface[[0, 1]], 2040.0);
        assert_eq!(surface[[1, 1]], 2000.0);
    }
}
