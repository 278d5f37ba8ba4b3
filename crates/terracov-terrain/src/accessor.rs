//! Read-only query interface over a terrain grid.

use crate::{Result, TerrainError};

/// One terrain cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TerrainSample {
    /// Elevation above sea level (m).
    pub elevation: f32,
    /// Cell is open water.
    pub water: bool,
    /// A road crosses the cell.
    pub road: bool,
}

/// Terrain queries needed to sample profiles and georeference cells.
///
/// Grid coordinates are `(y, x)` = (row, column), row 0 at the north edge.
/// Indices are signed so callers can probe cells outside the extent; such
/// cells fail with [`TerrainError::OutOfBounds`].
///
/// Implementations are shared read-only across scan workers.
pub trait TerrainAccessor: Sync {
    /// Grid size as `(height, width)` in cells.
    fn extent(&self) -> (usize, usize);

    /// The cell at (`y`, `x`), or `None` outside the extent.
    fn sample(&self, y: i64, x: i64) -> Option<TerrainSample>;

    /// Cell containing a longitude/latitude. The cell may lie outside the extent.
    fn coords_to_grid(&self, lon: f64, lat: f64) -> Result<(i64, i64)>;

    /// Longitude/latitude of the center of cell (`y`, `x`).
    fn grid_to_coords(&self, y: i64, x: i64) -> Result<(f64, f64)>;

    /// Approximate ground distance between adjacent cell centers (m).
    fn cell_size_m(&self) -> f64;

    /// True when (`y`, `x`) lies inside the extent.
    fn exists(&self, y: i64, x: i64) -> bool {
        let (height, width) = self.extent();
        y >= 0 && x >= 0 && (y as u64) < height as u64 && (x as u64) < width as u64
    }

    /// Elevation of cell (`y`, `x`) in meters.
    fn elevation_at(&self, y: i64, x: i64) -> Result<f64> {
        self.sample(y, x)
            .map(|s| f64::from(s.elevation))
            .ok_or_else(|| self.out_of_bounds(y, x))
    }

    /// True when cell (`y`, `x`) is open water.
    fn is_water(&self, y: i64, x: i64) -> Result<bool> {
        self.sample(y, x)
            .map(|s| s.water)
            .ok_or_else(|| self.out_of_bounds(y, x))
    }

    /// True when a road crosses cell (`y`, `x`).
    fn is_road(&self, y: i64, x: i64) -> Result<bool> {
        self.sample(y, x)
            .map(|s| s.road)
            .ok_or_else(|| self.out_of_bounds(y, x))
    }

    /// The error reported for a cell outside the extent.
    fn out_of_bounds(&self, y: i64, x: i64) -> TerrainError {
        let (height, width) = self.extent();
        TerrainError::OutOfBounds {
            y,
            x,
            height,
            width,
        }
    }
}
