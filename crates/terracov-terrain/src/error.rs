//! Error types for the terrain crate.

use thiserror::Error;

/// Errors that can occur when working with terrain data.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing required tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// Grid index has no backing terrain cell.
    #[error("Grid cell ({y}, {x}) is outside the terrain extent ({height} x {width})")]
    OutOfBounds {
        /// Requested row.
        y: i64,
        /// Requested column.
        x: i64,
        /// Terrain height in cells.
        height: usize,
        /// Terrain width in cells.
        width: usize,
    },

    /// Longitude/latitude cannot be projected.
    #[error("Coordinate ({lon}, {lat}) cannot be projected to Web Mercator")]
    InvalidCoordinate {
        /// Requested longitude.
        lon: f64,
        /// Requested latitude.
        lat: f64,
    },

    /// Elevation buffer does not match the grid dimensions.
    #[error("Expected {expected} elevation samples, got {actual}")]
    DimensionMismatch {
        /// Cells in the grid.
        expected: usize,
        /// Samples supplied.
        actual: usize,
    },

    /// Cell size is zero, negative or not finite.
    #[error("Invalid cell size {0}")]
    InvalidCellSize(f64),
}

impl TerrainError {
    /// True when the error reports a cell or coordinate without terrain.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, TerrainError::OutOfBounds { .. })
    }
}
