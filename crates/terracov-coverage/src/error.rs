//! Error types for coverage scans.

use terracov_itm::ItmError;
use terracov_terrain::TerrainError;
use thiserror::Error;

/// Errors that can occur while preparing or running a coverage scan.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// A coordinate or derived grid index has no backing terrain cell.
    #[error("Grid cell ({y}, {x}) has no backing terrain")]
    OutOfBounds {
        /// Requested row.
        y: i64,
        /// Requested column.
        x: i64,
    },

    /// A numeric precondition of the propagation model does not hold.
    #[error("Outside the model domain: {0}")]
    InvalidDomain(String),

    /// Parameters outside their documented ranges.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Terrain access failed for a reason other than bounds.
    #[error("Terrain error: {0}")]
    Terrain(TerrainError),

    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoverageError {
    /// True when a cell or coordinate had no backing terrain.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, CoverageError::OutOfBounds { .. })
    }

    /// True for errors raised before any scanning, from invalid parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CoverageError::Configuration(_) | CoverageError::Yaml(_))
    }
}

impl From<TerrainError> for CoverageError {
    fn from(err: TerrainError) -> Self {
        match err {
            TerrainError::OutOfBounds { y, x, .. } => CoverageError::OutOfBounds { y, x },
            other => CoverageError::Terrain(other),
        }
    }
}

impl From<ItmError> for CoverageError {
    fn from(err: ItmError) -> Self {
        match err {
            ItmError::InvalidDomain(reason) => CoverageError::InvalidDomain(reason),
            other => CoverageError::Configuration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_bounds_map_to_out_of_bounds() {
        let err: CoverageError = TerrainError::OutOfBounds {
            y: -1,
            x: 3,
            height: 10,
            width: 10,
        }
        .into();
        assert!(err.is_out_of_bounds());
        assert!(matches!(err, CoverageError::OutOfBounds { y: -1, x: 3 }));

        let err: CoverageError = TerrainError::InvalidCoordinate { lon: 0.0, lat: 89.0 }.into();
        assert!(matches!(err, CoverageError::Terrain(_)));
    }

    #[test]
    fn test_itm_errors_split() {
        let err: CoverageError = ItmError::TxHeightOutOfRange(-1.0).into();
        assert!(err.is_configuration());

        let err: CoverageError = ItmError::InvalidDomain("short profile".into()).into();
        assert!(!err.is_configuration());
        assert!(matches!(err, CoverageError::InvalidDomain(_)));
    }
}
