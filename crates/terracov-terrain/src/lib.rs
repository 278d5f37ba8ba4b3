//! # terracov-terrain
//!
//! Terrain grids for radio coverage estimation.
//!
//! A terrain grid is a raster of cells, each carrying an elevation and flags
//! for open water and roads. Grids are georeferenced in Web Mercator
//! (EPSG:3857) with row 0 at the north edge.
//!
//! Consumers read terrain through the [`TerrainAccessor`] trait, so coverage
//! code works the same against an in-memory [`TerrainGrid`] or any other
//! source.
//!
//! ## Example
//!
//! ```
//! use terracov_terrain::{GridTransform, TerrainAccessor, TerrainGrid};
//!
//! let transform = GridTransform::from_lon_lat(-5.5, 56.5, 25.0)?;
//! let mut grid = TerrainGrid::new(100, 100, transform);
//! grid.set_elevation(10, 20, 312.0)?;
//!
//! let (lon, lat) = grid.grid_to_coords(10, 20)?;
//! assert_eq!(grid.coords_to_grid(lon, lat)?, (10, 20));
//! assert_eq!(grid.elevation_at(10, 20)?, 312.0);
//! # Ok::<(), terracov_terrain::TerrainError>(())
//! ```
//!
//! Rasters are loaded with [`load_geotiff`]; no-data cells become water.

mod accessor;
mod distance;
mod error;
mod geotiff;
mod grid;
mod transform;

pub use accessor::{TerrainAccessor, TerrainSample};
pub use distance::{great_circle_distance_m, EARTH_RADIUS_M};
pub use error::TerrainError;
pub use geotiff::{load_geotiff, load_geotiff_with_water_value, read_geotiff};
pub use grid::TerrainGrid;
pub use transform::{
    lon_lat_to_web_mercator, web_mercator_to_lon_lat, GridTransform, WEB_MERCATOR_MAX_LAT,
    WEB_MERCATOR_RADIUS_M,
};

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, TerrainError>;
