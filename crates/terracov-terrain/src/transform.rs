//! Georeferencing of grid cells in Web Mercator (EPSG:3857).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::{Result, TerrainError};

/// Semi-major axis of the WGS84 ellipsoid, used as the sphere radius of Web Mercator.
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator projection in degrees.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Project longitude/latitude (degrees) to Web Mercator meters.
pub fn lon_lat_to_web_mercator(lon: f64, lat: f64) -> Result<(f64, f64)> {
    if !(-180.0..=180.0).contains(&lon) || !(-WEB_MERCATOR_MAX_LAT..=WEB_MERCATOR_MAX_LAT).contains(&lat)
    {
        return Err(TerrainError::InvalidCoordinate { lon, lat });
    }
    let x = WEB_MERCATOR_RADIUS_M * lon.to_radians();
    let y = WEB_MERCATOR_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

/// Inverse of [`lon_lat_to_web_mercator`].
pub fn web_mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WEB_MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / WEB_MERCATOR_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// North-up affine transform between grid cells and projected coordinates:
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for rasters stored north to south.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    /// X coordinate of the upper-left corner (m)
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner (m)
    pub origin_y: f64,
    /// Cell size in X direction (m)
    pub pixel_width: f64,
    /// Cell size in Y direction (m, usually negative)
    pub pixel_height: f64,
}

impl GridTransform {
    /// Create a new transform from the upper-left corner and cell sizes.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        for size in [pixel_width, pixel_height] {
            if !size.is_finite() || size == 0.0 {
                return Err(TerrainError::InvalidCellSize(size));
            }
        }
        Ok(Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        })
    }

    /// North-up transform with square projected cells whose upper-left corner
    /// sits at the given longitude/latitude.
    pub fn from_lon_lat(lon: f64, lat: f64, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(TerrainError::InvalidCellSize(cell_size));
        }
        let (x, y) = lon_lat_to_web_mercator(lon, lat)?;
        Self::new(x, y, cell_size, -cell_size)
    }

    /// Projected coordinates of the center of cell (`row`, `col`).
    pub fn cell_center(&self, row: i64, col: i64) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Fractional (row, col) of a projected coordinate.
    pub fn projected_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.origin_x) / self.pixel_width;
        let row = (y - self.origin_y) / self.pixel_height;
        (row, col)
    }

    /// Cell containing a longitude/latitude. The cell may lie outside any
    /// particular grid extent.
    pub fn lon_lat_to_cell(&self, lon: f64, lat: f64) -> Result<(i64, i64)> {
        let (x, y) = lon_lat_to_web_mercator(lon, lat)?;
        let (row, col) = self.projected_to_cell(x, y);
        Ok((row.floor() as i64, col.floor() as i64))
    }

    /// Longitude/latitude of the center of cell (`row`, `col`).
    pub fn cell_to_lon_lat(&self, row: i64, col: i64) -> (f64, f64) {
        let (x, y) = self.cell_center(row, col);
        web_mercator_to_lon_lat(x, y)
    }

    /// Ground distance spanned by one cell width at `lat` degrees.
    ///
    /// Web Mercator stretches distances by `1 / cos(lat)`.
    pub fn ground_cell_size_m(&self, lat: f64) -> f64 {
        self.pixel_width.abs() * lat.to_radians().cos()
    }
}
