//! In-memory terrain grid.

use crate::transform::GridTransform;
use crate::{Result, TerrainAccessor, TerrainError, TerrainSample};

/// A rectangular grid of terrain samples in row-major order (north to south,
/// west to east), georeferenced by a Web Mercator transform.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    height: usize,
    width: usize,
    samples: Vec<TerrainSample>,
    transform: GridTransform,
}

impl TerrainGrid {
    /// Create a grid of sea-level land cells.
    pub fn new(height: usize, width: usize, transform: GridTransform) -> Self {
        Self {
            height,
            width,
            samples: vec![TerrainSample::default(); height * width],
            transform,
        }
    }

    /// Create a grid from raw elevations in row-major order.
    ///
    /// Cells equal to `water_value`, or not a number, become water cells at
    /// elevation zero.
    pub fn from_elevations(
        height: usize,
        width: usize,
        elevations: &[f32],
        transform: GridTransform,
        water_value: Option<f32>,
    ) -> Result<Self> {
        let expected = height * width;
        if elevations.len() != expected {
            return Err(TerrainError::DimensionMismatch {
                expected,
                actual: elevations.len(),
            });
        }

        let samples = elevations
            .iter()
            .map(|&value| {
                let water = value.is_nan() || water_value == Some(value);
                TerrainSample {
                    elevation: if water { 0.0 } else { value },
                    water,
                    road: false,
                }
            })
            .collect();

        Ok(Self {
            height,
            width,
            samples,
            transform,
        })
    }

    /// The grid's georeferencing.
    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    fn index(&self, y: i64, x: i64) -> Result<usize> {
        if self.exists(y, x) {
            Ok(y as usize * self.width + x as usize)
        } else {
            Err(self.out_of_bounds(y, x))
        }
    }

    /// Replace the cell at (`y`, `x`).
    pub fn set(&mut self, y: i64, x: i64, sample: TerrainSample) -> Result<()> {
        let index = self.index(y, x)?;
        self.samples[index] = sample;
        Ok(())
    }

    /// Set the elevation of cell (`y`, `x`).
    pub fn set_elevation(&mut self, y: i64, x: i64, elevation: f32) -> Result<()> {
        let index = self.index(y, x)?;
        self.samples[index].elevation = elevation;
        Ok(())
    }

    /// Flag cell (`y`, `x`) as crossed by a road.
    pub fn set_road(&mut self, y: i64, x: i64) -> Result<()> {
        let index = self.index(y, x)?;
        self.samples[index].road = true;
        Ok(())
    }

    /// Flag every cell along a road polyline of longitude/latitude vertices.
    ///
    /// Consecutive vertices are joined by stepping one cell at a time. Cells
    /// outside the grid are skipped. Returns the number of cells flagged.
    pub fn mark_road_polyline(&mut self, vertices: &[(f64, f64)]) -> Result<usize> {
        let mut cells: Vec<(i64, i64)> = Vec::new();
        for &(lon, lat) in vertices {
            let cell = self.transform.lon_lat_to_cell(lon, lat)?;
            if let Some(&(last_y, last_x)) = cells.last() {
                let diff_y = (cell.0 - last_y) as f64;
                let diff_x = (cell.1 - last_x) as f64;
                let steps = (diff_y.hypot(diff_x)) as i64;
                for n in 1..steps {
                    let waypoint = (
                        last_y + (diff_y * n as f64 / steps as f64).floor() as i64,
                        last_x + (diff_x * n as f64 / steps as f64).floor() as i64,
                    );
                    if !cells.contains(&waypoint) {
                        cells.push(waypoint);
                    }
                }
            }
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }

        let mut marked = 0;
        for (y, x) in cells {
            if self.set_road(y, x).is_ok() {
                marked += 1;
            }
        }
        Ok(marked)
    }
}

impl TerrainAccessor for TerrainGrid {
    fn extent(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    fn sample(&self, y: i64, x: i64) -> Option<TerrainSample> {
        self.index(y, x).ok().map(|index| self.samples[index])
    }

    fn coords_to_grid(&self, lon: f64, lat: f64) -> Result<(i64, i64)> {
        self.transform.lon_lat_to_cell(lon, lat)
    }

    fn grid_to_coords(&self, y: i64, x: i64) -> Result<(f64, f64)> {
        if !self.exists(y, x) {
            return Err(self.out_of_bounds(y, x));
        }
        Ok(self.transform.cell_to_lon_lat(y, x))
    }

    fn cell_size_m(&self) -> f64 {
        let center_row = self.height as i64 / 2;
        let center_col = self.width as i64 / 2;
        let (_, lat) = self.transform.cell_to_lon_lat(center_row, center_col);
        self.transform.ground_cell_size_m(lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(height: usize, width: usize) -> TerrainGrid {
        let transform = GridTransform::from_lon_lat(-5.5, 56.5, 25.0).unwrap();
        TerrainGrid::new(height, width, transform)
    }

    #[test]
    fn test_extent_and_bounds() {
        let grid = grid(4, 6);
        assert_eq!(grid.extent(), (4, 6));
        assert!(grid.exists(0, 0));
        assert!(grid.exists(3, 5));
        assert!(!grid.exists(4, 0));
        assert!(!grid.exists(0, 6));
        assert!(!grid.exists(-1, 2));

        let err = grid.elevation_at(4, 0).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert!(grid.grid_to_coords(-1, 0).is_err());
    }

    #[test]
    fn test_water_sentinel() {
        let transform = GridTransform::from_lon_lat(-5.5, 56.5, 25.0).unwrap();
        let elevations = [12.0, -9999.0, f32::NAN, 40.0];
        let grid = TerrainGrid::from_elevations(2, 2, &elevations, transform, Some(-9999.0)).unwrap();

        assert_eq!(grid.elevation_at(0, 0).unwrap(), 12.0);
        assert!(!grid.is_water(0, 0).unwrap());
        assert!(grid.is_water(0, 1).unwrap());
        assert_eq!(grid.elevation_at(0, 1).unwrap(), 0.0);
        assert!(grid.is_water(1, 0).unwrap());
        assert_eq!(grid.elevation_at(1, 1).unwrap(), 40.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let transform = GridTransform::from_lon_lat(0.0, 0.0, 25.0).unwrap();
        let err = TerrainGrid::from_elevations(2, 2, &[1.0; 3], transform, None).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_coordinate_roundtrip() {
        let grid = grid(50, 50);
        let (lon, lat) = grid.grid_to_coords(17, 33).unwrap();
        assert_eq!(grid.coords_to_grid(lon, lat).unwrap(), (17, 33));
    }

    #[test]
    fn test_cell_size_is_ground_distance() {
        let grid = grid(10, 10);
        // 25 m projected cells at ~56.5 degrees north.
        assert_relative_eq!(grid.cell_size_m(), 25.0 * 56.5f64.to_radians().cos(), epsilon = 0.01);
    }

    #[test]
    fn test_road_polyline() {
        let mut grid = grid(20, 20);
        let start = grid.grid_to_coords(2, 2).unwrap();
        let end = grid.grid_to_coords(2, 12).unwrap();
        let marked = grid.mark_road_polyline(&[start, end]).unwrap();

        assert_eq!(marked, 11);
        for x in 2..=12 {
            assert!(grid.is_road(2, x).unwrap());
        }
        assert!(!grid.is_road(3, 5).unwrap());
    }

    #[test]
    fn test_road_polyline_clipped() {
        let mut grid = grid(5, 5);
        let start = grid.transform().cell_to_lon_lat(2, 2);
        let end = grid.transform().cell_to_lon_lat(2, 9);
        let marked = grid.mark_road_polyline(&[start, end]).unwrap();
        assert_eq!(marked, 3);
    }
}
