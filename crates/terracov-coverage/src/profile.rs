//! Elevation profiles between two grid cells.

use terracov_itm::TerrainProfile;
use terracov_terrain::{great_circle_distance_m, TerrainAccessor};

use crate::Result;

/// Target spacing between profile samples (m).
pub const PROFILE_STEP_M: f64 = 25.0;

/// Number of profile samples for a path of `distance_m` meters.
///
/// One sample per [`PROFILE_STEP_M`], capped by `max_samples` and by the
/// model limit of [`TerrainProfile::MAX_SAMPLES`], and never fewer than two.
pub fn sample_count(distance_m: f64, max_samples: usize) -> usize {
    let cap = max_samples.min(TerrainProfile::MAX_SAMPLES);
    let wanted = (distance_m / PROFILE_STEP_M).ceil();
    let n = if wanted.is_finite() && wanted > 0.0 {
        // Saturating float to int conversion keeps huge distances at the cap.
        (wanted as usize).min(cap)
    } else {
        0
    };
    n.max(2)
}

/// Extracts terrain profiles along straight grid lines.
#[derive(Debug, Clone, Copy)]
pub struct ProfileSampler<'a, T: TerrainAccessor + ?Sized> {
    terrain: &'a T,
    max_samples: usize,
}

impl<'a, T: TerrainAccessor + ?Sized> ProfileSampler<'a, T> {
    /// Sampler over `terrain` producing at most `max_samples` samples per profile.
    pub fn new(terrain: &'a T, max_samples: usize) -> Self {
        Self {
            terrain,
            max_samples,
        }
    }

    /// Grid positions sampled between `tx` and `rx`, ordered from the
    /// receiver toward the transmitter.
    ///
    /// Position `k` lies `k / n` of the way from the receiver, so the receiver
    /// cell is sampled and the transmitter cell is not. Fractional indices are
    /// truncated toward zero.
    pub fn grid_positions(&self, tx: (i64, i64), rx: (i64, i64), n: usize) -> Vec<(i64, i64)> {
        let n = n.max(2);
        let step_y = (tx.0 - rx.0) as f64 / n as f64;
        let step_x = (tx.1 - rx.1) as f64 / n as f64;
        (0..n)
            .map(|k| {
                let k = k as f64;
                (
                    (rx.0 as f64 + step_y * k).trunc() as i64,
                    (rx.1 as f64 + step_x * k).trunc() as i64,
                )
            })
            .collect()
    }

    /// Profile from the transmitter cell `tx` to the receiver cell `rx`.
    ///
    /// Samples run from the transmitter end to the receiver cell. Fails with
    /// [`CoverageError::OutOfBounds`](crate::CoverageError::OutOfBounds) when
    /// either end, or any sampled cell, has no terrain.
    pub fn profile(&self, tx: (i64, i64), rx: (i64, i64)) -> Result<TerrainProfile> {
        let (tx_lon, tx_lat) = self.terrain.grid_to_coords(tx.0, tx.1)?;
        let (rx_lon, rx_lat) = self.terrain.grid_to_coords(rx.0, rx.1)?;
        let distance_m = great_circle_distance_m(tx_lon, tx_lat, rx_lon, rx_lat);
        let n = sample_count(distance_m, self.max_samples);

        let mut elevations = Vec::with_capacity(n);
        for (y, x) in self.grid_positions(tx, rx, n).into_iter().rev() {
            elevations.push(self.terrain.elevation_at(y, x)?);
        }

        Ok(TerrainProfile::new(elevations, distance_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoverageError;
    use terracov_terrain::{GridTransform, TerrainAccessor, TerrainGrid};

    fn terrain() -> TerrainGrid {
        let transform = GridTransform::from_lon_lat(-5.5, 56.5, 60.0).unwrap();
        let mut grid = TerrainGrid::new(40, 40, transform);
        for y in 0..40 {
            for x in 0..40 {
                grid.set_elevation(y, x, (y * 100 + x) as f32).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_sample_count_bounds() {
        assert_eq!(sample_count(0.0, 600), 2);
        assert_eq!(sample_count(10.0, 600), 2);
        assert_eq!(sample_count(1_000.0, 600), 40);
        assert_eq!(sample_count(1_001.0, 600), 41);
        assert_eq!(sample_count(100_000.0, 600), 600);
        assert_eq!(sample_count(100_000.0, 5_000), 600);
        assert_eq!(sample_count(1_000.0, 30), 30);
        assert_eq!(sample_count(1_000.0, 0), 2);
        assert_eq!(sample_count(f64::NAN, 600), 2);
    }

    #[test]
    fn test_sample_count_property() {
        for max_samples in [0, 1, 2, 10, 300, 600, 1_000] {
            for step in 0..400 {
                let distance = step as f64 * 61.7;
                let n = sample_count(distance, max_samples);
                let cap = max_samples.min(600);
                assert!(n >= 2);
                assert!(n <= cap.max(2));
                let wanted = (distance / PROFILE_STEP_M).ceil() as usize;
                if (2..=cap).contains(&wanted) {
                    assert_eq!(n, wanted);
                }
            }
        }
    }

    #[test]
    fn test_grid_positions_step_from_receiver() {
        let terrain = terrain();
        let sampler = ProfileSampler::new(&terrain, 600);

        let positions = sampler.grid_positions((0, 0), (0, 10), 4);
        assert_eq!(positions, vec![(0, 10), (0, 7), (0, 5), (0, 2)]);

        let positions = sampler.grid_positions((2, 3), (12, 23), 10);
        assert_eq!(positions.len(), 10);
        assert_eq!(positions[0], (12, 23));
        assert_eq!(positions[5], (7, 13));
        assert_eq!(positions[9], (3, 5));
    }

    #[test]
    fn test_grid_positions_for_adjacent_cells() {
        let terrain = terrain();
        let sampler = ProfileSampler::new(&terrain, 600);
        // Halfway truncates onto the transmitter column.
        let positions = sampler.grid_positions((4, 4), (4, 5), 2);
        assert_eq!(positions, vec![(4, 5), (4, 4)]);
    }

    #[test]
    fn test_profile_runs_from_transmitter() {
        let terrain = terrain();
        let sampler = ProfileSampler::new(&terrain, 600);
        let profile = sampler.profile((5, 5), (5, 30)).unwrap();

        let n = sample_count(profile.distance_m(), 600);
        assert_eq!(profile.len(), n);

        let positions = sampler.grid_positions((5, 5), (5, 30), n);
        let expected: Vec<f64> = positions
            .iter()
            .rev()
            .map(|&(y, x)| terrain.elevation_at(y, x).unwrap())
            .collect();
        assert_eq!(profile.elevations(), expected.as_slice());

        let elevations = profile.elevations();
        assert_eq!(elevations[elevations.len() - 1], 530.0);
        assert!(elevations.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_profile_respects_max_samples() {
        let terrain = terrain();
        let sampler = ProfileSampler::new(&terrain, 5);
        let profile = sampler.profile((0, 0), (39, 39)).unwrap();
        assert_eq!(profile.len(), 5);
    }

    #[test]
    fn test_profile_is_deterministic() {
        let terrain = terrain();
        let sampler = ProfileSampler::new(&terrain, 600);
        let a = sampler.profile((3, 4), (31, 17)).unwrap();
        let b = sampler.profile((3, 4), (31, 17)).unwrap();
        assert_eq!(a.elevations(), b.elevations());
        assert_eq!(a.distance_m(), b.distance_m());
    }

    #[test]
    fn test_profile_out_of_bounds() {
        let terrain = terrain();
        let sampler = ProfileSampler::new(&terrain, 600);
        let err = sampler.profile((5, 5), (5, 40)).unwrap_err();
        assert!(matches!(err, CoverageError::OutOfBounds { y: 5, x: 40 }));
    }
}
