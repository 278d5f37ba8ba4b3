//! Link budget and search radius.

use serde::{Deserialize, Serialize};
use terracov_itm::free_space_distance_m;

use crate::{CoverageError, Result};

/// Power budget of a transmitter/receiver pair.
///
/// The defaults allow 100 dB of basic transmission loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkBudget {
    /// Transmit power (dBm).
    pub tx_power_dbm: f64,
    /// Transmit antenna gain (dBi).
    pub tx_gain_dbi: f64,
    /// Receive antenna gain (dBi).
    pub rx_gain_dbi: f64,
    /// Receiver noise floor (dBm).
    pub noise_floor_dbm: f64,
    /// Minimum signal-to-noise ratio for a usable link (dB).
    pub required_snr_db: f64,
}

impl Default for LinkBudget {
    fn default() -> Self {
        Self {
            tx_power_dbm: 20.0,
            tx_gain_dbi: 0.0,
            rx_gain_dbi: 0.0,
            noise_floor_dbm: -100.0,
            required_snr_db: 20.0,
        }
    }
}

impl LinkBudget {
    /// Largest basic transmission loss the link tolerates (dB).
    pub fn max_attenuation_db(&self) -> f64 {
        self.tx_power_dbm + self.tx_gain_dbi + self.rx_gain_dbi
            - self.noise_floor_dbm
            - self.required_snr_db
    }

    /// Reject non-finite terms.
    pub fn validate(&self) -> Result<()> {
        let terms = [
            ("tx_power_dbm", self.tx_power_dbm),
            ("tx_gain_dbi", self.tx_gain_dbi),
            ("rx_gain_dbi", self.rx_gain_dbi),
            ("noise_floor_dbm", self.noise_floor_dbm),
            ("required_snr_db", self.required_snr_db),
        ];
        for (name, value) in terms {
            if !value.is_finite() {
                return Err(CoverageError::Configuration(format!(
                    "link budget {name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Upper bound on the coverage radius (m) for a loss budget.
///
/// Terrain never attenuates less than free space, so the free-space distance
/// at `max_attenuation_db` bounds every covered cell.
pub fn search_radius_m(max_attenuation_db: f64, frequency_mhz: f64) -> f64 {
    free_space_distance_m(max_attenuation_db, frequency_mhz)
}

/// Search radius in grid cells, rounded, and clipped to `max_cells`.
pub fn search_radius_cells(radius_m: f64, cell_size_m: f64, max_cells: usize) -> usize {
    let cells = (radius_m / cell_size_m).round();
    if cells.is_finite() && cells > 0.0 {
        (cells as usize).min(max_cells)
    } else if cells.is_infinite() && cells > 0.0 {
        max_cells
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use terracov_itm::free_space_loss_db;

    #[test]
    fn test_max_attenuation() {
        assert_relative_eq!(LinkBudget::default().max_attenuation_db(), 100.0);

        let budget = LinkBudget {
            tx_power_dbm: 43.0,
            tx_gain_dbi: 15.0,
            rx_gain_dbi: 2.0,
            noise_floor_dbm: -104.0,
            required_snr_db: 9.0,
        };
        assert_relative_eq!(budget.max_attenuation_db(), 155.0);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let budget = LinkBudget {
            noise_floor_dbm: f64::NAN,
            ..Default::default()
        };
        assert!(budget.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_search_radius_inverts_free_space() {
        let radius = search_radius_m(100.0, 800.0);
        assert_relative_eq!(free_space_loss_db(radius, 800.0), 100.0, epsilon = 1e-9);
        // 100 dB at 800 MHz is about 3 km.
        assert!(radius > 2_900.0 && radius < 3_000.0);
    }

    #[test]
    fn test_search_radius_cells() {
        assert_eq!(search_radius_cells(1_000.0, 25.0, 1_000), 40);
        assert_eq!(search_radius_cells(1_012.0, 25.0, 1_000), 40);
        assert_eq!(search_radius_cells(1_013.0, 25.0, 1_000), 41);
        assert_eq!(search_radius_cells(1_000.0, 25.0, 30), 30);
        assert_eq!(search_radius_cells(0.0, 25.0, 30), 0);
        assert_eq!(search_radius_cells(f64::INFINITY, 25.0, 30), 30);
    }
}
