//! Free-space path loss and its inverse.

use std::f64::consts::PI;

use crate::decibels::watts_to_dbm;

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

fn constant_term_db() -> f64 {
    20.0 * (4.0 * PI / SPEED_OF_LIGHT).log10()
}

/// Free-space path loss in dB between isotropic antennas.
pub fn free_space_loss_db(distance_m: f64, frequency_mhz: f64) -> f64 {
    let frequency_hz = frequency_mhz * 1e6;
    20.0 * distance_m.log10() + 20.0 * frequency_hz.log10() + constant_term_db()
}

/// Distance in meters at which free-space loss reaches `loss_db`.
///
/// Exact inverse of [`free_space_loss_db`].
pub fn free_space_distance_m(loss_db: f64, frequency_mhz: f64) -> f64 {
    let frequency_hz = frequency_mhz * 1e6;
    let exponent = (loss_db - 20.0 * frequency_hz.log10() - constant_term_db()) / 20.0;
    10f64.powf(exponent)
}

/// Received power in dBm over a free-space path.
pub fn free_space_received_dbm(distance_m: f64, frequency_mhz: f64, tx_power_w: f64) -> f64 {
    let wavelength = SPEED_OF_LIGHT / (frequency_mhz * 1e6);
    let received_w = tx_power_w * wavelength.powi(2) / (4.0 * PI * distance_m).powi(2);
    watts_to_dbm(received_w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_loss() {
        // 1 km at 1 GHz is about 92.45 dB.
        assert_relative_eq!(free_space_loss_db(1000.0, 1000.0), 92.4478, epsilon = 1e-3);
        // Doubling the distance adds 6 dB.
        let delta = free_space_loss_db(2000.0, 800.0) - free_space_loss_db(1000.0, 800.0);
        assert_relative_eq!(delta, 6.0206, epsilon = 1e-4);
    }

    #[test]
    fn test_distance_inverts_loss() {
        for frequency in [50.0, 433.0, 800.0, 2400.0, 10_000.0] {
            for distance in [1.0, 25.0, 1000.0, 37_500.0, 2.0e6] {
                let loss = free_space_loss_db(distance, frequency);
                assert_relative_eq!(
                    free_space_distance_m(loss, frequency),
                    distance,
                    max_relative = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_received_power_matches_loss() {
        let tx_w = 2.0;
        let received = free_space_received_dbm(5000.0, 800.0, tx_w);
        let expected = watts_to_dbm(tx_w) - free_space_loss_db(5000.0, 800.0);
        assert_relative_eq!(received, expected, epsilon = 1e-9);
    }
}
