//! Decibel and dBm conversions.

/// Power in watts to dBm.
pub fn watts_to_dbm(watts: f64) -> f64 {
    10.0 * (watts * 1000.0).log10()
}

/// Power in dBm to watts.
pub fn dbm_to_watts(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0) / 1000.0
}

/// Power ratio to decibels.
pub fn to_db(ratio: f64) -> f64 {
    10.0 * ratio.log10()
}

/// Decibels to power ratio.
pub fn from_db(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dbm() {
        assert_relative_eq!(watts_to_dbm(1.0), 30.0);
        assert_relative_eq!(watts_to_dbm(0.001), 0.0, epsilon = 1e-12);
        assert_relative_eq!(dbm_to_watts(20.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(dbm_to_watts(watts_to_dbm(0.25)), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_db_ratio() {
        assert_relative_eq!(to_db(100.0), 20.0);
        assert_relative_eq!(from_db(3.0), 1.9952623149688795, epsilon = 1e-12);
        assert_relative_eq!(from_db(to_db(42.0)), 42.0, epsilon = 1e-9);
    }
}
