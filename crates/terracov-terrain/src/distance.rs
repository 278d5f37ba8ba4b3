//! Great-circle distance on a spherical earth.

/// Mean earth radius used for path distances (m).
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// Distance in meters between two longitude/latitude points (degrees),
/// using the haversine formula.
pub fn great_circle_distance_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_great_circle_distance() {
        // Seattle to Portland is approximately 233 km
        let dist = great_circle_distance_m(-122.3321, 47.6062, -122.6784, 45.5152);
        assert!((dist - 233_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_zero_and_symmetric() {
        assert_eq!(great_circle_distance_m(-5.4, 56.4, -5.4, 56.4), 0.0);
        let ab = great_circle_distance_m(-5.39, 56.36, -5.42, 56.39);
        let ba = great_circle_distance_m(-5.42, 56.39, -5.39, 56.36);
        assert!((ab - ba).abs() < 1e-6);
        assert!(ab > 3_000.0 && ab < 4_000.0);
    }
}
