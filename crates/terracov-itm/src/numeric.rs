//! Small numeric helpers shared by the model stages.

/// Positive difference: `x - y` when `x > y`, otherwise zero.
#[inline]
pub(crate) fn dim(x: f64, y: f64) -> f64 {
    if x > y {
        x - y
    } else {
        0.0
    }
}

/// Inverse of the standard normal complementary distribution.
///
/// Returns `z` such that the probability of a standard normal variate
/// exceeding `z` is `q`. Rational approximation with absolute error below
/// 4.5e-4 (Abramowitz & Stegun 26.2.23).
pub fn qerfi(q: f64) -> f64 {
    const C0: f64 = 2.515516698;
    const C1: f64 = 0.802853;
    const C2: f64 = 0.010328;
    const D1: f64 = 1.432788;
    const D2: f64 = 0.189269;
    const D3: f64 = 0.001308;

    let x = 0.5 - q;
    let t = (0.5 - x.abs()).max(1e-6);
    let t = (-2.0 * t.ln()).sqrt();
    let v = t - ((C2 * t + C1) * t + C0) / (((D3 * t + D2) * t + D1) * t + 1.0);
    if x < 0.0 {
        -v
    } else {
        v
    }
}

/// Value at 0-based rank `k` when `values` is ordered largest first.
///
/// Reorders `values` in place. Returns `None` when `k` is out of range.
pub fn kth_largest(values: &mut [f64], k: usize) -> Option<f64> {
    if k >= values.len() {
        return None;
    }
    let (_, kth, _) = values.select_nth_unstable_by(k, |a, b| b.total_cmp(a));
    Some(*kth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use statrs::distribution::{ContinuousCDF, Normal};

    #[test]
    fn test_dim() {
        assert_eq!(dim(5.0, 3.0), 2.0);
        assert_eq!(dim(3.0, 5.0), 0.0);
        assert_eq!(dim(-1.0, -1.0), 0.0);
    }

    #[test]
    fn test_qerfi_matches_normal_quantile() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        for pct in [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0] {
            let q = pct / 100.0;
            let expected = normal.inverse_cdf(1.0 - q);
            assert_abs_diff_eq!(qerfi(q), expected, epsilon = 4.5e-4);
        }
    }

    #[test]
    fn test_qerfi_symmetry() {
        assert_abs_diff_eq!(qerfi(0.5), 0.0, epsilon = 4.5e-4);
        assert_abs_diff_eq!(qerfi(0.1), -qerfi(0.9), epsilon = 1e-12);
        assert!(qerfi(0.1) > 1.2);
    }

    #[test]
    fn test_kth_largest() {
        let mut values = [3.0, 9.0, 1.0, 7.0, 5.0];
        assert_eq!(kth_largest(&mut values, 0), Some(9.0));
        assert_eq!(kth_largest(&mut values, 1), Some(7.0));
        assert_eq!(kth_largest(&mut values, 4), Some(1.0));
        assert_eq!(kth_largest(&mut values, 5), None);

        let mut ties = [2.0, 2.0, 1.0];
        assert_eq!(kth_largest(&mut ties, 1), Some(2.0));
    }
}
