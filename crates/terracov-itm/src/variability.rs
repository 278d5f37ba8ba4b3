//! Statistical corrections to the reference attenuation for time, location
//! and situation variability.

use crate::prep::{Environment, PathGeometry};
use crate::{ItmWarnings, PropagationParameters, WarningLevel};

const THIRD: f64 = 1.0 / 3.0;

// Climate-dependent curve coefficients, one entry per climate in model order.
const BV1: [f64; 7] = [-9.67, -0.62, 1.26, -9.21, -0.62, -0.39, 3.15];
const BV2: [f64; 7] = [12.7, 9.19, 15.5, 9.05, 9.19, 2.86, 857.9];
const XV1: [f64; 7] = [144.9e3, 228.9e3, 262.6e3, 84.1e3, 228.9e3, 141.7e3, 2222.0e3];
const XV2: [f64; 7] = [190.3e3, 205.2e3, 185.2e3, 101.1e3, 205.2e3, 315.9e3, 164.8e3];
const XV3: [f64; 7] = [133.8e3, 143.6e3, 99.8e3, 98.6e3, 143.6e3, 167.4e3, 116.3e3];
const BSM1: [f64; 7] = [2.13, 2.66, 6.11, 1.98, 2.68, 6.86, 8.51];
const BSM2: [f64; 7] = [159.5, 7.67, 6.65, 13.11, 7.16, 10.38, 169.8];
const XSM1: [f64; 7] = [762.2e3, 100.4e3, 138.2e3, 139.1e3, 93.7e3, 187.8e3, 609.8e3];
const XSM2: [f64; 7] = [123.6e3, 172.5e3, 242.2e3, 132.7e3, 186.8e3, 169.6e3, 119.9e3];
const XSM3: [f64; 7] = [94.5e3, 136.4e3, 178.6e3, 193.5e3, 133.5e3, 108.9e3, 106.6e3];
const BSP1: [f64; 7] = [2.11, 6.87, 10.08, 3.68, 4.75, 8.58, 8.43];
const BSP2: [f64; 7] = [102.3, 15.53, 9.60, 159.3, 8.12, 13.97, 8.19];
const XSP1: [f64; 7] = [636.9e3, 138.7e3, 165.3e3, 464.4e3, 93.2e3, 216.0e3, 136.2e3];
const XSP2: [f64; 7] = [134.8e3, 143.7e3, 225.7e3, 93.1e3, 135.9e3, 152.0e3, 188.5e3];
const XSP3: [f64; 7] = [95.6e3, 98.6e3, 129.7e3, 94.2e3, 113.4e3, 122.7e3, 122.9e3];
const BSD1: [f64; 7] = [1.224, 0.801, 1.380, 1.000, 1.224, 1.518, 1.518];
const BZD1: [f64; 7] = [1.282, 2.161, 1.282, 20.0, 1.282, 1.282, 1.282];
const BFM1: [f64; 7] = [1.0, 1.0, 1.0, 1.0, 0.92, 1.0, 1.0];
const BFM2: [f64; 7] = [0.0, 0.0, 0.0, 0.0, 0.25, 0.0, 0.0];
const BFM3: [f64; 7] = [0.0, 0.0, 0.0, 0.0, 1.77, 0.0, 0.0];
const BFP1: [f64; 7] = [1.0, 0.93, 1.0, 0.93, 0.93, 1.0, 1.0];
const BFP2: [f64; 7] = [0.0, 0.31, 0.0, 0.19, 0.31, 0.0, 0.0];
const BFP3: [f64; 7] = [0.0, 2.00, 0.0, 1.79, 2.00, 0.0, 0.0];

/// Time variability scaling for the situation term.
const RT: f64 = 7.8;
/// Location variability scaling for the situation term.
const RL: f64 = 24.0;

fn curve(c1: f64, c2: f64, x1: f64, x2: f64, x3: f64, de: f64) -> f64 {
    let t1 = ((de - x2) / x3).powi(2);
    let t2 = (de / x1).powi(2);
    (c1 + c2 / (1.0 + t1)) * t2 / (1.0 + t2)
}

/// Distance-dependent standard deviations for one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Variability {
    /// Base mode of variability, 0 to 3.
    kdv: i32,
    /// Median correction (dB).
    pub vmd: f64,
    sgtm: f64,
    sgtp: f64,
    sgtd: f64,
    tgtd: f64,
    zd: f64,
    sgl: f64,
    vs0: f64,
}

impl Variability {
    pub fn new(params: &PropagationParameters, geom: &PathGeometry, env: &Environment) -> Self {
        let k = params.climate.index();
        let (kdv, no_location, no_situation) = params.mode_of_variability.decompose();

        let q = (0.133 * env.wn).ln();
        let gm = BFM1[k] + BFM2[k] / ((BFM3[k] * q).powi(2) + 1.0);
        let gp = BFP1[k] + BFP2[k] / ((BFP3[k] * q).powi(2) + 1.0);

        let dexa = (18e6 * geom.he[0]).sqrt()
            + (18e6 * geom.he[1]).sqrt()
            + (575.7e12 / env.wn).powf(THIRD);
        let de = if geom.dist < dexa {
            130e3 * geom.dist / dexa
        } else {
            130e3 + geom.dist - dexa
        };

        let vmd = curve(BV1[k], BV2[k], XV1[k], XV2[k], XV3[k], de);
        let sgtm = curve(BSM1[k], BSM2[k], XSM1[k], XSM2[k], XSM3[k], de) * gm;
        let sgtp = curve(BSP1[k], BSP2[k], XSP1[k], XSP2[k], XSP3[k], de) * gp;
        let sgtd = sgtp * BSD1[k];
        let zd = BZD1[k];
        let tgtd = (sgtp - sgtd) * zd;

        let sgl = if no_location {
            0.0
        } else {
            let q = (1.0 - 0.8 * (-geom.dist / 50e3).exp()) * geom.dh * env.wn;
            10.0 * q / (q + 13.0)
        };
        let vs0 = if no_situation {
            0.0
        } else {
            (5.0 + 3.0 * (-de / 100e3).exp()).powi(2)
        };

        Self {
            kdv,
            vmd,
            sgtm,
            sgtp,
            sgtd,
            tgtd,
            zd,
            sgl,
            vs0,
        }
    }

    /// Attenuation relative to free space at the given standard normal
    /// deviates for time (`zt`), location (`zl`) and confidence (`zc`).
    pub fn adjust(&self, aref: f64, zt: f64, zl: f64, zc: f64, warnings: &mut ItmWarnings) -> f64 {
        let (zt, zl) = match self.kdv {
            0 => (zc, zc),
            1 => (zt, zc),
            2 => (zt, zt),
            _ => (zt, zl),
        };
        if zt.abs() > 3.1 || zl.abs() > 3.1 || zc.abs() > 3.1 {
            warnings.raise(WarningLevel::Caution);
        }

        let sgt = if zt < 0.0 {
            self.sgtm
        } else if zt <= self.zd {
            self.sgtp
        } else {
            self.sgtd + self.tgtd / zt
        };
        let vs = self.vs0 + (sgt * zt).powi(2) / (RT + zc * zc) + (self.sgl * zl).powi(2) / (RL + zc * zc);

        let (yr, sgc) = match self.kdv {
            0 => (0.0, (sgt * sgt + self.sgl * self.sgl + vs).sqrt()),
            1 => (sgt * zt, (self.sgl * self.sgl + vs).sqrt()),
            2 => ((sgt * sgt + self.sgl * self.sgl).sqrt() * zt, vs.sqrt()),
            _ => (sgt * zt + self.sgl * zl, vs.sqrt()),
        };

        let avar = aref - self.vmd - yr - sgc * zc;
        if avar < 0.0 {
            avar * (29.0 - avar) / (29.0 - 10.0 * avar)
        } else {
            avar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Climate, ModeOfVariability};
    use approx::assert_abs_diff_eq;

    fn setup(mode: ModeOfVariability, climate: Climate) -> Variability {
        let params = PropagationParameters {
            mode_of_variability: mode,
            climate,
            ..PropagationParameters::default()
        };
        let env = Environment::new(&params).unwrap();
        let z = vec![50.0; 10];
        let geom = PathGeometry::prepare(&z, 5000.0 / 9.0, [10.0, 10.0], &env);
        Variability::new(&params, &geom, &env)
    }

    #[test]
    fn test_median_is_reference_minus_median_correction() {
        let var = setup(ModeOfVariability::default(), Climate::MaritimeTemperateOverLand);
        let mut warnings = ItmWarnings::default();
        let median = var.adjust(10.0, 0.0, 0.0, 0.0, &mut warnings);
        assert_abs_diff_eq!(median, 10.0 - var.vmd, epsilon = 1e-12);
        assert!(var.vmd.abs() < 0.5);
        assert!(!warnings.has_warnings());
    }

    #[test]
    fn test_higher_reliability_needs_more_loss() {
        let var = setup(ModeOfVariability::default(), Climate::ContinentalTemperate);
        let mut warnings = ItmWarnings::default();
        // Deviate for 90% time availability is negative.
        let at_90 = var.adjust(10.0, -1.2816, 0.0, 0.0, &mut warnings);
        let at_10 = var.adjust(10.0, 1.2816, 0.0, 0.0, &mut warnings);
        let median = var.adjust(10.0, 0.0, 0.0, 0.0, &mut warnings);
        assert!(at_90 > median);
        assert!(at_10 < median);
    }

    #[test]
    fn test_negative_values_are_compressed() {
        let var = setup(ModeOfVariability::default(), Climate::MaritimeTemperateOverLand);
        let mut warnings = ItmWarnings::default();
        let compressed = var.adjust(0.0, 3.0, 0.0, 0.0, &mut warnings);
        assert!(compressed < 0.0);
        let sgt = var.sgtd + var.tgtd / 3.0;
        let raw = -var.vmd - sgt * 3.0;
        assert!(raw < 0.0);
        assert!(compressed > raw);
    }

    #[test]
    fn test_extreme_deviates_raise_caution() {
        let var = setup(ModeOfVariability::SINGLE_MESSAGE, Climate::Desert);
        let mut warnings = ItmWarnings::default();
        var.adjust(10.0, 0.0, 0.0, 3.5, &mut warnings);
        assert_eq!(warnings.level(), WarningLevel::Caution);
    }

    #[test]
    fn test_situation_elimination_removes_spread() {
        let with_situation = setup(ModeOfVariability::BROADCAST, Climate::Equatorial);
        let without = setup(
            ModeOfVariability::BROADCAST.eliminate_situation(),
            Climate::Equatorial,
        );
        let mut warnings = ItmWarnings::default();
        let spread_with = with_situation.adjust(10.0, 0.0, 0.0, -1.2816, &mut warnings) - 10.0;
        let spread_without = without.adjust(10.0, 0.0, 0.0, -1.2816, &mut warnings) - 10.0;
        assert!(spread_with > spread_without);
    }
}
