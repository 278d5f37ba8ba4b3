//! Normalization of the radio parameters and preparation of the path
//! geometry from an elevation profile.

use num_complex::Complex64;

use crate::numeric::{dim, kth_largest};
use crate::{ItmError, ItmResult, Polarization, PropagationParameters};

/// Earth curvature before refraction (1/m).
const ACTUAL_EARTH_CURVATURE: f64 = 157e-9;

/// Parameters derived from frequency, refractivity and ground constants.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Environment {
    /// Wave number (1/m), frequency in MHz over 47.7.
    pub wn: f64,
    /// Surface refractivity at the path (N-Units).
    pub ens: f64,
    /// Effective earth curvature (1/m).
    pub gme: f64,
    /// Surface transfer impedance of the ground.
    pub zgnd: Complex64,
}

impl Environment {
    pub fn new(params: &PropagationParameters) -> ItmResult<Self> {
        let wn = params.frequency_mhz / 47.7;
        if !(wn > 0.0) {
            return Err(ItmError::domain("wave number must be positive"));
        }
        if params.permittivity < 1.0 {
            return Err(ItmError::domain(format!(
                "relative permittivity {} gives a ground impedance with negative real part",
                params.permittivity
            )));
        }

        // System elevation is taken as sea level, so refractivity is used as given.
        let ens = params.surface_refractivity;
        let gme = ACTUAL_EARTH_CURVATURE * (1.0 - 0.04665 * (ens / 179.3).exp());

        let zq = Complex64::new(params.permittivity, 376.62 * params.conductivity / wn);
        let mut zgnd = (zq - 1.0).sqrt();
        if params.polarization == Polarization::Vertical {
            zgnd /= zq;
        }

        Ok(Self { wn, ens, gme, zgnd })
    }
}

/// Terminal geometry extracted from the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PathGeometry {
    /// Path length (m).
    pub dist: f64,
    /// Spacing between profile samples (m).
    pub step: f64,
    /// Antenna heights above ground (m).
    pub hg: [f64; 2],
    /// Effective antenna heights (m).
    pub he: [f64; 2],
    /// Horizon distances (m).
    pub dl: [f64; 2],
    /// Horizon elevation angles (rad).
    pub the: [f64; 2],
    /// Terrain irregularity (m).
    pub dh: f64,
}

impl PathGeometry {
    /// Derive horizons, effective heights and terrain irregularity.
    ///
    /// `z` runs from the transmitter to the receiver with `step` meters between
    /// samples and must contain at least two samples.
    pub fn prepare(z: &[f64], step: f64, hg: [f64; 2], env: &Environment) -> Self {
        let np = z.len() - 1;
        let dist = np as f64 * step;
        let gme = env.gme;

        let (mut the, mut dl) = horizons(z, step, hg, gme);

        let xl0 = (15.0 * hg[0]).min(0.1 * dl[0]);
        let xl1 = dist - (15.0 * hg[1]).min(0.1 * dl[1]);
        let dh = terrain_irregularity(z, step, xl0, xl1);

        let horizon_distance = |he: f64| (2.0 * he / gme).sqrt() * (-0.07 * (dh / he.max(5.0)).sqrt()).exp();

        let mut he = [0.0; 2];
        if dl[0] + dl[1] > 1.5 * dist {
            // Line of sight: smooth-earth horizons from a single fit over the path.
            let (za, zb) = least_squares_fit(z, step, xl0, xl1);
            he[0] = hg[0] + dim(z[0], za);
            he[1] = hg[1] + dim(z[np], zb);
            for j in 0..2 {
                dl[j] = horizon_distance(he[j]);
            }
            let q = dl[0] + dl[1];
            if q <= dist {
                let scale = (dist / q).powi(2);
                for j in 0..2 {
                    he[j] *= scale;
                    dl[j] = horizon_distance(he[j]);
                }
            }
            for j in 0..2 {
                let q = (2.0 * he[j] / gme).sqrt();
                the[j] = (0.65 * dh * (q / dl[j] - 1.0) - 2.0 * he[j]) / q;
            }
        } else {
            // Transhorizon: fit the foreground of each terminal separately.
            let (za, _) = least_squares_fit(z, step, xl0, 0.9 * dl[0]);
            let (_, zb) = least_squares_fit(z, step, dist - 0.9 * dl[1], xl1);
            he[0] = hg[0] + dim(z[0], za);
            he[1] = hg[1] + dim(z[np], zb);
        }

        Self {
            dist,
            step,
            hg,
            he,
            dl,
            the,
            dh,
        }
    }
}

/// Horizon angles and distances for both terminals.
///
/// Starts from the chord between the antennas over a curved earth and walks
/// the profile raising each terminal's horizon ray over every obstruction.
pub(crate) fn horizons(z: &[f64], step: f64, hg: [f64; 2], gme: f64) -> ([f64; 2], [f64; 2]) {
    let np = z.len() - 1;
    let dist = np as f64 * step;
    let za = z[0] + hg[0];
    let zb = z[np] + hg[1];
    let qc = 0.5 * gme;
    let q = qc * dist;

    let slope = (zb - za) / dist;
    let mut the = [slope - q, -slope - q];
    let mut dl = [dist, dist];

    if np >= 2 {
        let mut sa = 0.0;
        let mut sb = dist;
        let mut no_tx_horizon = true;
        for &elevation in &z[1..np] {
            sa += step;
            sb -= step;
            let q = elevation - (qc * sa + the[0]) * sa - za;
            if q > 0.0 {
                the[0] += q / sa;
                dl[0] = sa;
                no_tx_horizon = false;
            }
            if !no_tx_horizon {
                let q = elevation - (qc * sb + the[1]) * sb - zb;
                if q > 0.0 {
                    the[1] += q / sb;
                    dl[1] = sb;
                }
            }
        }
    }

    (the, dl)
}

/// Least-squares line through the profile between `x1` and `x2` meters.
///
/// Returns the fitted elevations at the first and last sample of the whole
/// profile. The fit window is widened to at least one sample interval.
pub(crate) fn least_squares_fit(z: &[f64], step: f64, x1: f64, x2: f64) -> (f64, f64) {
    let xn = (z.len() - 1) as f64;
    let mut xa = dim(x1 / step, 0.0).trunc().min(xn);
    let mut xb = xn - dim(xn, (x2 / step).max(0.0)).trunc();
    if xb <= xa {
        xa = dim(xa, 1.0);
        xb = xn - dim(xn, xb + 1.0);
    }

    let mut ja = xa as usize;
    let jb = xb as usize;
    let n = jb - ja;
    let span = xb - xa;
    let mut x = -0.5 * span;
    let mid = xb + x;

    let mut a = 0.5 * (z[ja] + z[jb]);
    let mut b = 0.5 * (z[ja] - z[jb]) * x;
    for _ in 2..=n {
        ja += 1;
        x += 1.0;
        a += z[ja];
        b += z[ja] * x;
    }
    a /= span;
    b = b * 12.0 / ((span * span + 2.0) * span);

    (a - b * mid, a + b * (xn - mid))
}

/// Interdecile range of the profile's deviation from a straight line fit
/// between `x1` and `x2` meters, rounded to the nearest meter and scaled to
/// its asymptotic value for long paths.
pub(crate) fn terrain_irregularity(z: &[f64], step: f64, x1: f64, x2: f64) -> f64 {
    let np = z.len() - 1;
    let mut xa = x1 / step;
    let xb = x2 / step;
    if xb - xa < 2.0 {
        return 0.0;
    }

    let ka = ((0.1 * (xb - xa + 8.0)) as usize).clamp(4, 25);
    let n = 10 * ka - 5;
    let kb = n - ka + 1;
    let sn = (n - 1) as f64;
    let increment = (xb - xa) / sn;

    // Resample the window at n evenly spaced points.
    let mut k = ((xa + 1.0) as usize).clamp(1, np);
    xa -= k as f64;
    let mut samples = Vec::with_capacity(n);
    for _ in 0..n {
        while xa > 0.0 && k < np {
            xa -= 1.0;
            k += 1;
        }
        samples.push(z[k] + (z[k] - z[k - 1]) * xa);
        xa += increment;
    }

    let (start, end) = least_squares_fit(&samples, 1.0, 0.0, sn);
    let slope = (end - start) / sn;
    let mut level = start;
    for sample in samples.iter_mut() {
        *sample -= level;
        level += slope;
    }

    let (Some(upper), Some(lower)) = (
        kth_largest(&mut samples, ka - 1),
        kth_largest(&mut samples, kb - 1),
    ) else {
        return 0.0;
    };

    (upper - lower).round() / (1.0 - 0.8 * (-(x2 - x1) / 50e3).exp())
}
