//! Reference attenuation: diffraction, line-of-sight and troposcatter
//! regimes relative to free space.

use num_complex::Complex64;

use crate::numeric::dim;
use crate::prep::{Environment, PathGeometry};
use crate::{ItmWarnings, PropagationMode, WarningLevel};

const THIRD: f64 = 1.0 / 3.0;

/// Sentinel returned by the scatter estimate when both terminals sit too low
/// for the scatter formulas to apply.
const NO_SCATTER: f64 = 1001.0;

/// Knife-edge diffraction loss for `v2`, the square of the Fresnel-Kirchhoff
/// parameter.
pub(crate) fn knife_edge(v2: f64) -> f64 {
    if v2 < 5.76 {
        6.02 + 9.11 * v2.sqrt() - 1.27 * v2
    } else {
        12.953 + 4.343 * v2.ln()
    }
}

/// Height-gain over a smooth spherical earth.
pub(crate) fn height_gain(x: f64, pk: f64) -> f64 {
    if x < 200.0 {
        let w = -pk.ln();
        if pk < 1e-5 || x * w.powi(3) > 5495.0 {
            if x > 1.0 {
                17.372 * x.ln() - 117.0
            } else {
                -117.0
            }
        } else {
            2.5e-5 * x * x / pk - 8.686 * w - 15.0
        }
    } else {
        let fhtv = 0.05751 * x - 4.343 * x.ln();
        if x < 2000.0 {
            let w = 0.0134 * x * (-0.005 * x).exp();
            (1.0 - w) * fhtv + w * (17.372 * x.ln() - 117.0)
        } else {
            fhtv
        }
    }
}

/// Frequency gain function of the scatter regime.
pub(crate) fn frequency_gain(r: f64, et: f64) -> f64 {
    const A: [f64; 5] = [25.0, 80.0, 177.0, 395.0, 705.0];
    const B: [f64; 5] = [24.0, 45.0, 68.0, 80.0, 105.0];

    let (it, q) = if et <= 1.0 {
        (1, 0.0)
    } else if et >= 5.0 {
        (5, 0.0)
    } else {
        let it = et.trunc();
        (it as usize, et - it)
    };
    let x = (1.0 / r).powi(2);
    let h0 = 4.343 * ((A[it - 1] * x + B[it - 1]) * x + 1.0).ln();
    if q != 0.0 {
        (1.0 - q) * h0 + q * 4.343 * ((A[it] * x + B[it]) * x + 1.0).ln()
    } else {
        h0
    }
}

/// Attenuation function of the scatter regime for the product of angular
/// and linear distance.
pub(crate) fn scatter_distance_loss(td: f64) -> f64 {
    const A: [f64; 3] = [133.4, 104.6, 71.8];
    const B: [f64; 3] = [0.332e-3, 0.212e-3, 0.157e-3];
    const C: [f64; 3] = [-4.343, -1.086, 2.171];

    let i = if td <= 10e3 {
        0
    } else if td <= 70e3 {
        1
    } else {
        2
    };
    A[i] + B[i] * td + C[i] * td.ln()
}

/// Diffraction loss combining double knife-edge and smooth-earth terms.
struct Diffraction {
    wn: f64,
    gme: f64,
    dl: [f64; 2],
    dh: f64,
    dla: f64,
    tha: f64,
    wd1: f64,
    xd1: f64,
    afo: f64,
    qk: f64,
    aht: f64,
    xht: f64,
}

impl Diffraction {
    fn new(geom: &PathGeometry, env: &Environment, dlsa: f64, dla: f64, tha: f64) -> Self {
        let [hg0, hg1] = geom.hg;
        let q = hg0 * hg1;
        let qk = geom.he[0] * geom.he[1] - q;
        // Point-to-point paths add the fixed 10 m^2 offset to the height product.
        let wd1 = (1.0 + qk / (q + 10.0)).sqrt();
        let xd1 = dla + tha / env.gme;

        let q = (1.0 - 0.8 * (-dlsa / 50e3).exp()) * geom.dh;
        let q = q * 0.78 * (-(q / 16.0).powf(0.25)).exp();
        let afo = 15f64.min(2.171 * (1.0 + 4.77e-4 * hg0 * hg1 * env.wn * q).ln());

        let qk = 1.0 / env.zgnd.norm();
        let mut aht = 20.0;
        let mut xht = 0.0;
        for j in 0..2 {
            let a = 0.5 * geom.dl[j].powi(2) / geom.he[j];
            let wa = (a * env.wn).powf(THIRD);
            let pk = qk / wa;
            let q = (1.607 - pk) * 151.0 * wa * geom.dl[j] / a;
            xht += q;
            aht += height_gain(q, pk);
        }

        Self {
            wn: env.wn,
            gme: env.gme,
            dl: geom.dl,
            dh: geom.dh,
            dla,
            tha,
            wd1,
            xd1,
            afo,
            qk,
            aht,
            xht,
        }
    }

    fn at(&self, d: f64) -> f64 {
        let th = self.tha + d * self.gme;
        let ds = d - self.dla;
        let q = 0.0795775 * self.wn * ds * th.powi(2);
        let knife = knife_edge(q * self.dl[0] / (ds + self.dl[0]))
            + knife_edge(q * self.dl[1] / (ds + self.dl[1]));

        let a = ds / th;
        let wa = (a * self.wn).powf(THIRD);
        let pk = self.qk / wa;
        let q = (1.607 - pk) * 151.0 * wa * th + self.xht;
        let rounded = 0.05751 * q - 4.343 * q.ln() - self.aht;

        let q = (self.wd1 + self.xd1 / d)
            * ((1.0 - 0.8 * (-d / 50e3).exp()) * self.dh * self.wn).min(6283.2);
        let wd = 25.1 / (25.1 + q.sqrt());
        rounded * wd + (1.0 - wd) * knife + self.afo
    }
}

/// Two-ray loss over a rough reflecting earth, blended with the extended
/// diffraction line.
struct LineOfSight {
    wn: f64,
    dh: f64,
    he: [f64; 2],
    zgnd: Complex64,
    emd: f64,
    aed: f64,
    wls: f64,
}

impl LineOfSight {
    fn new(geom: &PathGeometry, env: &Environment, dlsa: f64, emd: f64, aed: f64) -> Self {
        let wls = 0.021 / (0.021 + env.wn * geom.dh / dlsa.max(10e3));
        Self {
            wn: env.wn,
            dh: geom.dh,
            he: geom.he,
            zgnd: env.zgnd,
            emd,
            aed,
            wls,
        }
    }

    fn at(&self, d: f64) -> f64 {
        let q = (1.0 - 0.8 * (-d / 50e3).exp()) * self.dh;
        let s = 0.78 * q * (-(q / 16.0).powf(0.25)).exp();
        let q = self.he[0] + self.he[1];
        let sps = q / (d * d + q * q).sqrt();
        let mut r = (sps - self.zgnd) / (sps + self.zgnd) * (-(self.wn * s * sps).min(10.0)).exp();
        let q = r.norm_sqr();
        if q < 0.25 || q < sps {
            r *= (sps / q).sqrt();
        }

        let diffraction = self.emd * d + self.aed;
        let mut q = self.wn * self.he[0] * self.he[1] * 2.0 / d;
        if q > 1.57 {
            q = 3.14 - 2.4649 / q;
        }
        let two_ray = -4.343 * (Complex64::new(q.cos(), -q.sin()) + r).norm_sqr().ln();
        (two_ray - diffraction) * self.wls + diffraction
    }
}

/// Troposcatter loss. Carries the frequency gain of the previous evaluation
/// between calls.
struct Scatter {
    wn: f64,
    ens: f64,
    gme: f64,
    he: [f64; 2],
    the: [f64; 2],
    tha: f64,
    ad: f64,
    rr: f64,
    etq: f64,
    h0s: f64,
}

impl Scatter {
    fn new(geom: &PathGeometry, env: &Environment, tha: f64) -> Self {
        let mut ad = geom.dl[0] - geom.dl[1];
        let mut rr = geom.he[1] / geom.he[0];
        if ad < 0.0 {
            ad = -ad;
            rr = 1.0 / rr;
        }
        let etq = (5.67e-6 * env.ens - 2.32e-3) * env.ens + 0.031;
        Self {
            wn: env.wn,
            ens: env.ens,
            gme: env.gme,
            he: geom.he,
            the: geom.the,
            tha,
            ad,
            rr,
            etq,
            h0s: -15.0,
        }
    }

    fn at(&mut self, d: f64) -> f64 {
        let h0 = if self.h0s > 15.0 {
            self.h0s
        } else {
            let th = self.the[0] + self.the[1] + d * self.gme;
            let r2 = 2.0 * self.wn * th;
            let r1 = r2 * self.he[0];
            let r2 = r2 * self.he[1];
            if r1 < 0.2 && r2 < 0.2 {
                return NO_SCATTER;
            }

            let ss = (d - self.ad) / (d + self.ad);
            let q = (self.rr / ss).clamp(0.1, 10.0);
            let ss = ss.max(0.1);
            let z0 = (d - self.ad) * (d + self.ad) * th * 0.25 / d;
            let temp = (z0 / 8.0e3).min(1.7).powi(6);
            let et = (self.etq * (-temp).exp() + 1.0) * z0 / 1.7556e3;
            let ett = et.max(1.0);

            let mut h0 = (frequency_gain(r1, ett) + frequency_gain(r2, ett)) * 0.5;
            h0 += h0.min((1.38 - ett.ln()) * ss.ln() * q.ln() * 0.49);
            h0 = dim(h0, 0.0);
            if et < 1.0 {
                let temp = ((1.0 + 1.4142 / r1) * (1.0 + 1.4142 / r2)).powi(2);
                h0 = et * h0 + (1.0 - et) * 4.343 * (temp * (r1 + r2) / (r1 + r2 + 2.8284)).ln();
            }
            if h0 > 15.0 && self.h0s >= 0.0 {
                self.h0s
            } else {
                h0
            }
        };
        self.h0s = h0;

        let th = self.tha + d * self.gme;
        scatter_distance_loss(th * d) + 4.343 * (47.7 * self.wn * th.powi(4)).ln()
            - 0.1 * (self.ens - 301.0) * (-th * d / 40e3).exp()
            + h0
    }
}

/// Coefficients of the scatter line beyond the diffraction region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScatterLine {
    /// Distance where scatter overtakes diffraction (m).
    pub dx: f64,
    pub ems: f64,
    pub aes: f64,
}

/// Attenuation relative to free space at the path distance, with the
/// distance scales that split the propagation regimes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ReferenceAttenuation {
    /// Smooth-earth horizon distance sum (m).
    pub dlsa: f64,
    /// Present when the path reaches beyond the smooth-earth horizon.
    pub scatter: Option<ScatterLine>,
    /// Reference attenuation at the path distance (dB).
    pub aref: f64,
}

impl ReferenceAttenuation {
    pub fn compute(geom: &PathGeometry, env: &Environment, warnings: &mut ItmWarnings) -> Self {
        let gme = env.gme;
        let dls = [
            (2.0 * geom.he[0] / gme).sqrt(),
            (2.0 * geom.he[1] / gme).sqrt(),
        ];
        let dlsa = dls[0] + dls[1];
        let dla = geom.dl[0] + geom.dl[1];
        let tha = (geom.the[0] + geom.the[1]).max(-dla * gme);

        check_parameter_ranges(geom, env, &dls, warnings);

        let diffraction = Diffraction::new(geom, env, dlsa, dla, tha);
        let xae = (env.wn * gme.powi(2)).powf(-THIRD);
        let d3 = dlsa.max(1.3787 * xae + dla);
        let d4 = d3 + 2.7574 * xae;
        let a3 = diffraction.at(d3);
        let a4 = diffraction.at(d4);
        let emd = (a4 - a3) / (d4 - d3);
        let aed = a3 - emd * d3;

        let dist = geom.dist;
        let dmin = (geom.he[0] - geom.he[1]).abs() / 200e-3;
        if dist > 1000e3 {
            warnings.raise(WarningLevel::Caution);
        }
        if dist < dmin {
            warnings.raise(WarningLevel::Extrapolated);
        }
        if !(1e3..=2000e3).contains(&dist) {
            warnings.raise(WarningLevel::OutOfRange);
        }

        let (aref, scatter) = if dist < dlsa {
            let los = LineOfSight::new(geom, env, dlsa, emd, aed);
            let (ak1, ak2, ael) = fit_line_of_sight(&los, env.wn, geom.he, dlsa, dla, emd, aed);
            (ael + ak1 * dist + ak2 * dist.ln(), None)
        } else {
            let line = fit_scatter(geom, env, tha, xae, dlsa, dla, emd, aed);
            let aref = if dist > line.dx {
                line.aes + line.ems * dist
            } else {
                aed + emd * dist
            };
            (aref, Some(line))
        };

        Self {
            dlsa,
            scatter,
            aref: aref.max(0.0),
        }
    }

    /// Regime that dominates at distance `dist`.
    pub fn mode(&self, dist: f64) -> PropagationMode {
        match self.scatter {
            _ if dist < self.dlsa => PropagationMode::LineOfSight,
            Some(line) if dist > line.dx => PropagationMode::Troposcatter,
            _ => PropagationMode::Diffraction,
        }
    }
}

/// Fit `ael + ak1 * d + ak2 * ln(d)` through the two-ray loss inside the
/// smooth-earth horizon, meeting the diffraction line at its edge.
fn fit_line_of_sight(
    los: &LineOfSight,
    wn: f64,
    he: [f64; 2],
    dlsa: f64,
    dla: f64,
    emd: f64,
    aed: f64,
) -> (f64, f64, f64) {
    let d2 = dlsa;
    let a2 = aed + d2 * emd;
    let mut d0 = 1.908 * wn * he[0] * he[1];
    let d1 = if aed >= 0.0 {
        d0 = d0.min(0.5 * dla);
        d0 + 0.25 * (dla - d0)
    } else {
        (-aed / emd).max(0.25 * dla)
    };
    let a1 = los.at(d1);

    let mut ak1 = 0.0;
    let mut ak2 = 0.0;
    let mut fitted = false;
    if d0 < d1 {
        let a0 = los.at(d0);
        let q = (d2 / d0).ln();
        ak2 = 0f64.max(
            ((d2 - d0) * (a1 - a0) - (d1 - d0) * (a2 - a0))
                / ((d2 - d0) * (d1 / d0).ln() - (d1 - d0) * q),
        );
        fitted = aed >= 0.0 || ak2 > 0.0;
        if fitted {
            ak1 = (a2 - a0 - ak2 * q) / (d2 - d0);
            if ak1 < 0.0 {
                ak1 = 0.0;
                ak2 = dim(a2, a0) / q;
                if ak2 == 0.0 {
                    ak1 = emd;
                }
            }
        }
    }
    if !fitted {
        ak1 = dim(a2, a1) / (d2 - d1);
        ak2 = 0.0;
        if ak1 == 0.0 {
            ak1 = emd;
        }
    }

    let ael = a2 - ak1 * d2 - ak2 * d2.ln();
    (ak1, ak2, ael)
}

/// Locate where the scatter line overtakes the diffraction line.
#[allow(clippy::too_many_arguments)]
fn fit_scatter(
    geom: &PathGeometry,
    env: &Environment,
    tha: f64,
    xae: f64,
    dlsa: f64,
    dla: f64,
    emd: f64,
    aed: f64,
) -> ScatterLine {
    let mut scatter = Scatter::new(geom, env, tha);
    let d5 = dla + 200e3;
    let d6 = d5 + 200e3;
    // The far point is evaluated first; it seeds the frequency gain for the near one.
    let a6 = scatter.at(d6);
    let a5 = scatter.at(d5);

    if a5 < 1000.0 {
        let ems = (a6 - a5) / 200e3;
        let dx = dlsa
            .max(dla + 0.3 * xae * (47.7 * env.wn).ln())
            .max((a5 - aed - ems * d5) / (emd - ems));
        let aes = (emd - ems) * dx + aed;
        ScatterLine { dx, ems, aes }
    } else {
        ScatterLine {
            dx: 10e6,
            ems: emd,
            aes: aed,
        }
    }
}

fn check_parameter_ranges(
    geom: &PathGeometry,
    env: &Environment,
    dls: &[f64; 2],
    warnings: &mut ItmWarnings,
) {
    if env.wn < 0.838 || env.wn > 210.0 {
        warnings.raise(WarningLevel::Caution);
    }
    for j in 0..2 {
        if geom.hg[j] < 1.0 || geom.hg[j] > 1000.0 {
            warnings.raise(WarningLevel::Caution);
        }
        if geom.the[j].abs() > 200e-3 || geom.dl[j] < 0.1 * dls[j] || geom.dl[j] > 3.0 * dls[j] {
            warnings.raise(WarningLevel::Extrapolated);
        }
    }
    if env.ens < 250.0
        || env.ens > 400.0
        || env.gme < 75e-9
        || env.gme > 250e-9
        || env.zgnd.re <= env.zgnd.im.abs()
        || env.wn < 0.419
        || env.wn > 420.0
    {
        warnings.raise(WarningLevel::OutOfRange);
    }
    if geom.hg.iter().any(|&h| !(0.5..=3000.0).contains(&h)) {
        warnings.raise(WarningLevel::OutOfRange);
    }
}
