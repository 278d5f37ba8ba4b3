//! Point-to-point evaluation of a single terrain path.

use crate::attenuation::ReferenceAttenuation;
use crate::numeric::qerfi;
use crate::prep::{Environment, PathGeometry};
use crate::variability::Variability;
use crate::{
    IntermediateValues, ItmError, ItmResult, ItmWarnings, PathClass, PropagationMode,
    PropagationParameters, PropagationResult, TerrainProfile,
};

/// Reliability levels reported by [`PathAnalysis::standard_quantiles`].
pub const STANDARD_RELIABILITIES: [f64; 5] = [1.0, 10.0, 50.0, 90.0, 99.0];

/// Confidence levels reported by [`PathAnalysis::standard_quantiles`].
pub const STANDARD_CONFIDENCES: [f64; 3] = [50.0, 90.0, 10.0];

/// Converts natural log to decibels.
const DB_PER_NEPER: f64 = 8.685890;

/// A terrain path prepared for loss queries.
///
/// Preparation (horizons, effective heights, terrain irregularity, reference
/// attenuation) happens once in [`PathAnalysis::new`]; each reliability and
/// confidence query afterwards only applies the variability statistics.
#[derive(Debug, Clone)]
pub struct PathAnalysis {
    env: Environment,
    geometry: PathGeometry,
    reference: ReferenceAttenuation,
    variability: Variability,
    free_space_db: f64,
    warnings: ItmWarnings,
}

impl PathAnalysis {
    /// Prepare `profile` for evaluation with `params`.
    ///
    /// Fails with a configuration error if `params` is outside its documented
    /// ranges, and with [`ItmError::InvalidDomain`] if the profile or the
    /// derived quantities cannot be evaluated.
    pub fn new(profile: &TerrainProfile, params: &PropagationParameters) -> ItmResult<Self> {
        params.validate()?;

        if profile.len() < 2 {
            return Err(ItmError::domain(format!(
                "profile has {} samples, at least 2 are required",
                profile.len()
            )));
        }
        if profile.len() > TerrainProfile::MAX_SAMPLES {
            return Err(ItmError::domain(format!(
                "profile has {} samples, at most {} are supported",
                profile.len(),
                TerrainProfile::MAX_SAMPLES
            )));
        }
        let distance = profile.distance_m();
        if !(distance.is_finite() && distance > 0.0) {
            return Err(ItmError::domain(format!(
                "path distance must be positive, got {distance} m"
            )));
        }
        if profile.elevations().iter().any(|z| !z.is_finite()) {
            return Err(ItmError::domain("profile contains non-finite elevations"));
        }

        let env = Environment::new(params)?;
        let geometry = PathGeometry::prepare(
            profile.elevations(),
            profile.resolution_m(),
            [params.tx_height_m, params.rx_height_m],
            &env,
        );

        let mut warnings = ItmWarnings::default();
        let reference = ReferenceAttenuation::compute(&geometry, &env, &mut warnings);
        if !reference.aref.is_finite() {
            return Err(ItmError::domain("reference attenuation is not finite"));
        }

        let variability = Variability::new(params, &geometry, &env);
        let free_space_db = DB_PER_NEPER * (2.0 * env.wn * geometry.dist).ln();

        Ok(Self {
            env,
            geometry,
            reference,
            variability,
            free_space_db,
            warnings,
        })
    }

    /// Basic transmission loss (dB) at the given reliability and confidence.
    pub fn loss_db(&self, reliability_pct: f64, confidence_pct: f64) -> ItmResult<f64> {
        self.result(reliability_pct, confidence_pct)
            .map(|result| result.loss_db)
    }

    /// Loss at the given reliability and confidence, with the warnings raised
    /// while computing it.
    pub fn result(&self, reliability_pct: f64, confidence_pct: f64) -> ItmResult<PropagationResult> {
        if !(reliability_pct > 0.0 && reliability_pct < 100.0) {
            return Err(ItmError::ReliabilityOutOfRange(reliability_pct));
        }
        if !(confidence_pct > 0.0 && confidence_pct < 100.0) {
            return Err(ItmError::ConfidenceOutOfRange(confidence_pct));
        }

        let zr = qerfi(reliability_pct / 100.0);
        let zc = qerfi(confidence_pct / 100.0);
        let mut warnings = self.warnings;
        let correction = self
            .variability
            .adjust(self.reference.aref, zr, 0.0, zc, &mut warnings);

        let loss_db = self.free_space_db + correction;
        if !loss_db.is_finite() {
            return Err(ItmError::domain("transmission loss is not finite"));
        }

        Ok(PropagationResult {
            reliability_pct,
            confidence_pct,
            loss_db,
            free_space_db: self.free_space_db,
            warnings,
        })
    }

    /// Loss for every (reliability, confidence) pair, reliability-major.
    pub fn quantiles(
        &self,
        reliabilities: &[f64],
        confidences: &[f64],
    ) -> ItmResult<Vec<PropagationResult>> {
        let mut results = Vec::with_capacity(reliabilities.len() * confidences.len());
        for &reliability in reliabilities {
            for &confidence in confidences {
                results.push(self.result(reliability, confidence)?);
            }
        }
        Ok(results)
    }

    /// The customary table of reliabilities 1/10/50/90/99 % against
    /// confidences 50/90/10 %.
    pub fn standard_quantiles(&self) -> ItmResult<Vec<PropagationResult>> {
        self.quantiles(&STANDARD_RELIABILITIES, &STANDARD_CONFIDENCES)
    }

    /// Free-space loss over the path (dB).
    pub fn free_space_db(&self) -> f64 {
        self.free_space_db
    }

    /// Median attenuation relative to free space before variability (dB).
    pub fn reference_attenuation_db(&self) -> f64 {
        self.reference.aref
    }

    /// Regime dominating at the path distance.
    pub fn mode(&self) -> PropagationMode {
        self.reference.mode(self.geometry.dist)
    }

    /// Horizon classification, with half a profile step of tolerance around
    /// the smooth-earth horizon distance.
    pub fn path_class(&self) -> PathClass {
        let half_step = 0.5 * self.geometry.step;
        let q = self.geometry.dist - self.reference.dlsa;
        let q = (q - half_step).max(0.0) - (-q - half_step).max(0.0);
        if q < 0.0 {
            PathClass::LineOfSight
        } else if q == 0.0 {
            PathClass::SingleHorizon
        } else {
            PathClass::DoubleHorizon
        }
    }

    /// Warnings raised while preparing the path.
    pub fn warnings(&self) -> ItmWarnings {
        self.warnings
    }

    /// Intermediate quantities of the preparation.
    pub fn intermediate(&self) -> IntermediateValues {
        IntermediateValues {
            theta_hzn: self.geometry.the,
            d_hzn_meter: self.geometry.dl,
            h_e_meter: self.geometry.he,
            n_s: self.env.ens,
            delta_h_meter: self.geometry.dh,
            a_ref_db: self.reference.aref,
            a_fs_db: self.free_space_db,
            d_km: self.geometry.dist / 1e3,
            mode: self.mode(),
        }
    }
}
