//! Model inputs, outputs and the constants that feed them.

use crate::{ItmError, ItmResult};

/// Radio climate, numbered as in the model's climate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(i32)]
pub enum Climate {
    Equatorial = 1,
    ContinentalSubtropical = 2,
    MaritimeSubtropical = 3,
    Desert = 4,
    ContinentalTemperate = 5,
    #[cfg_attr(feature = "serde", serde(alias = "maritime_temperate_overland"))]
    MaritimeTemperateOverLand = 6,
    #[cfg_attr(feature = "serde", serde(alias = "maritime_temperate_oversea"))]
    MaritimeTemperateOverSea = 7,
}

impl Climate {
    /// All climates in model order.
    pub const ALL: [Climate; 7] = [
        Climate::Equatorial,
        Climate::ContinentalSubtropical,
        Climate::MaritimeSubtropical,
        Climate::Desert,
        Climate::ContinentalTemperate,
        Climate::MaritimeTemperateOverLand,
        Climate::MaritimeTemperateOverSea,
    ];

    /// Zero-based index into the climate coefficient tables.
    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

/// Antenna polarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(i32)]
pub enum Polarization {
    /// Horizontal.
    Horizontal = 0,
    /// Vertical polarization
    Vertical = 1,
}

/// How time, location and situation variability combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ModeOfVariability(pub i32);

impl ModeOfVariability {
    /// Single Message Mode
    pub const SINGLE_MESSAGE: Self = Self(0);
    /// Accidental Mode
    pub const ACCIDENTAL: Self = Self(1);
    /// Mobile Mode
    pub const MOBILE: Self = Self(2);
    /// Broadcast Mode
    pub const BROADCAST: Self = Self(3);

    /// Adds 10: location variability folded out.
    pub fn eliminate_location(self) -> Self {
        Self(self.0 + 10)
    }

    /// Adds 20: situation variability folded out.
    pub fn eliminate_situation(self) -> Self {
        Self(self.0 + 20)
    }

    /// Split into (base mode, location eliminated, situation eliminated).
    pub(crate) fn decompose(self) -> (i32, bool, bool) {
        let mut base = self.0;
        let no_situation = base >= 20;
        if no_situation {
            base -= 20;
        }
        let no_location = base >= 10;
        if no_location {
            base -= 10;
        }
        (base, no_location, no_situation)
    }

    /// Check that the mode decomposes into a known base mode.
    pub fn validate(self) -> ItmResult<()> {
        let (base, _, _) = self.decompose();
        if self.0 < 0 || !(0..=3).contains(&base) {
            return Err(ItmError::InvalidMdvar(self.0));
        }
        Ok(())
    }
}

impl Default for ModeOfVariability {
    /// Accidental mode with location variability eliminated.
    fn default() -> Self {
        ModeOfVariability::ACCIDENTAL.eliminate_location()
    }
}

impl From<ModeOfVariability> for i32 {
    fn from(mode: ModeOfVariability) -> i32 {
        mode.0
    }
}

/// Regime whose attenuation term applies at the path length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropagationMode {
    /// Inside the smooth-earth horizon.
    #[default]
    LineOfSight,
    /// Beyond the smooth-earth horizon, before scatter takes over.
    Diffraction,
    /// Beyond the radio horizon, scatter dominated.
    Troposcatter,
}

/// Horizon classification of a terrain path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathClass {
    /// Neither terminal's horizon obstructs the path.
    LineOfSight,
    /// The path ends within half a profile step of the radio horizon.
    SingleHorizon,
    /// The path extends beyond both terminals' horizons.
    DoubleHorizon,
}

/// Severity of the range checks performed while evaluating the model.
///
/// Discriminants follow the model's numeric warning flag. Level 2 (defaults
/// substituted) is never raised: invalid parameters are errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningLevel {
    /// No warnings.
    #[default]
    None = 0,
    /// Some parameters are nearly out of range.
    Caution = 1,
    /// Some parameters are out of range; the result is an extrapolation.
    Extrapolated = 3,
    /// Parameters are outside the model's validity domain.
    OutOfRange = 4,
}

/// Worst warning raised while evaluating a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItmWarnings {
    level: WarningLevel,
}

impl ItmWarnings {
    /// Create warnings from a severity level
    pub fn from_level(level: WarningLevel) -> Self {
        Self { level }
    }

    /// Get the highest severity raised
    pub fn level(&self) -> WarningLevel {
        self.level
    }

    /// True for any level above none.
    pub fn has_warnings(&self) -> bool {
        self.level != WarningLevel::None
    }

    /// Check if the inputs were outside the model's validity range
    pub fn is_out_of_range(&self) -> bool {
        self.level == WarningLevel::OutOfRange
    }

    pub(crate) fn raise(&mut self, level: WarningLevel) {
        self.level = self.level.max(level);
    }
}

/// Radio and environmental parameters for one model evaluation.
///
/// With the `serde` feature, missing fields take their [`Default`] values and
/// unknown fields are rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct PropagationParameters {
    /// Carrier frequency in MHz.
    pub frequency_mhz: f64,
    /// Transmitter antenna height above ground (meters).
    pub tx_height_m: f64,
    /// Receiver antenna height above ground (meters).
    pub rx_height_m: f64,
    /// Antenna polarization.
    pub polarization: Polarization,
    /// Terrain relative permittivity.
    pub permittivity: f64,
    /// Terrain conductivity (S/m).
    pub conductivity: f64,
    /// Radio climate.
    pub climate: Climate,
    /// Surface refractivity (N-Units).
    pub surface_refractivity: f64,
    /// Mode of variability used for the statistics.
    pub mode_of_variability: ModeOfVariability,
}

impl Default for PropagationParameters {
    fn default() -> Self {
        Self {
            frequency_mhz: 800.0,
            tx_height_m: 10.0,
            rx_height_m: 10.0,
            polarization: Polarization::Horizontal,
            // Average ground.
            permittivity: 15.0,
            conductivity: 0.005,
            climate: Climate::MaritimeTemperateOverLand,
            surface_refractivity: 314.0,
            mode_of_variability: ModeOfVariability::default(),
        }
    }
}

impl PropagationParameters {
    /// Check every parameter against its documented range.
    ///
    /// Permittivity is not checked here; a ground with a relative permittivity
    /// below one fails the impedance computation as a domain error instead.
    pub fn validate(&self) -> ItmResult<()> {
        if !(self.frequency_mhz.is_finite() && self.frequency_mhz > 0.0) {
            return Err(ItmError::FrequencyOutOfRange(self.frequency_mhz));
        }
        if !(self.tx_height_m.is_finite() && self.tx_height_m >= 0.0) {
            return Err(ItmError::TxHeightOutOfRange(self.tx_height_m));
        }
        if !(self.rx_height_m.is_finite() && self.rx_height_m >= 0.0) {
            return Err(ItmError::RxHeightOutOfRange(self.rx_height_m));
        }
        if !(self.conductivity.is_finite() && self.conductivity > 0.0) {
            return Err(ItmError::InvalidSigma(self.conductivity));
        }
        if !(self.surface_refractivity.is_finite() && self.surface_refractivity > 0.0) {
            return Err(ItmError::RefractivityOutOfRange(self.surface_refractivity));
        }
        self.mode_of_variability.validate()
    }
}

/// Loss for one (reliability, confidence) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropagationResult {
    /// Time availability percentile.
    pub reliability_pct: f64,
    /// Location/situation confidence percentile.
    pub confidence_pct: f64,
    /// Loss (dB) at the requested quantile.
    pub loss_db: f64,
    /// Free-space loss over the path (dB).
    pub free_space_db: f64,
    /// Warning flags
    pub warnings: ItmWarnings,
}

/// Geometry and reference terms computed on the way to a loss.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntermediateValues {
    /// Horizon elevation angles `[tx, rx]` (rad).
    pub theta_hzn: [f64; 2],
    /// Horizon distances `[tx, rx]` (m).
    pub d_hzn_meter: [f64; 2],
    /// Effective antenna heights `[tx, rx]` (m).
    pub h_e_meter: [f64; 2],
    /// Surface refractivity after the elevation correction (N-units).
    pub n_s: f64,
    /// Interdecile terrain irregularity Δh (m).
    pub delta_h_meter: f64,
    /// Median attenuation relative to free space (dB).
    pub a_ref_db: f64,
    /// Free-space loss over the path (dB).
    pub a_fs_db: f64,
    /// Path distance in km
    pub d_km: f64,
    /// Mode of propagation
    pub mode: PropagationMode,
}

/// Elevation profile between the transmitter and the receiver.
///
/// Samples are equally spaced, the first at the transmitter end and the last
/// at the receiver end.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainProfile {
    elevations: Vec<f64>,
    distance_m: f64,
}

impl TerrainProfile {
    /// Largest number of samples the model accepts.
    pub const MAX_SAMPLES: usize = 600;

    /// Create a profile spanning `distance_m` meters.
    pub fn new(elevations: Vec<f64>, distance_m: f64) -> Self {
        Self {
            elevations,
            distance_m,
        }
    }

    /// Create from a slice of elevations spanning `distance_m` meters
    pub fn from_elevations(distance_m: f64, elevations: &[f64]) -> Self {
        Self::new(elevations.to_vec(), distance_m)
    }

    /// Create from a slice of elevations spaced `resolution_meter` apart
    pub fn from_resolution(resolution_meter: f64, elevations: &[f64]) -> Self {
        let distance_m = elevations.len().saturating_sub(1) as f64 * resolution_meter;
        Self::new(elevations.to_vec(), distance_m)
    }

    /// Elevation samples in meters.
    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.elevations.len()
    }

    /// True when the profile has no samples.
    pub fn is_empty(&self) -> bool {
        self.elevations.is_empty()
    }

    /// Path length (m).
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Get the total path distance in kilometers
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1e3
    }

    /// Spacing between consecutive samples in meters.
    pub fn resolution_m(&self) -> f64 {
        if self.elevations.len() < 2 {
            return 0.0;
        }
        self.distance_m / (self.elevations.len() - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_table_index() {
        assert_eq!(Climate::Equatorial as i32, 1);
        assert_eq!(Climate::MaritimeTemperateOverSea as i32, 7);
        for (i, climate) in Climate::ALL.iter().enumerate() {
            assert_eq!(climate.index(), i);
        }
    }

    #[test]
    fn test_mode_of_variability() {
        let mode = ModeOfVariability::default();
        assert_eq!(i32::from(mode), 11);
        assert_eq!(mode.decompose(), (1, true, false));

        let mode = ModeOfVariability::MOBILE.eliminate_location().eliminate_situation();
        assert_eq!(mode.decompose(), (2, true, true));

        assert!(ModeOfVariability(4).validate().is_err());
        assert!(ModeOfVariability(-1).validate().is_err());
        assert!(ModeOfVariability::BROADCAST.validate().is_ok());
    }

    #[test]
    fn test_warnings_only_increase() {
        let mut warnings = ItmWarnings::default();
        assert!(!warnings.has_warnings());
        warnings.raise(WarningLevel::Extrapolated);
        warnings.raise(WarningLevel::Caution);
        assert_eq!(warnings.level(), WarningLevel::Extrapolated);
        warnings.raise(WarningLevel::OutOfRange);
        assert!(warnings.is_out_of_range());
    }

    #[test]
    fn test_parameter_validation() {
        let params = PropagationParameters::default();
        assert!(params.validate().is_ok());

        let bad = PropagationParameters {
            tx_height_m: -1.0,
            ..params
        };
        assert_eq!(bad.validate(), Err(ItmError::TxHeightOutOfRange(-1.0)));

        let bad = PropagationParameters {
            frequency_mhz: 0.0,
            ..params
        };
        assert!(matches!(bad.validate(), Err(ItmError::FrequencyOutOfRange(_))));

        let bad = PropagationParameters {
            conductivity: 0.0,
            ..params
        };
        assert!(matches!(bad.validate(), Err(ItmError::InvalidSigma(_))));

        // Zero-height antennas are allowed.
        let ground = PropagationParameters {
            rx_height_m: 0.0,
            ..params
        };
        assert!(ground.validate().is_ok());
    }

    #[test]
    fn test_profile_distances() {
        let profile = TerrainProfile::from_resolution(25.0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(profile.len(), 5);
        assert_eq!(profile.distance_m(), 100.0);
        assert_eq!(profile.resolution_m(), 25.0);
        assert_eq!(profile.distance_km(), 0.1);

        let single = TerrainProfile::from_elevations(10.0, &[1.0]);
        assert_eq!(single.resolution_m(), 0.0);
    }
}
