//! # terracov-itm
//!
//! Native implementation of the Irregular Terrain Model (ITM, Longley-Rice)
//! in point-to-point mode.
//!
//! Given an elevation profile between two terminals and the radio and
//! environmental parameters of the link, the model estimates the basic
//! transmission loss in dB. The loss is the free-space loss plus an
//! attenuation term chosen from three regimes:
//!
//! - **Line of sight**: two-ray interference over a rough reflecting earth
//! - **Diffraction**: knife-edge and smooth-earth diffraction near the horizon
//! - **Troposcatter**: forward scatter beyond the radio horizon
//!
//! followed by a statistical correction for the requested reliability
//! (time availability) and confidence.
//!
//! ## Example
//!
//! ```
//! use terracov_itm::{compute_median_attenuation, PropagationParameters, TerrainProfile};
//!
//! let profile = TerrainProfile::from_elevations(5_000.0, &[50.0; 10]);
//! let loss = compute_median_attenuation(&profile, &PropagationParameters::default())?;
//! assert!(loss > 100.0);
//! # Ok::<(), terracov_itm::ItmError>(())
//! ```
//!
//! The model is only defined for paths of at least 1 km; shorter paths are
//! evaluated but flagged with [`WarningLevel::OutOfRange`].

mod analysis;
mod attenuation;
pub mod decibels;
mod error;
pub mod free_space;
mod numeric;
mod prep;
mod types;
mod variability;

pub use analysis::{PathAnalysis, STANDARD_CONFIDENCES, STANDARD_RELIABILITIES};
pub use error::{ItmError, ItmResult};
pub use free_space::{free_space_distance_m, free_space_loss_db, free_space_received_dbm};
pub use numeric::{kth_largest, qerfi};
pub use types::*;

/// Basic transmission loss in dB over `profile` at the given reliability and
/// confidence percentages.
pub fn compute_attenuation(
    profile: &TerrainProfile,
    params: &PropagationParameters,
    reliability_pct: f64,
    confidence_pct: f64,
) -> ItmResult<f64> {
    PathAnalysis::new(profile, params)?.loss_db(reliability_pct, confidence_pct)
}

/// Median (50 % reliability, 50 % confidence) basic transmission loss in dB.
pub fn compute_median_attenuation(
    profile: &TerrainProfile,
    params: &PropagationParameters,
) -> ItmResult<f64> {
    compute_attenuation(profile, params, 50.0, 50.0)
}
